//! Graph export for the `Includes` relation (§6 "diagnostic exports"),
//! built with `petgraph` the way the teacher reaches for it when a relation
//! needs to be handed to a human rather than an algorithm.

use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;

use crate::automaton::Automaton;
use crate::grammar::Grammar;
use crate::relations::{self, NtTransitions};

/// Renders the `Includes` relation over nonterminal transitions as Graphviz
/// `dot` source: one node per `(state, nonterminal)` transition, one edge
/// per `Includes` pair.
pub fn includes_graph<V>(automaton: &Automaton, grammar: &Grammar<V>) -> String {
    let nt = NtTransitions::build(automaton, grammar);
    let edges = relations::includes_relation(automaton, grammar, &nt);

    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let nodes: Vec<_> = nt
        .order
        .iter()
        .map(|&(state, sym)| {
            graph.add_node(format!("{}:{}", state.index(), grammar.symbol_name(sym)))
        })
        .collect();

    for (from, targets) in edges.iter().enumerate() {
        for &to in targets {
            graph.add_edge(nodes[from], nodes[to], ());
        }
    }

    format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}
