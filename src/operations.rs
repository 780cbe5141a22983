//! Turns the relations from `crate::relations` into concrete per-item
//! lookahead sets (§4.3 `Follow`/`Lookahead`), via the DeRemer–Pennello
//! single-pass SCC digraph algorithm: each relation is traversed once,
//! nodes within a cycle share their union, and every node ends up with the
//! union of everything reachable from it — O(V+E) rather than iterating
//! naive set-union fixpoints to convergence.

use std::collections::HashMap;
use std::collections::HashSet;
use std::hash::Hash;

use crate::automaton::Automaton;
use crate::grammar::Grammar;
use crate::index::{RuleIndex, StateIndex, SymbolIndex};
use crate::relations::{self, NtTransitions};
use crate::trace::{trace, IndentGuard};

/// The DeRemer–Pennello "digraph" algorithm: given an adjacency list
/// `relation` over node ids `0..relation.len()` and a per-node `initial`
/// set, returns `result[x] = initial[x] ∪ ⋃{result[y] : relation[x] -> y}`,
/// with every node in a cycle sharing the same (unioned) result.
pub fn digraph<T: Eq + Hash + Clone>(
    relation: &[Vec<usize>],
    mut result: Vec<HashSet<T>>,
) -> Vec<HashSet<T>> {
    let n = relation.len();
    let mut mark = vec![0usize; n];
    let mut stack: Vec<usize> = Vec::new();

    fn traverse<T: Eq + Hash + Clone>(
        x: usize,
        relation: &[Vec<usize>],
        result: &mut [HashSet<T>],
        mark: &mut [usize],
        stack: &mut Vec<usize>,
    ) {
        let _guard = IndentGuard::enter();
        trace!("digraph: visit node {x}");
        stack.push(x);
        let depth = stack.len();
        mark[x] = depth;

        for &y in &relation[x] {
            if mark[y] == 0 {
                traverse(y, relation, result, mark, stack);
            }
            mark[x] = mark[x].min(mark[y]);
            let y_set = result[y].clone();
            result[x].extend(y_set);
        }

        if mark[x] == depth {
            loop {
                let top = *stack.last().unwrap();
                mark[top] = usize::MAX;
                let shared = result[x].clone();
                if top == x {
                    stack.pop();
                    break;
                }
                stack.pop();
                result[top] = shared;
            }
        }
    }

    for x in 0..n {
        if mark[x] == 0 {
            traverse(x, relation, &mut result, &mut mark, &mut stack);
        }
    }
    result
}

/// Per-`(state, nonterminal)` lookahead sets, indexed through
/// [`NtTransitions`].
pub struct LalrLookaheads {
    pub nt: NtTransitions,
    pub follow: Vec<HashSet<SymbolIndex>>,
}

impl LalrLookaheads {
    pub fn follow_of(&self, state: StateIndex, nonterm: SymbolIndex) -> HashSet<SymbolIndex> {
        match self.nt.id((state, nonterm)) {
            Some(id) => self.follow[id].clone(),
            None => HashSet::new(),
        }
    }

    /// `Lookahead(q, r)` (§4.3): the union of `Follow(p, lhs(r))` over every
    /// `p` the `Lookback` relation maps `(q, r)` to.
    pub fn lookahead<V>(
        &self,
        automaton: &Automaton,
        grammar: &Grammar<V>,
        q: StateIndex,
        rule: RuleIndex,
    ) -> HashSet<SymbolIndex> {
        let lhs = grammar.rules[rule].lhs;
        let mut set = HashSet::new();
        for p in relations::lookback_sources(automaton, grammar, q, rule) {
            set.extend(self.follow_of(p, lhs));
        }
        set
    }
}

/// Computes `Read` (Direct-reads closed under `Reads`) and `Follow` (`Read`
/// closed under `Includes`) for every nonterminal transition in `automaton`.
pub fn compute<V>(automaton: &Automaton, grammar: &Grammar<V>) -> LalrLookaheads {
    let nt = NtTransitions::build(automaton, grammar);

    let direct = relations::direct_reads(automaton, grammar, &nt);
    let reads = relations::reads_relation(automaton, grammar, &nt);
    let read = digraph(&reads, direct);

    let includes = relations::includes_relation(automaton, grammar, &nt);
    let follow = digraph(&includes, read);

    LalrLookaheads { nt, follow }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digraph_unions_within_cycles() {
        // 0 -> 1 -> 0 (a cycle), 2 -> 0
        let relation = vec![vec![1], vec![0], vec![0]];
        let mut initial = vec![HashSet::new(); 3];
        initial[0].insert("a");
        initial[1].insert("b");
        initial[2].insert("c");
        let result = digraph(&relation, initial);
        assert_eq!(result[0], HashSet::from(["a", "b"]));
        assert_eq!(result[1], HashSet::from(["a", "b"]));
        assert_eq!(result[2], HashSet::from(["a", "b", "c"]));
    }

    #[test]
    fn digraph_acyclic_propagates_forward() {
        let relation = vec![vec![1], vec![2], vec![]];
        let mut initial = vec![HashSet::new(); 3];
        initial[0].insert(1);
        initial[1].insert(2);
        initial[2].insert(3);
        let result = digraph(&relation, initial);
        assert_eq!(result[2], HashSet::from([3]));
        assert_eq!(result[1], HashSet::from([2, 3]));
        assert_eq!(result[0], HashSet::from([1, 2, 3]));
    }
}
