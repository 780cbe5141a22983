//! The three DeRemer–Pennello relations over nonterminal transitions and
//! reduce items (§4.3 `Reads`/`Includes`/`Lookback`). `crate::operations`
//! turns these into the actual per-item lookahead sets.

use std::collections::{HashMap, HashSet};

use crate::automaton::Automaton;
use crate::grammar::Grammar;
use crate::index::{RuleIndex, StateIndex, SymbolIndex};

/// A `(state, nonterminal)` pair identifying one nonterminal transition —
/// i.e. one edge `state --nonterminal--> goto(state, nonterminal)`.
pub type NtTransition = (StateIndex, SymbolIndex);

/// Numbers every nonterminal transition in the automaton so the relations
/// below can be represented as plain adjacency lists over small integers
/// (what `crate::operations::digraph` expects).
pub struct NtTransitions {
    pub order: Vec<NtTransition>,
    pub id_of: HashMap<NtTransition, usize>,
}

impl NtTransitions {
    pub fn build<V>(automaton: &Automaton, grammar: &Grammar<V>) -> Self {
        let mut order = Vec::new();
        let mut id_of = HashMap::new();
        for state in automaton.states.iter() {
            for (&symbol, _) in state.transitions.iter() {
                if grammar.symbols[symbol].is_nonterminal() {
                    let pair = (state.index, symbol);
                    id_of.insert(pair, order.len());
                    order.push(pair);
                }
            }
        }
        Self { order, id_of }
    }

    pub fn id(&self, pair: NtTransition) -> Option<usize> {
        self.id_of.get(&pair).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

/// `Direct-reads(p, A)`: terminals on which `goto(p, A)` itself shifts.
pub fn direct_reads<V>(
    automaton: &Automaton,
    grammar: &Grammar<V>,
    nt: &NtTransitions,
) -> Vec<HashSet<SymbolIndex>> {
    nt.order
        .iter()
        .map(|&(p, a)| {
            let target = automaton.states[p].transitions[&a];
            automaton.states[target]
                .transitions
                .keys()
                .filter(|&&s| grammar.symbols[s].is_terminal())
                .copied()
                .collect()
        })
        .collect()
}

/// `Reads` adjacency: `(p, A) Reads (r, C)` iff `r = goto(p, A)` and `r`
/// shifts on a nullable nonterminal `C`.
pub fn reads_relation<V>(
    automaton: &Automaton,
    grammar: &Grammar<V>,
    nt: &NtTransitions,
) -> Vec<Vec<usize>> {
    nt.order
        .iter()
        .map(|&(p, a)| {
            let r = automaton.states[p].transitions[&a];
            automaton.states[r]
                .transitions
                .iter()
                .filter(|(&c, _)| grammar.symbols[c].is_nonterminal() && grammar.empty(c))
                .filter_map(|(&c, _)| nt.id((r, c)))
                .collect()
        })
        .collect()
}

/// `Includes` adjacency: `(p, A) Includes (p', B)` iff some production
/// `B -> β A γ` has nullable `γ`, and `p'` reaches `p` along `β` via the
/// state `goto(p', B)`.
pub fn includes_relation<V>(
    automaton: &Automaton,
    grammar: &Grammar<V>,
    nt: &NtTransitions,
) -> Vec<Vec<usize>> {
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); nt.len()];

    for &(p_prime, b) in &nt.order {
        let p0 = automaton.states[p_prime].transitions[&b];
        for rule in grammar.rules_for(b) {
            for (i, &a) in rule.rhs.iter().enumerate() {
                if !grammar.symbols[a].is_nonterminal() {
                    continue;
                }
                let gamma = &rule.rhs[i + 1..];
                if !gamma.iter().all(|&s| grammar.empty(s)) {
                    continue;
                }
                if let Some(p) = walk(automaton, p0, &rule.rhs[..i]) {
                    if let (Some(x_id), Some(y_id)) = (nt.id((p, a)), nt.id((p_prime, b))) {
                        edges[x_id].push(y_id);
                    }
                }
            }
        }
    }
    edges
}

/// Follows `symbols` forward from `start` through the transition table,
/// returning `None` if any step has no edge (which would mean `symbols`
/// can't actually occur at that point in the automaton).
fn walk(automaton: &Automaton, start: StateIndex, symbols: &[SymbolIndex]) -> Option<StateIndex> {
    let mut cur = start;
    for &sym in symbols {
        cur = *automaton.states[cur].transitions.get(&sym)?;
    }
    Some(cur)
}

/// `(q, r) Lookback (p, A)`: every state `p` such that reading `rhs(r)`
/// forward from `p` lands on `q`, for a complete item `(r, |rhs(r)|)` in
/// `q`. `A` is always `lhs(r)`, so only the set of `p`s is returned.
///
/// The synthetic augmenting rule is excluded: its "reduce" is a hardcoded
/// `Accept` in `crate::table`, not a normal LALR reduction, so it has no
/// valid `(p, start')` nonterminal transition to look back to.
pub fn lookback_sources<V>(
    automaton: &Automaton,
    grammar: &Grammar<V>,
    q: StateIndex,
    rule: RuleIndex,
) -> HashSet<StateIndex> {
    if rule == grammar.start_rule {
        return HashSet::new();
    }
    let rhs = &grammar.rules[rule].rhs;
    let mut current: HashSet<StateIndex> = [q].into_iter().collect();
    for &sym in rhs.iter().rev() {
        let mut next = HashSet::new();
        for &c in &current {
            for &(s, x) in &automaton.reverse[c] {
                if x == sym {
                    next.insert(s);
                }
            }
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }
    current
}
