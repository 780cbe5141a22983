//! LR(0) canonical collection construction (§4.2): closure, goto and the
//! breadth-first enumeration of states, grounded on the teacher's own
//! `closure`/`first_sets` pair in `table.rs`, generalized from LR(1)-style
//! per-item follow sets (which the teacher threads through every item) to
//! plain LR(0) items — lookaheads are computed separately, per LALR, by
//! `crate::relations`/`crate::operations`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use indexmap::IndexMap;

use crate::grammar::Grammar;
use crate::index::{RuleIndex, StateIndex, StateVec, SymbolIndex};

/// `(rule, dot)`: the dot marks how much of `rhs(rule)` has been recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub rule: RuleIndex,
    pub dot: usize,
}

impl Item {
    pub fn initial(rule: RuleIndex) -> Self {
        Self { rule, dot: 0 }
    }

    pub fn symbol_at_dot<V>(&self, grammar: &Grammar<V>) -> Option<SymbolIndex> {
        grammar.rules[self.rule].rhs.get(self.dot).copied()
    }

    pub fn is_complete<V>(&self, grammar: &Grammar<V>) -> bool {
        self.dot >= grammar.rules[self.rule].rhs.len()
    }

    pub fn advance(&self) -> Self {
        Self { rule: self.rule, dot: self.dot + 1 }
    }
}

pub type ItemSet = BTreeSet<Item>;

/// One numbered state of the canonical LR(0) collection: its full item-set
/// closure plus the goto/shift edges leaving it, keyed by symbol.
pub struct LrState {
    pub index: StateIndex,
    pub kernel: ItemSet,
    pub items: ItemSet,
    pub transitions: BTreeMap<SymbolIndex, StateIndex>,
}

pub struct Automaton {
    pub states: StateVec<LrState>,
    /// Reverse of `transitions`: for state `t`, the `(source, symbol)`
    /// pairs with `transitions[source][symbol] == t`. Built once and used
    /// by `crate::relations` to walk productions backward for `Lookback`.
    pub reverse: StateVec<Vec<(StateIndex, SymbolIndex)>>,
}

impl Automaton {
    pub fn start_state(&self) -> StateIndex {
        StateIndex(0)
    }
}

/// Extends `items` with every initial item implied by a nonterminal
/// immediately right of a dot, to a fixpoint (§4.2 `Closure`).
fn closure<V>(mut items: ItemSet, grammar: &Grammar<V>) -> ItemSet {
    let mut frontier: Vec<Item> = items.iter().copied().collect();
    while let Some(item) = frontier.pop() {
        if let Some(sym) = item.symbol_at_dot(grammar) {
            if grammar.symbols[sym].is_nonterminal() {
                for rule in grammar.rules_for(sym) {
                    let new_item = Item::initial(rule.index);
                    if items.insert(new_item) {
                        frontier.push(new_item);
                    }
                }
            }
        }
    }
    items
}

/// `goto(I, X)`: the kernel of the successor state reached by shifting `X`
/// out of the (already closed) item set `I` (§4.2 `Goto`).
fn goto<V>(items: &ItemSet, symbol: SymbolIndex, grammar: &Grammar<V>) -> ItemSet {
    items
        .iter()
        .filter(|it| it.symbol_at_dot(grammar) == Some(symbol))
        .map(Item::advance)
        .collect()
}

/// Builds the full canonical LR(0) collection for `grammar`, starting from
/// the single item of the synthetic augmenting rule.
///
/// States are numbered in the order they are first discovered; at each
/// state, successor symbols are tried in increasing `SymbolIndex` order
/// (`ItemSet`/`BTreeSet` already iterates in `Item`'s derived order, and the
/// per-state symbol set below is a `BTreeSet<SymbolIndex>`), which is what
/// makes the resulting numbering deterministic (§4.2).
pub fn build<V>(grammar: &Grammar<V>) -> Automaton {
    let start_kernel: ItemSet = [Item::initial(grammar.start_rule)].into_iter().collect();
    let mut kernel_to_state: IndexMap<ItemSet, StateIndex> = IndexMap::new();
    let mut states: StateVec<LrState> = StateVec::new();

    let start_items = closure(start_kernel.clone(), grammar);
    let start_idx = states.push(LrState {
        index: StateIndex(0),
        kernel: start_kernel.clone(),
        items: start_items,
        transitions: BTreeMap::new(),
    });
    kernel_to_state.insert(start_kernel, start_idx);

    let mut queue: VecDeque<StateIndex> = VecDeque::new();
    queue.push_back(start_idx);

    while let Some(state_idx) = queue.pop_front() {
        let items = states[state_idx].items.clone();
        let symbols: BTreeSet<SymbolIndex> =
            items.iter().filter_map(|it| it.symbol_at_dot(grammar)).collect();

        for symbol in symbols {
            let target_kernel = goto(&items, symbol, grammar);
            if target_kernel.is_empty() {
                continue;
            }
            let target_idx = if let Some(&existing) = kernel_to_state.get(&target_kernel) {
                existing
            } else {
                let target_items = closure(target_kernel.clone(), grammar);
                let new_idx = StateIndex(states.len());
                states.push(LrState {
                    index: new_idx,
                    kernel: target_kernel.clone(),
                    items: target_items,
                    transitions: BTreeMap::new(),
                });
                kernel_to_state.insert(target_kernel, new_idx);
                queue.push_back(new_idx);
                new_idx
            };
            states[state_idx].transitions.insert(symbol, target_idx);
        }
    }

    let mut reverse: StateVec<Vec<(StateIndex, SymbolIndex)>> = StateVec::new();
    for _ in 0..states.len() {
        reverse.push(Vec::new());
    }
    for state in states.iter() {
        for (&symbol, &target) in state.transitions.iter() {
            reverse[target].push((state.index, symbol));
        }
    }

    Automaton { states, reverse }
}

/// A plain-text rendering of the automaton, used by diagnostic tooling
/// (§6 "string rendering of the LR automaton").
pub fn render<V>(automaton: &Automaton, grammar: &Grammar<V>) -> String {
    let mut out = String::new();
    for state in automaton.states.iter() {
        out.push_str(&format!("State {}\n", state.index.index()));
        for item in &state.items {
            let rule = &grammar.rules[item.rule];
            let lhs = grammar.symbol_name(rule.lhs);
            let mut parts: Vec<String> =
                rule.rhs.iter().map(|s| grammar.symbol_name(*s).to_string()).collect();
            parts.insert(item.dot.min(parts.len()), ".".to_string());
            out.push_str(&format!("  {} -> {}\n", lhs, parts.join(" ")));
        }
        for (symbol, target) in &state.transitions {
            out.push_str(&format!(
                "  on {} goto {}\n",
                grammar.symbol_name(*symbol),
                target.index()
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GrammarBuilder;

    fn repeating_a() -> Grammar<i64> {
        let mut b: GrammarBuilder<i64> = GrammarBuilder::new();
        b.token("a").symbol("a");
        b.rule("A")
            .production(&["A", "a"])
            .action(|mut v| {
                let n: i64 = v.remove(0);
                n + 1
            })
            .production(&["a"])
            .action(|_| 1);
        b.set_start_symbol("A");
        b.finish().unwrap()
    }

    #[test]
    fn builds_deterministic_states() {
        let grammar = repeating_a();
        let automaton = build(&grammar);
        assert!(automaton.states.len() >= 3);
        assert_eq!(automaton.start_state(), StateIndex(0));
        // Every non-start state must be reachable via the reverse index.
        for idx in automaton.states.indices() {
            if idx != automaton.start_state() {
                assert!(!automaton.reverse[idx].is_empty());
            }
        }
    }
}
