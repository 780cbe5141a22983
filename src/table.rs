//! Parsing table synthesis and precedence-based conflict resolution
//! (§4.4), grounded on the teacher's own `calculate_lr_tables` — which
//! walks the same states-and-items shape, but here the table is built from
//! LALR lookaheads (`crate::operations::LalrLookaheads`) rather than
//! per-item LR(1) follow sets, and conflicts are collected into a
//! [`Report`] instead of aborting construction.

use std::collections::HashMap;

use crate::automaton::Automaton;
use crate::grammar::{Assoc, Grammar, Precedence, Rule};
use crate::index::{RuleIndex, StateIndex, SymbolIndex};
use crate::operations::LalrLookaheads;
use crate::settings::Settings;
use crate::trace::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(StateIndex),
    Reduce(RuleIndex),
    Accept,
}

/// One unresolved (or precedence-resolved-but-reportable) conflict found
/// while building the table (§4.4, §6).
#[derive(Debug, Clone)]
pub enum Conflict {
    ShiftReduce { state: StateIndex, terminal: SymbolIndex, rule: RuleIndex },
    ReduceReduce { state: StateIndex, rule1: RuleIndex, rule2: RuleIndex },
}

impl Conflict {
    /// Renders the exact diagnostic line shape required by §6.
    pub fn describe<V>(&self, grammar: &Grammar<V>) -> String {
        match self {
            Conflict::ShiftReduce { state, terminal, rule } => format!(
                "Shift-reduce conflict of symbol '{}' and rule '{}' in state {}",
                grammar.symbol_name(*terminal),
                grammar.rules[*rule].to_display_string(grammar),
                state.index()
            ),
            Conflict::ReduceReduce { state, rule1, rule2 } => format!(
                "Reduce-reduce conflict of rule '{}' and rule '{}' in state {}",
                grammar.rules[*rule1].to_display_string(grammar),
                grammar.rules[*rule2].to_display_string(grammar),
                state.index()
            ),
        }
    }
}

/// Collects every conflict found during table construction without
/// aborting it (§4.4, §7): preparation always finishes and hands back a
/// usable (if ambiguous) table alongside this report.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub conflicts: Vec<Conflict>,
}

impl Report {
    /// "Truthy" iff there were no conflicts (§6).
    pub fn is_ok(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn number_of_issues(&self) -> usize {
        self.conflicts.len()
    }

    pub fn render<V>(&self, grammar: &Grammar<V>) -> String {
        self.conflicts
            .iter()
            .map(|c| c.describe(grammar))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The synthesized shift/reduce/accept/goto table (§4.4).
#[derive(Debug, Default)]
pub struct ParsingTable {
    action: HashMap<(StateIndex, SymbolIndex), Action>,
    goto: HashMap<(StateIndex, SymbolIndex), StateIndex>,
}

impl ParsingTable {
    pub fn action(&self, state: StateIndex, terminal: SymbolIndex) -> Option<Action> {
        self.action.get(&(state, terminal)).copied()
    }

    pub fn goto(&self, state: StateIndex, nonterm: SymbolIndex) -> Option<StateIndex> {
        self.goto.get(&(state, nonterm)).copied()
    }

    /// Terminals for which `state` has a defined action, sorted by index
    /// for deterministic error messages (§7).
    pub fn expected_terminals(&self, state: StateIndex) -> Vec<SymbolIndex> {
        let mut out: Vec<SymbolIndex> =
            self.action.keys().filter(|&&(s, _)| s == state).map(|&(_, t)| t).collect();
        out.sort();
        out
    }
}

fn effective_precedence<V>(grammar: &Grammar<V>, rule: &Rule<V>) -> Option<Precedence> {
    if let Some(p) = rule.precedence_override {
        return Some(p);
    }
    rule.rhs
        .iter()
        .rev()
        .find(|&&s| grammar.symbols[s].is_terminal())
        .and_then(|&s| grammar.symbols[s].precedence)
}

enum Resolution {
    Shift,
    Reduce,
    Conflict,
}

fn resolve_shift_reduce(terminal_prec: Option<Precedence>, rule_prec: Option<Precedence>) -> Resolution {
    match (terminal_prec, rule_prec) {
        (Some(t), Some(r)) => {
            if t.level > r.level {
                Resolution::Shift
            } else if t.level < r.level {
                Resolution::Reduce
            } else {
                match t.assoc {
                    Assoc::Left => Resolution::Reduce,
                    Assoc::Right => Resolution::Shift,
                    Assoc::Nonassoc => Resolution::Conflict,
                }
            }
        }
        _ => Resolution::Conflict,
    }
}

/// Builds the parsing table for `grammar`/`automaton` using the already
/// computed LALR `lookaheads` (§4.4).
pub fn build<V>(
    grammar: &Grammar<V>,
    automaton: &Automaton,
    lookaheads: &LalrLookaheads,
    settings: &Settings,
) -> (ParsingTable, Report) {
    let mut table = ParsingTable::default();
    let mut report = Report::default();

    for state in automaton.states.iter() {
        let q = state.index;

        // Shifts and gotos first, per §4.4's own ordering of the two
        // bullet points — this also means shift/reduce conflicts are
        // always detected while inserting the *reduce* half below.
        for (&symbol, &target) in state.transitions.iter() {
            if grammar.symbols[symbol].is_terminal() {
                if settings.trace {
                    trace!(
                        "state {}: shift {} -> {}",
                        q.index(),
                        grammar.symbol_name(symbol),
                        target.index()
                    );
                }
                table.action.insert((q, symbol), Action::Shift(target));
            } else {
                table.goto.insert((q, symbol), target);
            }
        }

        let mut complete: Vec<RuleIndex> = state
            .items
            .iter()
            .filter(|it| it.is_complete(grammar))
            .map(|it| it.rule)
            .collect();
        complete.sort_by_key(|r| r.index());

        for rule in complete {
            if rule == grammar.start_rule {
                table.action.insert((q, grammar.end_symbol), Action::Accept);
                continue;
            }

            let mut lookahead: Vec<SymbolIndex> =
                lookaheads.lookahead(automaton, grammar, q, rule).into_iter().collect();
            lookahead.sort();

            for t in lookahead {
                insert_reduce(grammar, &mut table, &mut report, q, t, rule);
            }
        }
    }

    (table, report)
}

fn insert_reduce<V>(
    grammar: &Grammar<V>,
    table: &mut ParsingTable,
    report: &mut Report,
    state: StateIndex,
    terminal: SymbolIndex,
    rule: RuleIndex,
) {
    match table.action.get(&(state, terminal)).copied() {
        None => {
            table.action.insert((state, terminal), Action::Reduce(rule));
        }
        Some(Action::Accept) => {
            // The accepting reduction always wins; nothing else can ever
            // legitimately fire on End in the accepting state.
        }
        Some(Action::Shift(shift_target)) => {
            let terminal_prec = grammar.symbols[terminal].precedence;
            let rule_prec = effective_precedence(grammar, &grammar.rules[rule]);
            match resolve_shift_reduce(terminal_prec, rule_prec) {
                Resolution::Shift => { /* keep the existing shift */ }
                Resolution::Reduce => {
                    table.action.insert((state, terminal), Action::Reduce(rule));
                }
                Resolution::Conflict => {
                    report.conflicts.push(Conflict::ShiftReduce { state, terminal, rule });
                    if terminal_prec.is_none() || rule_prec.is_none() {
                        // Unresolved (missing precedence on either side):
                        // keep the shift, the conventional default (§4.4).
                        table.action.insert((state, terminal), Action::Shift(shift_target));
                    } else {
                        // Equal precedence, nonassoc: leave no entry.
                        table.action.remove(&(state, terminal));
                    }
                }
            }
        }
        Some(Action::Reduce(existing_rule)) => {
            if existing_rule != rule {
                report.conflicts.push(Conflict::ReduceReduce {
                    state,
                    rule1: existing_rule,
                    rule2: rule,
                });
                let winner = existing_rule.min(rule);
                table.action.insert((state, terminal), Action::Reduce(winner));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GrammarBuilder;
    use crate::{automaton, operations};

    #[test]
    fn conflict_scenario_reports_three_issues() {
        // sequence -> sequence a | maybea | <eps>; maybea -> a | <eps>
        let mut b: GrammarBuilder<()> = GrammarBuilder::new();
        b.token("a").symbol("a");
        b.rule("sequence")
            .production(&["sequence", "a"])
            .action(|_| ())
            .production(&["maybea"])
            .action(|_| ())
            .production(&[])
            .action(|_| ());
        b.rule("maybea")
            .production(&["a"])
            .action(|_| ())
            .production(&[])
            .action(|_| ());
        b.set_start_symbol("sequence");
        let grammar = b.finish().unwrap();

        let automaton = automaton::build(&grammar);
        let lookaheads = operations::compute(&automaton, &grammar);
        let (_table, report) = build(&grammar, &automaton, &lookaheads, &Settings::default());

        assert_eq!(report.number_of_issues(), 3);
        assert!(!report.is_ok());
    }

    #[test]
    fn unambiguous_grammar_has_no_conflicts() {
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
        let grammar = b.finish().unwrap();

        let automaton = automaton::build(&grammar);
        let lookaheads = operations::compute(&automaton, &grammar);
        let (_table, report) = build(&grammar, &automaton, &lookaheads, &Settings::default());
        assert!(report.is_ok());
    }
}
