//! Lifecycle glue (§6 "Lifecycle") and the shift/reduce runtime (§4.6).
//!
//! `Parser` owns a `Grammar` and, once `prepare()` has run, the automaton,
//! LALR lookaheads and parsing table built from it; `Runtime` is the
//! per-input session that actually drives the dual state/value stacks,
//! mirroring the teacher's own split of a long-lived `Parser` from the
//! per-call step logic underneath its `parse` method.

use crate::automaton::{self, Automaton};
use crate::error::{Error, Result};
use crate::grammar::Grammar;
use crate::index::{StateIndex, SymbolIndex};
use crate::operations::{self, LalrLookaheads};
use crate::settings::Settings;
use crate::table::{self, Action, ParsingTable, Report};
use crate::token::Tokenizer;
use crate::trace::trace;

struct Prepared {
    automaton: Automaton,
    #[allow(dead_code)] // kept for `render_includes_graph` and future diagnostics
    lookaheads: LalrLookaheads,
    table: ParsingTable,
}

/// Owns a grammar plus whatever automaton/table preparation has run against
/// it (§5: immutable and shareable for reads once prepared).
pub struct Parser<V> {
    grammar: Grammar<V>,
    settings: Settings,
    prepared: Option<Prepared>,
}

impl<V> Parser<V> {
    pub fn new(grammar: Grammar<V>) -> Self {
        Self::with_settings(grammar, Settings::default())
    }

    pub fn with_settings(grammar: Grammar<V>, settings: Settings) -> Self {
        Self { grammar, settings, prepared: None }
    }

    pub fn grammar(&self) -> &Grammar<V> {
        &self.grammar
    }

    /// Builds the LR(0) automaton, LALR lookaheads and parsing table
    /// (§4.2–§4.4). Conflicts are collected, never fatal: the table is
    /// usable afterwards regardless of what the returned report says.
    pub fn prepare(&mut self) -> Report {
        trace!("preparing grammar ({} rules, {} symbols)", self.grammar.rules.len(), self.grammar.symbols.len());
        let automaton = automaton::build(&self.grammar);
        let lookaheads = operations::compute(&automaton, &self.grammar);
        let (table, report) = table::build(&self.grammar, &automaton, &lookaheads, &self.settings);
        self.prepared = Some(Prepared { automaton, lookaheads, table });
        report
    }

    fn prepared(&self) -> &Prepared {
        self.prepared.as_ref().expect("Parser::prepare must run before this call")
    }

    /// A plain-text dump of every automaton state and its items (§6).
    pub fn render_automaton(&self) -> String {
        automaton::render(&self.prepared().automaton, &self.grammar)
    }

    /// Graphviz `dot` rendering of the `Includes` relation (§6).
    pub fn render_includes_graph(&self) -> String {
        crate::diagnostics::includes_graph(&self.prepared().automaton, &self.grammar)
    }

    /// Parses `input` to completion and returns the synthesized start-symbol
    /// value (§4.6, §6 `parse`).
    pub fn parse(&self, input: impl AsRef<[u8]>) -> Result<V>
    where
        V: Default,
    {
        let mut runtime = self.session(input);
        runtime.run()
    }

    /// Starts a step-driven session over `input` (§5: "an implementation
    /// may offer a step variant without changing semantics").
    pub fn session(&self, input: impl AsRef<[u8]>) -> Runtime<'_, V>
    where
        V: Default,
    {
        let prepared = self.prepared();
        let mut runtime = Runtime::new(&self.grammar, &prepared.table, self.settings.trace);
        runtime.tokenizer.push_input(input.as_ref().to_vec());
        runtime
    }
}

/// One step of the runtime loop (§4.6).
pub enum Step<V> {
    /// A shift or reduce happened; parsing continues.
    Continue,
    /// The accepting state was reached; this is the final value.
    Accepted(V),
}

/// Drives the dual state/value stacks described in §4.6 over one input.
pub struct Runtime<'g, V> {
    grammar: &'g Grammar<V>,
    table: &'g ParsingTable,
    tokenizer: Tokenizer<'g, V>,
    states: Vec<StateIndex>,
    values: Vec<V>,
    trace: bool,
}

impl<'g, V> Runtime<'g, V>
where
    V: Default,
{
    fn new(grammar: &'g Grammar<V>, table: &'g ParsingTable, trace: bool) -> Self {
        Self {
            grammar,
            table,
            tokenizer: grammar.tokenizer(),
            states: vec![StateIndex(0)],
            values: vec![V::default()],
            trace,
        }
    }

    /// Runs `step` until `Accepted`, returning the final value.
    pub fn run(&mut self) -> Result<V> {
        loop {
            if let Step::Accepted(v) = self.step()? {
                return Ok(v);
            }
        }
    }

    /// Performs exactly one shift, reduce, or accept (§4.6, §5 step variant).
    pub fn step(&mut self) -> Result<Step<V>> {
        let top_state = *self.states.last().expect("seeded with one frame");
        let symbol = match self.tokenizer.peek() {
            Ok(m) => m.symbol,
            Err(Error::Tokenization { .. }) => return Err(self.expected_error(top_state)),
            Err(e) => return Err(e),
        };

        match self.table.action(top_state, symbol) {
            Some(Action::Shift(target)) => {
                let matched = self.tokenizer.consume().expect("peek just confirmed a token");
                if self.trace {
                    trace!(
                        "state {}: shift {} -> {}",
                        top_state.index(),
                        self.grammar.symbol_name(symbol),
                        target.index()
                    );
                }
                self.states.push(target);
                self.values.push(matched.value);
                Ok(Step::Continue)
            }
            Some(Action::Reduce(rule_idx)) => {
                let rule = &self.grammar.rules[rule_idx];
                let n = rule.rhs.len();
                let split_at = self.values.len() - n;
                let args = self.values.split_off(split_at);
                self.states.truncate(self.states.len() - n);

                let value = (rule.action)(args);
                let new_top = *self.states.last().expect("start state is never popped");
                let goto_state = self
                    .table
                    .goto(new_top, rule.lhs)
                    .expect("a reduced nonterminal always has a goto from its origin state");
                if self.trace {
                    trace!(
                        "state {}: reduce by '{}' -> {}",
                        new_top.index(),
                        rule.to_display_string(self.grammar),
                        goto_state.index()
                    );
                }
                self.states.push(goto_state);
                self.values.push(value);
                Ok(Step::Continue)
            }
            Some(Action::Accept) => {
                if self.trace {
                    trace!("state {}: accept", top_state.index());
                }
                Ok(Step::Accepted(self.values.pop().expect("the start symbol's value")))
            }
            None => Err(self.syntax_error(top_state, symbol)),
        }
    }

    fn syntax_error(&self, state: StateIndex, unexpected: SymbolIndex) -> Error {
        let expected = self.expected_names(state);
        if expected.is_empty() {
            Error::UnknownSymbol { expected }
        } else {
            Error::Syntax { unexpected: self.grammar.symbol_name(unexpected).to_string(), expected }
        }
    }

    /// Input that failed to tokenize at all has no symbol to name as
    /// "unexpected", so it always surfaces as `UnknownSymbol` (§4.7, §6).
    fn expected_error(&self, state: StateIndex) -> Error {
        Error::UnknownSymbol { expected: self.expected_names(state) }
    }

    fn expected_names(&self, state: StateIndex) -> Vec<String> {
        self.table
            .expected_terminals(state)
            .into_iter()
            .map(|s| self.grammar.symbol_name(s).to_string())
            .collect()
    }
}
