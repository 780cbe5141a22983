//! Fluent registration API (§4 Builders, §6 External interfaces).
//!
//! Mirrors the teacher's split between an AST-shaped front end and the
//! index-based `Grammar` it eventually resolves into: every `.token(...)`
//! and `.rule(...)` call here only appends to a spec list, and symbol
//! creation is deferred to [`GrammarBuilder::finish`], which is also where
//! the open question from §9 is resolved (an RHS name that was never a
//! rule LHS becomes an implicit terminal with a literal-match token).

use std::collections::HashSet;

use indexmap::IndexSet;

use crate::error::{Error, Result};
use crate::grammar::{Assoc, Grammar, Precedence, Rule, Symbol, SymbolKind};
use crate::index::{RuleVec, SymbolVec, TokenVec};
use crate::token::{Token, DEFAULT_STATE};

struct TokenSpec<V> {
    pattern: String,
    symbol_name: Option<String>,
    precedence: Option<Precedence>,
    action: Option<Box<dyn Fn(&[u8]) -> V>>,
    states: HashSet<String>,
    enter_state: Option<String>,
    fullword: bool,
}

impl<V> TokenSpec<V> {
    fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            symbol_name: None,
            precedence: None,
            action: None,
            states: HashSet::from([DEFAULT_STATE.to_string()]),
            enter_state: None,
            fullword: false,
        }
    }
}

struct RuleSpec<V> {
    lhs_name: String,
    rhs_names: Vec<String>,
    action: Box<dyn Fn(Vec<V>) -> V>,
    precedence_override: Option<Precedence>,
}

/// Accumulates token and rule registrations until [`GrammarBuilder::finish`]
/// resolves them into a dense-indexed [`Grammar`].
pub struct GrammarBuilder<V> {
    token_specs: Vec<TokenSpec<V>>,
    end_action: Option<Box<dyn Fn(&[u8]) -> V>>,
    rule_specs: Vec<RuleSpec<V>>,
    declared_nonterminals: IndexSet<String>,
    start_symbol_name: Option<String>,
}

impl<V> Default for GrammarBuilder<V> {
    fn default() -> Self {
        Self {
            token_specs: Vec::new(),
            end_action: None,
            rule_specs: Vec::new(),
            declared_nonterminals: IndexSet::new(),
            start_symbol_name: None,
        }
    }
}

impl<V> GrammarBuilder<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&mut self, pattern: &str) -> TokenBuilder<'_, V> {
        self.token_specs.push(TokenSpec::new(pattern));
        let index = self.token_specs.len() - 1;
        TokenBuilder { builder: self, index }
    }

    pub fn end_token(&mut self) -> EndTokenBuilder<'_, V> {
        EndTokenBuilder { builder: self }
    }

    pub fn rule(&mut self, lhs: &str) -> RuleBuilder<'_, V> {
        self.declared_nonterminals.insert(lhs.to_string());
        RuleBuilder { builder: self, lhs: lhs.to_string(), pending_rhs: None, pending_precedence: None }
    }

    pub fn set_start_symbol(&mut self, name: &str) {
        self.start_symbol_name = Some(name.to_string());
    }

    pub fn finish(self) -> Result<Grammar<V>> {
        let Self { token_specs, end_action, rule_specs, declared_nonterminals, start_symbol_name } = self;

        let mut symbols: SymbolVec<Symbol> = SymbolVec::new();
        let mut name_to_symbol = std::collections::HashMap::new();

        let synthetic_start = symbols.push(Symbol {
            index: crate::index::SymbolIndex(0),
            name: "S'".to_string(),
            kind: SymbolKind::Start,
            precedence: None,
        });
        let end_symbol = symbols.push(Symbol {
            index: crate::index::SymbolIndex(1),
            name: "@end".to_string(),
            kind: SymbolKind::End,
            precedence: None,
        });
        name_to_symbol.insert("@end".to_string(), end_symbol);

        // Explicit terminals, from token().symbol(name) calls, in
        // registration order.
        for spec in &token_specs {
            if let Some(name) = &spec.symbol_name {
                if !name_to_symbol.contains_key(name) {
                    let idx = symbols.push(Symbol {
                        index: crate::index::SymbolIndex(0),
                        name: name.clone(),
                        kind: SymbolKind::Terminal,
                        precedence: spec.precedence,
                    });
                    fix_index(&mut symbols, idx);
                    name_to_symbol.insert(name.clone(), idx);
                }
            }
        }

        // Declared nonterminals, in first-declaration order.
        for name in &declared_nonterminals {
            if name_to_symbol.contains_key(name) {
                return Err(Error::UnknownSymbolName(format!(
                    "'{name}' is declared both as a rule and as a token symbol"
                )));
            }
            let idx = symbols.push(Symbol {
                index: crate::index::SymbolIndex(0),
                name: name.clone(),
                kind: SymbolKind::Nonterminal,
                precedence: None,
            });
            fix_index(&mut symbols, idx);
            name_to_symbol.insert(name.clone(), idx);
        }

        // Implicit terminals (§9 open question): any RHS name that is
        // neither a declared nonterminal nor an explicitly registered
        // token symbol is a terminal matched literally.
        let mut implicit_tokens: Vec<TokenSpec<V>> = Vec::new();
        for rule in &rule_specs {
            for name in &rule.rhs_names {
                if name_to_symbol.contains_key(name) {
                    continue;
                }
                let idx = symbols.push(Symbol {
                    index: crate::index::SymbolIndex(0),
                    name: name.clone(),
                    kind: SymbolKind::Terminal,
                    precedence: None,
                });
                fix_index(&mut symbols, idx);
                name_to_symbol.insert(name.clone(), idx);
                let mut spec = TokenSpec::new(&regex::escape(name));
                spec.symbol_name = Some(name.clone());
                implicit_tokens.push(spec);
            }
        }

        let start_symbol_name = start_symbol_name.ok_or_else(|| {
            Error::UnknownStartSymbol("(no start symbol was set: call set_start_symbol)".to_string())
        })?;
        let start_symbol = *name_to_symbol
            .get(&start_symbol_name)
            .ok_or_else(|| Error::UnknownStartSymbol(start_symbol_name.clone()))?;

        // The augmenting rule `start' -> S` (§3). End is never physically
        // shifted: it exists only as the lookahead that triggers Accept on
        // the state reached after `S` is reduced (§4.4, §4.6).
        let mut rules: RuleVec<Rule<V>> = RuleVec::new();
        let start_rule = rules.push(Rule {
            index: crate::index::RuleIndex(0),
            lhs: synthetic_start,
            rhs: vec![start_symbol],
            action: Box::new(|mut v: Vec<V>| v.remove(0)),
            precedence_override: None,
        });
        fix_rule_index(&mut rules, start_rule);

        for spec in rule_specs {
            let lhs = *name_to_symbol.get(&spec.lhs_name).expect("declared above");
            let mut rhs = Vec::with_capacity(spec.rhs_names.len());
            for name in &spec.rhs_names {
                rhs.push(*name_to_symbol.get(name).expect("resolved above"));
            }
            let idx = rules.push(Rule {
                index: crate::index::RuleIndex(0),
                lhs,
                rhs,
                action: spec.action,
                precedence_override: spec.precedence_override,
            });
            fix_rule_index(&mut rules, idx);
        }

        let mut tokens: TokenVec<Token<V>> = TokenVec::new();
        let mut patterns: Vec<String> = Vec::new();
        for spec in token_specs.into_iter().chain(implicit_tokens) {
            let symbol = spec.symbol_name.as_ref().map(|n| name_to_symbol[n]);
            let token = Token::new(
                crate::index::TokenIndex(0),
                &spec.pattern,
                spec.fullword,
                symbol,
                spec.action,
                spec.states,
                spec.enter_state,
            )?;
            patterns.push(token.anchored_pattern.clone());
            let idx = tokens.push(token);
            fix_token_index(&mut tokens, idx);
            if let Some(p) = spec.precedence {
                if let Some(sym) = symbol {
                    symbols[sym].precedence = Some(p);
                }
            }
        }
        let token_set = regex::bytes::RegexSet::new(&patterns)
            .map_err(|e| Error::UnknownSymbolName(format!("invalid token pattern set: {e}")))?;

        let grammar = Grammar::new(
            symbols,
            rules,
            name_to_symbol,
            start_symbol,
            synthetic_start,
            end_symbol,
            start_rule,
            tokens,
            token_set,
            end_action,
        );
        Ok(grammar)
    }
}

fn fix_index(symbols: &mut SymbolVec<Symbol>, idx: crate::index::SymbolIndex) {
    symbols[idx].index = idx;
}

fn fix_rule_index<V>(rules: &mut RuleVec<Rule<V>>, idx: crate::index::RuleIndex) {
    rules[idx].index = idx;
}

fn fix_token_index<V>(tokens: &mut TokenVec<Token<V>>, idx: crate::index::TokenIndex) {
    tokens[idx].index = idx;
}

/// Builder handle returned by [`GrammarBuilder::token`]; chain methods
/// mutate the pending spec and return `self` so calls read top to bottom.
pub struct TokenBuilder<'a, V> {
    builder: &'a mut GrammarBuilder<V>,
    index: usize,
}

impl<'a, V> TokenBuilder<'a, V> {
    pub fn symbol(self, name: &str) -> Self {
        self.builder.token_specs[self.index].symbol_name = Some(name.to_string());
        self
    }

    pub fn precedence(self, level: u32, assoc: Assoc) -> Self {
        self.builder.token_specs[self.index].precedence = Some(Precedence::new(level, assoc));
        self
    }

    pub fn action(self, f: impl Fn(&[u8]) -> V + 'static) -> Self {
        self.builder.token_specs[self.index].action = Some(Box::new(f));
        self
    }

    pub fn fullword(self) -> Self {
        self.builder.token_specs[self.index].fullword = true;
        self
    }

    pub fn states(self, names: &[&str]) -> Self {
        self.builder.token_specs[self.index].states = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn enter_state(self, name: &str) -> Self {
        self.builder.token_specs[self.index].enter_state = Some(name.to_string());
        self
    }
}

pub struct EndTokenBuilder<'a, V> {
    builder: &'a mut GrammarBuilder<V>,
}

impl<'a, V> EndTokenBuilder<'a, V> {
    pub fn action(self, f: impl Fn(&[u8]) -> V + 'static) -> Self {
        self.builder.end_action = Some(Box::new(f));
        self
    }
}

/// Builder handle returned by [`GrammarBuilder::rule`]; `.production(...)`
/// stages an RHS and `.action(...)` finalizes it as one `RuleSpec`, so
/// several productions for the same LHS chain naturally.
pub struct RuleBuilder<'a, V> {
    builder: &'a mut GrammarBuilder<V>,
    lhs: String,
    pending_rhs: Option<Vec<String>>,
    pending_precedence: Option<Precedence>,
}

impl<'a, V> RuleBuilder<'a, V> {
    pub fn production(mut self, rhs: &[&str]) -> Self {
        self.pending_rhs = Some(rhs.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn precedence(mut self, level: u32, assoc: Assoc) -> Self {
        self.pending_precedence = Some(Precedence::new(level, assoc));
        self
    }

    pub fn action(mut self, f: impl Fn(Vec<V>) -> V + 'static) -> Self {
        let rhs = self.pending_rhs.take().unwrap_or_default();
        self.builder.rule_specs.push(RuleSpec {
            lhs_name: self.lhs.clone(),
            rhs_names: rhs,
            action: Box::new(f),
            precedence_override: self.pending_precedence.take(),
        });
        self
    }
}
