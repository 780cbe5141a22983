//! Symbols, rules, precedence and the classic Empty/First/Follow grammar
//! analysis (Dragon book §4.4, as in the teacher's own `table.rs`
//! `first_sets`/`follow_sets`, generalized here to be memoized per-symbol
//! with a cycle-breaking "currently exploring" stack instead of iterating
//! every production to a global fixpoint).

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use regex::bytes::RegexSet;

use crate::index::{RuleIndex, RuleVec, SymbolIndex, SymbolVec, TokenVec};
use crate::token::Token;

/// Associativity used to break shift/reduce conflicts at equal precedence
/// levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

/// A scalar precedence level plus its associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precedence {
    pub level: u32,
    pub assoc: Assoc,
}

impl Precedence {
    pub fn new(level: u32, assoc: Assoc) -> Self {
        Self { level, assoc }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// The synthetic `start'` nonterminal, LHS of the single augmenting rule
    /// `start' -> S`. End-of-input is never part of this rule's RHS; it is
    /// a pure lookahead sentinel that triggers `Accept`.
    Start,
    /// The synthetic end-of-input terminal `@end`.
    End,
    Terminal,
    Nonterminal,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub index: SymbolIndex,
    pub name: String,
    pub kind: SymbolKind,
    pub precedence: Option<Precedence>,
}

impl Symbol {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, SymbolKind::Terminal | SymbolKind::End)
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self.kind, SymbolKind::Nonterminal | SymbolKind::Start)
    }
}

/// A production `lhs -> rhs` with its semantic action.
///
/// The action consumes the popped values of the RHS (in left-to-right
/// order, one per RHS symbol including silent-token gaps filled with the
/// value type's `Default`) and produces the single value that replaces them
/// on the runtime's value stack.
pub struct Rule<V> {
    pub index: RuleIndex,
    pub lhs: SymbolIndex,
    pub rhs: Vec<SymbolIndex>,
    pub action: Box<dyn Fn(Vec<V>) -> V>,
    /// Overrides the rightmost-terminal precedence rule (§3 "effective
    /// precedence") when set.
    pub precedence_override: Option<Precedence>,
}

impl<V> Rule<V> {
    /// `LHS -> s1 s2 s3`, or `LHS -> <eps>` for an empty RHS (§6 rule string
    /// form, used verbatim in conflict report lines).
    pub fn to_display_string(&self, grammar: &Grammar<V>) -> String {
        let lhs = &grammar.symbols[self.lhs].name;
        if self.rhs.is_empty() {
            format!("{} -> <eps>", lhs)
        } else {
            let rhs: Vec<&str> = self
                .rhs
                .iter()
                .map(|s| grammar.symbols[*s].name.as_str())
                .collect();
            format!("{} -> {}", lhs, rhs.join(" "))
        }
    }
}

/// Owns symbols, rules and tokens, and computes Empty/First/Follow over
/// them. Built once by [`crate::builder::GrammarBuilder::finish`]; from then
/// on it is logically read-only and safe to share across parse sessions
/// (§5) — [`crate::runtime::Parser`] is what layers the automaton and table
/// on top via `prepare`.
pub struct Grammar<V> {
    pub symbols: SymbolVec<Symbol>,
    pub rules: RuleVec<Rule<V>>,
    pub name_to_symbol: HashMap<String, SymbolIndex>,
    pub start_symbol: SymbolIndex,
    pub synthetic_start: SymbolIndex,
    pub end_symbol: SymbolIndex,
    /// The single augmenting rule `start' -> S $` (§3).
    pub start_rule: RuleIndex,

    /// Registered token patterns, in the order `GrammarBuilder` assigned
    /// them, and the combined `RegexSet` the tokenizer filters candidates
    /// through before measuring exact matches (§4.5).
    pub tokens: TokenVec<Token<V>>,
    pub token_set: RegexSet,
    pub end_action: Option<Box<dyn Fn(&[u8]) -> V>>,

    empty_memo: RefCell<HashMap<SymbolIndex, bool>>,
    first_memo: RefCell<HashMap<SymbolIndex, HashSet<SymbolIndex>>>,
    follow_memo: RefCell<HashMap<SymbolIndex, HashSet<SymbolIndex>>>,
}

impl<V> Grammar<V> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        symbols: SymbolVec<Symbol>,
        rules: RuleVec<Rule<V>>,
        name_to_symbol: HashMap<String, SymbolIndex>,
        start_symbol: SymbolIndex,
        synthetic_start: SymbolIndex,
        end_symbol: SymbolIndex,
        start_rule: RuleIndex,
        tokens: TokenVec<Token<V>>,
        token_set: RegexSet,
        end_action: Option<Box<dyn Fn(&[u8]) -> V>>,
    ) -> Self {
        Self {
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
            empty_memo: RefCell::new(HashMap::new()),
            first_memo: RefCell::new(HashMap::new()),
            follow_memo: RefCell::new(HashMap::new()),
        }
    }

    /// A fresh [`crate::token::Tokenizer`] borrowing this grammar's tokens.
    pub fn tokenizer(&self) -> crate::token::Tokenizer<'_, V> {
        crate::token::Tokenizer::new(
            &self.tokens,
            &self.token_set,
            self.end_symbol,
            self.end_action.as_deref(),
        )
    }

    pub fn rules_for(&self, lhs: SymbolIndex) -> impl Iterator<Item = &Rule<V>> {
        self.rules.iter().filter(move |r| r.lhs == lhs)
    }

    pub fn symbol_name(&self, sym: SymbolIndex) -> &str {
        &self.symbols[sym].name
    }

    /// Invalidates the Empty/First/Follow memo tables. Call after mutating
    /// rules; `prepare` does this once before computing the automaton.
    pub fn reset_analysis_cache(&self) {
        self.empty_memo.borrow_mut().clear();
        self.first_memo.borrow_mut().clear();
        self.follow_memo.borrow_mut().clear();
    }

    /// True iff `sym` derives the empty string (§4.1 `empty`).
    pub fn empty(&self, sym: SymbolIndex) -> bool {
        let mut exploring = HashSet::new();
        self.empty_inner(sym, &mut exploring)
    }

    fn empty_inner(&self, sym: SymbolIndex, exploring: &mut HashSet<SymbolIndex>) -> bool {
        if let Some(v) = self.empty_memo.borrow().get(&sym) {
            return *v;
        }
        if self.symbols[sym].is_terminal() {
            self.empty_memo.borrow_mut().insert(sym, false);
            return false;
        }
        // A re-entered LHS on the exploration stack cannot by itself prove
        // nullability; it contributes `false` until some other production
        // terminates the recursion (§4.1).
        if exploring.contains(&sym) {
            return false;
        }
        // Only the outermost call for a symbol sees its true fixpoint value;
        // a result computed while an ancestor is still on `exploring` may
        // have been truncated by that ancestor's own cycle guard and must
        // not be cached as final (§4.1).
        let is_outermost = exploring.is_empty();
        exploring.insert(sym);
        let mut result = false;
        for rule in self.rules_for(sym) {
            if rule.rhs.iter().all(|s| self.empty_inner(*s, exploring)) {
                result = true;
                break;
            }
        }
        exploring.remove(&sym);
        if is_outermost {
            self.empty_memo.borrow_mut().insert(sym, result);
        }
        result
    }

    /// The set of terminals that may begin a derivation from `sym` (§4.1
    /// `first`).
    pub fn first(&self, sym: SymbolIndex) -> HashSet<SymbolIndex> {
        let mut exploring = HashSet::new();
        self.first_inner(sym, &mut exploring)
    }

    fn first_inner(
        &self,
        sym: SymbolIndex,
        exploring: &mut HashSet<SymbolIndex>,
    ) -> HashSet<SymbolIndex> {
        if let Some(v) = self.first_memo.borrow().get(&sym) {
            return v.clone();
        }
        if self.symbols[sym].is_terminal() {
            let mut set = HashSet::new();
            set.insert(sym);
            self.first_memo.borrow_mut().insert(sym, set.clone());
            return set;
        }
        if exploring.contains(&sym) {
            return HashSet::new();
        }
        // Only cache the result of the outermost call for `sym` — a nested
        // call made while an ancestor is still on `exploring` can be cut
        // short by that ancestor's cycle guard and is not the true fixpoint
        // value (§4.1, §8).
        let is_outermost = exploring.is_empty();
        exploring.insert(sym);
        let mut set = HashSet::new();
        for rule in self.rules_for(sym) {
            set.extend(self.first_of_sequence_inner(&rule.rhs, exploring));
        }
        exploring.remove(&sym);
        if is_outermost {
            self.first_memo.borrow_mut().insert(sym, set.clone());
        }
        set
    }

    /// `First(s1 s2 ... sn)`: union of `First(si)` while each preceding `si`
    /// is nullable; stops at the first non-nullable symbol.
    pub fn first_of_sequence(&self, seq: &[SymbolIndex]) -> HashSet<SymbolIndex> {
        let mut exploring = HashSet::new();
        self.first_of_sequence_inner(seq, &mut exploring)
    }

    fn first_of_sequence_inner(
        &self,
        seq: &[SymbolIndex],
        exploring: &mut HashSet<SymbolIndex>,
    ) -> HashSet<SymbolIndex> {
        let mut set = HashSet::new();
        for &s in seq {
            set.extend(self.first_inner(s, exploring));
            if !self.empty_inner(s, exploring) {
                return set;
            }
        }
        set
    }

    /// The set of terminals that may immediately follow `sym` in some
    /// sentential form (§4.1 `follow`).
    pub fn follow(&self, sym: SymbolIndex) -> HashSet<SymbolIndex> {
        let mut visited = HashSet::new();
        self.follow_inner(sym, &mut visited)
    }

    fn follow_inner(
        &self,
        sym: SymbolIndex,
        visited: &mut HashSet<SymbolIndex>,
    ) -> HashSet<SymbolIndex> {
        if let Some(v) = self.follow_memo.borrow().get(&sym) {
            return v.clone();
        }
        if visited.contains(&sym) {
            return HashSet::new();
        }
        // As in `first_inner`: a nested call made while an ancestor is
        // still on `visited` can be cut short by that ancestor's cycle
        // guard, so only the outermost call's result is final and
        // cacheable (§4.1, §8).
        let is_outermost = visited.is_empty();
        visited.insert(sym);

        let mut set = HashSet::new();
        if sym == self.synthetic_start {
            set.insert(self.end_symbol);
        }
        for rule in self.rules.iter() {
            for (i, &rhs_sym) in rule.rhs.iter().enumerate() {
                if rhs_sym != sym {
                    continue;
                }
                let rest = &rule.rhs[i + 1..];
                let rest_first = self.first_of_sequence(rest);
                set.extend(rest_first.iter().copied());
                if rest.is_empty() || rest.iter().all(|s| self.empty(*s)) {
                    set.extend(self.follow_inner(rule.lhs, visited));
                }
            }
        }
        if is_outermost {
            self.follow_memo.borrow_mut().insert(sym, set.clone());
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GrammarBuilder;

    fn anbn() -> Grammar<i64> {
        let mut b: GrammarBuilder<i64> = GrammarBuilder::new();
        b.token("a").symbol("a");
        b.token("b").symbol("b");
        b.rule("S")
            .production(&["a", "S", "b"])
            .action(|mut v| v.remove(0))
            .production(&["a", "b"])
            .action(|_| 0);
        b.set_start_symbol("S");
        b.finish().expect("grammar builds")
    }

    #[test]
    fn empty_first_follow_basic() {
        let g = anbn();
        let s = g.name_to_symbol["S"];
        let a = g.name_to_symbol["a"];
        let b = g.name_to_symbol["b"];

        assert!(!g.empty(s));
        assert_eq!(g.first(s), HashSet::from([a]));
        assert!(g.follow(s).contains(&g.end_symbol));
        assert!(g.follow(a).contains(&b));
    }

    #[test]
    fn nullable_recursive_rule_terminates() {
        // A -> A | <eps> is nullable via the epsilon alternative even though
        // the recursive alternative alone can't prove it.
        let mut b: GrammarBuilder<()> = GrammarBuilder::new();
        b.token("x").symbol("x");
        b.rule("A")
            .production(&["A"])
            .action(|_| ())
            .production(&[])
            .action(|_| ());
        b.rule("S").production(&["A", "x"]).action(|_| ());
        b.set_start_symbol("S");
        let g = b.finish().unwrap();
        let a = g.name_to_symbol["A"];
        assert!(g.empty(a));
    }

    #[test]
    fn first_of_mutually_recursive_nonterminals_is_not_poisoned_by_caching() {
        // A -> B x | a; B -> A y | b. Querying `first(A)` first must not
        // permanently cache a truncated `first(B)` as a side effect: the
        // nested call into B happens while A is still being explored, so
        // only the later, independent `first(B)` call is allowed to cache.
        let mut b: GrammarBuilder<()> = GrammarBuilder::new();
        b.token("a").symbol("a");
        b.token("b").symbol("b");
        b.token("x").symbol("x");
        b.token("y").symbol("y");
        b.rule("A")
            .production(&["B", "x"])
            .action(|_| ())
            .production(&["a"])
            .action(|_| ());
        b.rule("B")
            .production(&["A", "y"])
            .action(|_| ())
            .production(&["b"])
            .action(|_| ());
        b.set_start_symbol("A");
        let g = b.finish().unwrap();
        let a = g.name_to_symbol["a"];
        let b_sym = g.name_to_symbol["b"];
        let nt_a = g.name_to_symbol["A"];
        let nt_b = g.name_to_symbol["B"];

        assert_eq!(g.first(nt_a), HashSet::from([a, b_sym]));
        assert_eq!(g.first(nt_b), HashSet::from([a, b_sym]));
    }
}
