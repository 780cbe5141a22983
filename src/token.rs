//! Stateful longest-match tokenizer (§4.5).
//!
//! A [`Token`] wraps one anchored regex plus the metadata (symbol, action,
//! active lexer states, state-transition) the scanner needs. [`Tokenizer`]
//! drives a stack of input buffers and a stack of named lexer states over
//! them, picking the longest match among the patterns active in the
//! current state on every step, exactly as described in §4.5.

use std::collections::HashSet;

use regex::bytes::{Regex, RegexSet};

use crate::error::{Error, Result};
use crate::index::{SymbolIndex, TokenIndex, TokenVec};

/// The name of the lexer state every tokenizer starts in.
pub const DEFAULT_STATE: &str = "@default";

/// One registered token pattern.
pub struct Token<V> {
    pub index: TokenIndex,
    /// The raw pattern text as given to `token(...)`, before the `fullword`
    /// word-boundary wrap and the start anchor are applied.
    pub source_pattern: String,
    /// Anchored, possibly fullword-wrapped pattern compiled against it.
    pub(crate) regex: Regex,
    pub(crate) anchored_pattern: String,
    /// Absent means this token is "silent": matched and discarded (§3).
    pub symbol: Option<SymbolIndex>,
    pub action: Option<Box<dyn Fn(&[u8]) -> V>>,
    pub states: HashSet<String>,
    pub enter_state: Option<String>,
    pub fullword: bool,
}

impl<V> Token<V> {
    pub(crate) fn new(
        index: TokenIndex,
        pattern: &str,
        fullword: bool,
        symbol: Option<SymbolIndex>,
        action: Option<Box<dyn Fn(&[u8]) -> V>>,
        states: HashSet<String>,
        enter_state: Option<String>,
    ) -> Result<Self> {
        let wrapped = if fullword {
            format!(r"\b(?:{})(\b|$)", pattern)
        } else {
            pattern.to_string()
        };
        let anchored_pattern = format!("^(?:{})", wrapped);
        let regex = Regex::new(&anchored_pattern)
            .map_err(|e| Error::UnknownSymbolName(format!("invalid pattern '{pattern}': {e}")))?;
        Ok(Self {
            index,
            source_pattern: pattern.to_string(),
            regex,
            anchored_pattern,
            symbol,
            action,
            states,
            enter_state,
            fullword,
        })
    }

    pub fn is_silent(&self) -> bool {
        self.symbol.is_none()
    }

    fn active_in(&self, state: &str) -> bool {
        self.states.contains(state)
    }
}

/// A successfully matched, non-silent token ready for the runtime.
pub struct TokenMatch<V> {
    pub symbol: SymbolIndex,
    pub value: V,
    pub length: usize,
    /// Byte offset (within the current input frame) where the match began.
    pub start: usize,
}

struct InputFrame {
    data: Vec<u8>,
    pos: usize,
    at_end: bool,
}

impl InputFrame {
    fn new(data: Vec<u8>) -> Self {
        let at_end = data.is_empty();
        Self { data, pos: 0, at_end }
    }

    fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }
}

/// Drives the stateful scanner described in §4.5 over one or more pushed
/// input buffers.
///
/// `peek` is idempotent: it scans forward through any silent tokens (and
/// applies their `enter_state` side effects) exactly once, caching the next
/// non-silent token (or the end-of-input token) until `consume` is called.
/// Because the runtime never needs more than one token of lookahead, this
/// gives the same externally observable behavior as a design that deferred
/// all cursor movement to `consume`, at a fraction of the bookkeeping.
pub struct Tokenizer<'g, V> {
    tokens: &'g TokenVec<Token<V>>,
    token_set: &'g RegexSet,
    end_symbol: SymbolIndex,
    end_action: Option<&'g (dyn Fn(&[u8]) -> V)>,
    inputs: Vec<InputFrame>,
    lexer_states: Vec<String>,
    pending: Option<TokenMatch<V>>,
}

impl<'g, V> Tokenizer<'g, V> {
    pub fn new(
        tokens: &'g TokenVec<Token<V>>,
        token_set: &'g RegexSet,
        end_symbol: SymbolIndex,
        end_action: Option<&'g (dyn Fn(&[u8]) -> V)>,
    ) -> Self {
        Self {
            tokens,
            token_set,
            end_symbol,
            end_action,
            inputs: Vec::new(),
            lexer_states: vec![DEFAULT_STATE.to_string()],
            pending: None,
        }
    }

    pub fn push_input(&mut self, bytes: Vec<u8>) {
        self.inputs.push(InputFrame::new(bytes));
        self.pending = None;
    }

    pub fn pop_input(&mut self) {
        self.inputs.pop();
        self.pending = None;
    }

    fn current_state(&self) -> &str {
        self.lexer_states.last().map(String::as_str).unwrap_or(DEFAULT_STATE)
    }

    fn enter_state(&mut self, name: &str) {
        if name.starts_with('@') {
            if let Some(top) = self.lexer_states.last_mut() {
                *top = name.to_string();
            } else {
                self.lexer_states.push(name.to_string());
            }
        } else {
            self.lexer_states.push(name.to_string());
        }
    }

    /// Returns the next token without letting the runtime act on it twice;
    /// repeated calls before `consume` return the same cached match.
    pub fn peek(&mut self) -> Result<&TokenMatch<V>> {
        if self.pending.is_none() {
            let m = self.scan_next()?;
            self.pending = Some(m);
        }
        Ok(self.pending.as_ref().unwrap())
    }

    /// Hands back the token cached by the last `peek`, clearing the cache
    /// so the next `peek` scans fresh input.
    pub fn consume(&mut self) -> Option<TokenMatch<V>> {
        self.pending.take()
    }

    fn scan_next(&mut self) -> Result<TokenMatch<V>> {
        loop {
            let frame = match self.inputs.last_mut() {
                Some(f) => f,
                None => {
                    return Ok(TokenMatch {
                        symbol: self.end_symbol,
                        value: self.end_value(&[]),
                        length: 0,
                        start: 0,
                    })
                }
            };
            if frame.pos >= frame.data.len() {
                frame.at_end = true;
                let value = self.end_value(&[]);
                return Ok(TokenMatch {
                    symbol: self.end_symbol,
                    value,
                    length: 0,
                    start: frame.pos,
                });
            }

            let state = self.current_state().to_string();
            let start = self.inputs.last().unwrap().pos;
            let remaining = self.inputs.last().unwrap().remaining();

            let candidates: Vec<usize> = self
                .token_set
                .matches(remaining)
                .into_iter()
                .filter(|&i| self.tokens[TokenIndex(i)].active_in(&state))
                .collect();

            if candidates.is_empty() {
                return Err(Error::Tokenization { offset: start });
            }

            // Longest match wins; earliest registration order breaks ties.
            let mut winner: Option<(usize, usize)> = None; // (token idx, len)
            for idx in candidates {
                let tok = &self.tokens[TokenIndex(idx)];
                if let Some(m) = tok.regex.find(remaining) {
                    if m.start() == 0 {
                        let len = m.end();
                        let better = match winner {
                            None => true,
                            Some((_, best_len)) => len > best_len,
                        };
                        if better {
                            winner = Some((idx, len));
                        }
                    }
                }
            }

            let (winner_idx, len) = winner.ok_or(Error::Tokenization { offset: start })?;
            let matched_bytes = self.inputs.last().unwrap().remaining()[..len].to_vec();
            let tok = &self.tokens[TokenIndex(winner_idx)];
            let value = tok.action.as_ref().map(|f| f(&matched_bytes));
            let symbol = tok.symbol;
            let enter = tok.enter_state.clone();

            self.inputs.last_mut().unwrap().pos += len;
            if let Some(target) = enter {
                self.enter_state(&target);
            }

            match symbol {
                None => continue, // silent token, scan again
                Some(sym) => {
                    return Ok(TokenMatch {
                        symbol: sym,
                        value: value.unwrap_or_else(|| self.default_value()),
                        length: len,
                        start,
                    })
                }
            }
        }
    }

    fn end_value(&self, bytes: &[u8]) -> V
    where
        V: Default,
    {
        self.end_action.map(|f| f(bytes)).unwrap_or_default()
    }

    fn default_value(&self) -> V
    where
        V: Default,
    {
        V::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TokenVec;

    fn set_of(tokens: &TokenVec<Token<()>>) -> RegexSet {
        RegexSet::new(tokens.iter().map(|t| t.anchored_pattern.clone())).unwrap()
    }

    #[test]
    fn longest_match_wins_over_earlier_shorter() {
        let mut tokens: TokenVec<Token<()>> = TokenVec::new();
        let idx0 = TokenIndex(0);
        let idx1 = TokenIndex(1);
        tokens.push(
            Token::new(idx0, "a", false, Some(SymbolIndex(0)), None, HashSet::from([DEFAULT_STATE.to_string()]), None)
                .unwrap(),
        );
        tokens.push(
            Token::new(idx1, "aa", false, Some(SymbolIndex(1)), None, HashSet::from([DEFAULT_STATE.to_string()]), None)
                .unwrap(),
        );
        let set = set_of(&tokens);
        let mut tz = Tokenizer::new(&tokens, &set, SymbolIndex(99), None);
        tz.push_input(b"aa".to_vec());
        let m = tz.peek().unwrap();
        assert_eq!(m.symbol, SymbolIndex(1));
        assert_eq!(m.length, 2);
    }

    #[test]
    fn silent_tokens_are_skipped() {
        let mut tokens: TokenVec<Token<()>> = TokenVec::new();
        tokens.push(
            Token::new(
                TokenIndex(0),
                r"\s+",
                false,
                None,
                None,
                HashSet::from([DEFAULT_STATE.to_string()]),
                None,
            )
            .unwrap(),
        );
        tokens.push(
            Token::new(
                TokenIndex(1),
                "a",
                false,
                Some(SymbolIndex(0)),
                None,
                HashSet::from([DEFAULT_STATE.to_string()]),
                None,
            )
            .unwrap(),
        );
        let set = set_of(&tokens);
        let mut tz = Tokenizer::new(&tokens, &set, SymbolIndex(99), None);
        tz.push_input(b"   a".to_vec());
        let m = tz.peek().unwrap();
        assert_eq!(m.symbol, SymbolIndex(0));
        assert_eq!(m.start, 3);
    }

    #[test]
    fn end_of_input_yields_end_symbol() {
        let tokens: TokenVec<Token<()>> = TokenVec::new();
        let set = RegexSet::new(Vec::<&str>::new()).unwrap();
        let mut tz = Tokenizer::new(&tokens, &set, SymbolIndex(7), None);
        tz.push_input(Vec::new());
        let m = tz.peek().unwrap();
        assert_eq!(m.symbol, SymbolIndex(7));
    }
}
