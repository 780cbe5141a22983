//! Error types raised while parsing. Conflicts found during table
//! preparation are *not* represented here — those are collected into a
//! [`crate::table::Report`] instead, since preparation never aborts.

use thiserror::Error;

/// Errors that can occur while driving the tokenizer/runtime over an input.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Syntax error: Unexpected {unexpected}, expected one of {}", format_expected(.expected))]
    Syntax {
        unexpected: String,
        expected: Vec<String>,
    },

    #[error("Syntax error: Unknown symbol on input, expected one of {}", format_expected(.expected))]
    UnknownSymbol { expected: Vec<String> },

    #[error("Tokenization error at byte offset {offset}: no pattern matched")]
    Tokenization { offset: usize },

    #[error("unknown symbol '{0}' referenced in grammar")]
    UnknownSymbolName(String),

    #[error("start symbol '{0}' was never declared by a rule")]
    UnknownStartSymbol(String),
}

fn format_expected(expected: &[String]) -> String {
    expected.join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
