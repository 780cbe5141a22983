//! An embeddable LALR(1) parser generator with an integrated stateful
//! regex tokenizer: build a grammar with [`builder::GrammarBuilder`], hand
//! it to [`runtime::Parser`], call `prepare()` once, then `parse()` any
//! number of inputs.
//!
//! ```
//! use lalrgen::builder::GrammarBuilder;
//! use lalrgen::runtime::Parser;
//!
//! let mut b: GrammarBuilder<i64> = GrammarBuilder::new();
//! b.token(r"\s+");
//! b.token("[0-9]+").symbol("num").action(|bytes| {
//!     std::str::from_utf8(bytes).unwrap().parse().unwrap()
//! });
//! b.token("\\+").symbol("plus");
//! b.rule("sum")
//!     .production(&["sum", "plus", "num"])
//!     .action(|mut v| {
//!         let rhs: i64 = v.pop().unwrap();
//!         v.pop(); // plus, no value
//!         let lhs: i64 = v.remove(0);
//!         lhs + rhs
//!     })
//!     .production(&["num"])
//!     .action(|mut v| v.remove(0));
//! b.set_start_symbol("sum");
//! let grammar = b.finish().unwrap();
//!
//! let mut parser = Parser::new(grammar);
//! let report = parser.prepare();
//! assert!(report.is_ok());
//! assert_eq!(parser.parse("1 + 2 + 3").unwrap(), 6);
//! ```

pub mod automaton;
pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod index;
pub mod operations;
pub mod relations;
pub mod runtime;
pub mod settings;
pub mod table;
pub mod token;
mod trace;

pub use builder::GrammarBuilder;
pub use error::{Error, Result};
pub use grammar::Grammar;
pub use runtime::{Parser, Runtime, Step};
pub use settings::Settings;
pub use table::Report;
