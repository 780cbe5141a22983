//! §8 scenario 1: `A -> A a | a` over a single repeated token.

use lalrgen::builder::GrammarBuilder;
use lalrgen::runtime::Parser;

fn build(skip_whitespace: bool) -> Parser<i64> {
    let mut b: GrammarBuilder<i64> = GrammarBuilder::new();
    if skip_whitespace {
        b.token(r"\s+");
    }
    b.token("a").symbol("a").action(|_| 1);
    // Registered but never used in a production: lets a test drive the
    // parser into a state with no action defined for a recognized symbol.
    b.token("b").symbol("b");
    b.rule("A")
        .production(&["A", "a"])
        .action(|mut v| {
            let n: i64 = v.remove(0);
            n + 1
        })
        .production(&["a"])
        .action(|mut v| v.remove(0));
    b.set_start_symbol("A");
    let grammar = b.finish().expect("grammar builds");
    let mut parser = Parser::new(grammar);
    let report = parser.prepare();
    assert!(report.is_ok(), "unexpected conflicts: {}", report.render(parser.grammar()));
    parser
}

#[test]
fn four_as_reduce_to_four() {
    let parser = build(false);
    assert_eq!(parser.parse("aaaa").unwrap(), 4);
}

#[test]
fn unrecognized_sequence_is_a_syntax_error() {
    let parser = build(false);
    let err = parser.parse("ab").unwrap_err();
    assert_eq!(err.to_string(), "Syntax error: Unexpected b, expected one of @end, a");
}

#[test]
fn whitespace_without_skip_token_is_a_syntax_error() {
    let parser = build(false);
    let err = parser.parse("aa aaa").unwrap_err();
    assert_eq!(err.to_string(), "Syntax error: Unknown symbol on input, expected one of @end, a");
}

#[test]
fn whitespace_with_skip_token_is_accepted() {
    let parser = build(true);
    assert_eq!(parser.parse("aa aaa").unwrap(), 5);
}
