//! §8 scenario 2: `S -> a S b | a b`, the canonical a^n b^n grammar.

use lalrgen::builder::GrammarBuilder;
use lalrgen::runtime::Parser;

fn build() -> Parser<i64> {
    let mut b: GrammarBuilder<i64> = GrammarBuilder::new();
    b.token("a").symbol("a");
    b.token("b").symbol("b");
    b.rule("S")
        .production(&["a", "S", "b"])
        .action(|mut v| {
            let n: i64 = v.remove(0);
            n + 1
        })
        .production(&["a", "b"])
        .action(|_| 1);
    b.set_start_symbol("S");
    let grammar = b.finish().expect("grammar builds");
    let mut parser = Parser::new(grammar);
    assert!(parser.prepare().is_ok());
    parser
}

#[test]
fn three_nested_pairs_reduce_to_three() {
    let parser = build();
    assert_eq!(parser.parse("aaabbb").unwrap(), 3);
}

#[test]
fn short_on_bs_is_unexpected_at_end() {
    let parser = build();
    let err = parser.parse("aabbb").unwrap_err();
    assert_eq!(err.to_string(), "Syntax error: Unexpected b, expected one of @end");
}

#[test]
fn missing_trailing_b_is_unexpected_end() {
    let parser = build();
    let err = parser.parse("aaabb").unwrap_err();
    assert_eq!(err.to_string(), "Syntax error: Unexpected @end, expected one of b");
}
