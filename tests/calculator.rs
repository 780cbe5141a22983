//! §8 scenario 3: classic ambiguous expression grammar disambiguated by
//! per-token precedence/associativity and one rule-level override for unary
//! minus.

use lalrgen::builder::GrammarBuilder;
use lalrgen::grammar::Assoc;
use lalrgen::runtime::Parser;

fn build() -> Parser<i64> {
    let mut b: GrammarBuilder<i64> = GrammarBuilder::new();
    b.token(r"\s+");
    b.token(r"[0-9]+").symbol("num").action(|bytes| {
        std::str::from_utf8(bytes).unwrap().parse().unwrap()
    });
    b.token(r"\+").symbol("plus").precedence(1, Assoc::Left);
    b.token("-").symbol("minus").precedence(1, Assoc::Left);
    b.token(r"\*").symbol("star").precedence(2, Assoc::Left);

    b.rule("E")
        .production(&["E", "plus", "E"])
        .action(|mut v| {
            let rhs: i64 = v.pop().unwrap();
            v.pop();
            let lhs: i64 = v.remove(0);
            lhs + rhs
        })
        .production(&["E", "minus", "E"])
        .action(|mut v| {
            let rhs: i64 = v.pop().unwrap();
            v.pop();
            let lhs: i64 = v.remove(0);
            lhs - rhs
        })
        .production(&["E", "star", "E"])
        .action(|mut v| {
            let rhs: i64 = v.pop().unwrap();
            v.pop();
            let lhs: i64 = v.remove(0);
            lhs * rhs
        })
        .production(&["minus", "E"])
        .precedence(3, Assoc::Right)
        .action(|mut v| {
            let operand: i64 = v.pop().unwrap();
            -operand
        })
        .production(&["num"])
        .action(|mut v| v.remove(0));
    b.set_start_symbol("E");

    let grammar = b.finish().expect("grammar builds");
    let mut parser = Parser::new(grammar);
    let report = parser.prepare();
    assert!(report.is_ok(), "unexpected conflicts: {}", report.render(parser.grammar()));
    parser
}

#[test]
fn precedence_orders_multiplication_before_addition() {
    let parser = build();
    assert_eq!(parser.parse("2 + 3 * 4 + 5").unwrap(), 19);
}

#[test]
fn left_associative_chained_subtraction_with_unary_minus() {
    let parser = build();
    assert_eq!(parser.parse("-5 - 3 - -10").unwrap(), 2);
}

#[test]
fn unary_minus_binds_tighter_than_multiplication() {
    let parser = build();
    assert_eq!(parser.parse("5 + -3 * 10").unwrap(), -25);
}
