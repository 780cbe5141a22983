//! §8 scenario 4: an ambiguous grammar whose conflicts are collected into a
//! non-aborting `Report` instead of failing preparation.
//!
//! `sequence -> sequence a | maybea | <eps>; maybea -> a | <eps>` produces
//! three conflicts in state 0: two shift/reduce (the lookahead `a` against
//! each epsilon reduction) and one reduce/reduce (the two epsilon
//! reductions against each other).

use lalrgen::builder::GrammarBuilder;
use lalrgen::runtime::Parser;

#[test]
fn ambiguous_epsilon_grammar_reports_three_conflicts() {
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

    let grammar = b.finish().expect("grammar builds");
    let mut parser = Parser::new(grammar);
    let report = parser.prepare();

    assert_eq!(report.number_of_issues(), 3);
    assert!(!report.is_ok());

    let rendered = report.render(parser.grammar());
    assert!(rendered.contains("Shift-reduce conflict"));
    assert!(rendered.contains("Reduce-reduce conflict"));
}
