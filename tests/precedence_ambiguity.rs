//! §8 scenario 5: a deliberately ambiguous grammar where `(` and `)` are
//! shared literally between two nonterminals, resolved by a rule-level
//! precedence override.
//!
//! `E -> (E) | PE` (the second production overridden to outrank `)`) and
//! `PE -> (PE) | a`. Because `(`/`)` are shared between `E` and `PE`'s
//! parenthesized productions, every closing paren is a shift/reduce
//! conflict between continuing to close a `PE` and reducing the `PE`
//! already on the stack up to `E`. Giving `E -> PE` higher precedence than
//! `)` makes that reduction win every time, so an `a` nested under any
//! number of parens derives through `PE` exactly once and then climbs out
//! as a chain of `E -> (E)` reductions.

use std::cell::RefCell;
use std::rc::Rc;

use lalrgen::builder::GrammarBuilder;
use lalrgen::grammar::Assoc;
use lalrgen::runtime::Parser;

#[test]
fn nested_parens_resolve_through_one_pe_reduction() {
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let mut b: GrammarBuilder<()> = GrammarBuilder::new();
    b.token(r"\(").symbol("lparen");
    b.token(r"\)").symbol("rparen").precedence(0, Assoc::Left);
    b.token("a").symbol("a");

    let log_e_paren = log.clone();
    let log_e_pe = log.clone();
    b.rule("E")
        .production(&["lparen", "E", "rparen"])
        .action(move |_| log_e_paren.borrow_mut().push("E->(E)"))
        .production(&["PE"])
        .precedence(1, Assoc::Left)
        .action(move |_| log_e_pe.borrow_mut().push("E->PE"));

    let log_pe_paren = log.clone();
    let log_pe_a = log.clone();
    b.rule("PE")
        .production(&["lparen", "PE", "rparen"])
        .action(move |_| log_pe_paren.borrow_mut().push("PE->(PE)"))
        .production(&["a"])
        .action(move |_| log_pe_a.borrow_mut().push("PE->a"));
    b.set_start_symbol("E");

    let grammar = b.finish().expect("grammar builds");
    let mut parser = Parser::new(grammar);
    parser.prepare();

    parser.parse("(((a)))").unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["PE->a", "E->PE", "E->(E)", "E->(E)", "E->(E)"]
    );
}
