use codemap::CodeMap;
use indoc::indoc;

use crate::ast::*;
use crate::{compile, grammar, CompileError, Compiled, Diagnostic};

fn parse(src: &str) -> Grammar {
    let mut codemap = CodeMap::new();
    let file = codemap.add_file("input.test".into(), src.into());
    grammar::peggy::grammar(file.source(), file.span).unwrap()
}

fn messages(src: &str) -> Vec<String> {
    match compile("input.test", src) {
        Err(CompileError::Invalid { diagnostics, .. }) => diagnostics.iter().map(Diagnostic::msg).collect(),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("grammar compiled"),
    }
}

fn rule_names(compiled: &Compiled) -> Vec<&str> {
    compiled.grammar().iter_rules().map(|r| r.name.name.as_str()).collect()
}

#[test]
fn test_finds_left_recursion() {
    let mut msgs = messages(indoc! {r#"
        foo <- "foo" foo / bar
        bar <- "bar" bar / foo
    "#});
    msgs.sort();

    assert_eq!(
        msgs,
        vec![
            "left recursive rules create an infinite loop: bar -> foo -> bar",
            "left recursive rules create an infinite loop: foo -> bar -> foo",
        ]
    );
}

#[test]
fn test_finds_direct_left_recursion() {
    assert_eq!(
        messages("foo <- foo"),
        vec!["left recursive rules create an infinite loop: foo -> foo"]
    );
}

#[test]
fn test_finds_left_recursion_behind_nullable_prefix() {
    assert_eq!(
        messages(r#"foo <- "x"? foo "y" / "z""#),
        vec!["left recursive rules create an infinite loop: foo -> foo"]
    );
}

#[test]
fn test_finds_left_recursion_through_template() {
    let msgs = messages(indoc! {r#"
        A <- L<B>
        B <- "b"
        L<x> <- L<x> x / x
    "#});
    assert_eq!(msgs, vec!["left recursive rules create an infinite loop: L<B> -> L<B>"]);
}

#[test]
fn test_right_recursion_is_allowed() {
    assert!(compile("input.test", r#"foo <- "a" foo / "a""#).is_ok());
}

#[test]
fn test_finds_left_recursion_behind_nullable_rule() {
    let msgs = messages(indoc! {r#"
        A <- B A "x" / "y"
        B <- C "b"?
        C <- &"c"
    "#});
    assert_eq!(msgs, vec!["left recursive rules create an infinite loop: A -> A"]);
}

#[test]
fn test_long_rule_chains_compile() {
    let mut src = String::new();
    for i in 0..64 {
        src.push_str(&format!("R{0} <- R{1} \"+\" / R{1} \"-\" / R{1}\n", i, i + 1));
    }
    src.push_str("R64 <- [0-9]\n");
    let compiled = compile("input.test", &src).unwrap();
    assert_eq!(compiled.grammar().iter_rules().count(), 65);
}

#[test]
fn test_identical_instantiations_share_a_rule() {
    let compiled = compile(
        "input.test",
        indoc! {r#"
            A <- L<X> "," L<X>
            L<x> <- x+
            X <- "x"
        "#},
    )
    .unwrap();

    assert_eq!(rule_names(&compiled), vec!["A", "X", "L<X>"]);
}

#[test]
fn test_nested_instantiation_order() {
    let compiled = compile(
        "input.test",
        indoc! {r#"
            A <- P<L<X>>
            P<y> <- "(" y ")"
            L<x> <- x*
            X <- "x"
        "#},
    )
    .unwrap();

    assert_eq!(rule_names(&compiled), vec!["A", "X", "L<X>", "P<L<X>>"]);

    let p = compiled.grammar().find_rule("P<L<X>>").unwrap();
    match p.expr.expr {
        Expr::Sequence(ref elems) => match elems[1].expr {
            Expr::Rule(ref name, ref args) => {
                assert_eq!(name.name, "L<X>");
                assert!(args.is_empty());
            }
            ref other => panic!("expected rule reference, got {:?}", other),
        },
        ref other => panic!("expected sequence, got {:?}", other),
    }
}

#[test]
fn test_recursive_template_terminates() {
    let compiled = compile(
        "input.test",
        indoc! {r#"
            A <- L<B>
            B <- "b"
            L<x> <- x "," L<x> / x
        "#},
    )
    .unwrap();

    assert_eq!(rule_names(&compiled), vec!["A", "B", "L<B>"]);
}

#[test]
fn test_parameter_passed_through_to_inner_template() {
    let compiled = compile(
        "input.test",
        indoc! {r#"
            A <- Outer<B>
            B <- "b"
            Outer<x> <- Inner<x> ";"
            Inner<y> <- y y
        "#},
    )
    .unwrap();

    assert_eq!(rule_names(&compiled), vec!["A", "B", "Outer<B>", "Inner<B>"]);
}

#[test]
fn test_parses_items() {
    let g = parse(indoc! {r#"
        {prelude}
        # comment
        A <- x:B? y:[^a-z]* Ret:{ return x } / &{ pred } "lit"
        L<a, b> <- a / b
        B <- int: { 1 }
    "#});

    assert_eq!(g.prelude.as_ref().map(|c| c.text.as_str()), Some("prelude"));
    assert_eq!(g.items.len(), 3);
    assert_eq!(g.find_template("L").unwrap().signature(), "L<a, b>");

    let a = g.find_rule("A").unwrap();
    let alts = match a.expr.expr {
        Expr::Choice(ref alts) => alts,
        ref other => panic!("expected choice, got {:?}", other),
    };
    assert_eq!(alts.len(), 2);

    match alts[0].expr {
        Expr::Action { ref hint, ref code, expr: Some(ref inner) } => {
            assert_eq!(hint, "Ret");
            assert_eq!(code.text, " return x ");
            assert!(matches!(inner.expr, Expr::Sequence(ref e) if e.len() == 2));
        }
        ref other => panic!("expected action, got {:?}", other),
    }

    match alts[1].expr {
        Expr::Sequence(ref elems) => {
            assert!(matches!(elems[0].expr, Expr::CodePredicate(PredicateKind::Positive, _)));
            assert!(matches!(elems[1].expr, Expr::Literal(ref s) if s == "lit"));
        }
        ref other => panic!("expected sequence, got {:?}", other),
    }

    let b = g.find_rule("B").unwrap();
    assert!(matches!(b.expr.expr, Expr::Action { ref hint, expr: None, .. } if hint == "int"));
}

#[test]
fn test_parses_char_classes_and_escapes() {
    let g = parse(r#"A <- [^a-z\]] "\t\x41\u{e9}""#);
    match g.find_rule("A").unwrap().expr.expr {
        Expr::Sequence(ref elems) => {
            match elems[0].expr {
                Expr::CharClass(ref class) => {
                    assert!(class.negated);
                    assert_eq!(class.ranges, vec![('a', 'z'), (']', ']')]);
                    assert!(!class.matches('q'));
                    assert!(class.matches('A'));
                }
                ref other => panic!("expected class, got {:?}", other),
            }
            assert!(matches!(elems[1].expr, Expr::Literal(ref s) if s == "\tA\u{e9}"));
        }
        ref other => panic!("expected sequence, got {:?}", other),
    }
}

#[test]
fn test_syntax_error() {
    match compile("input.test", "A <- (\"a\"") {
        Err(CompileError::Syntax { source_name, error }) => {
            assert_eq!(source_name, "input.test");
            assert_eq!(error.location.line, 1);
        }
        _ => panic!("expected syntax error"),
    }
}
