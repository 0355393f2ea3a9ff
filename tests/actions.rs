use indoc::indoc;
use tpeg::{ActionTable, Value};

fn text(s: &str) -> Value {
    Value::from(s)
}

fn list(items: Vec<Value>) -> Value {
    Value::list(items)
}

const MAP_ACTION: &str = "
				return map[string]string{
					\"1\": l1,
					\"2\": l2,
					\"3\": l3,
				}
			";

fn table() -> ActionTable {
    ActionTable::new()
        .on_predicate("true", |_| true)
        .on_predicate("false", |_| false)
        .on_action(
            MAP_ACTION,
            |b| {
                Value::Map(
                    [("1", "l1"), ("2", "l2"), ("3", "l3")]
                        .into_iter()
                        .map(|(k, l)| (k.to_owned(), b[l].clone()))
                        .collect(),
                )
            },
        )
}

/// Parse each input with rule `A` and compare against the expected value.
fn run_cases(grammar: &str, cases: &[(&str, Value)]) {
    let compiled = tpeg::compile("action.peg", grammar).unwrap();
    let actions = table();
    let parser = compiled.parser(&actions);
    for (input, want) in cases {
        let got = parser.parse("A", input).unwrap();
        assert_eq!(&got, want, "parse({:?})", input);
    }
}

#[test]
fn literal() {
    run_cases(r#"A <- "abc☺XYZ""#, &[("abc☺XYZ", text("abc☺XYZ"))]);
}

#[test]
fn char_class() {
    run_cases(
        "A <- [a-zA-Z0-9☺]",
        &[("a", text("a")), ("☺", text("☺")), ("Z", text("Z")), ("5", text("5"))],
    );
}

#[test]
fn any_char() {
    run_cases(
        "A <- .",
        &[("a", text("a")), ("☺", text("☺")), ("Z", text("Z")), ("5", text("5"))],
    );
}

#[test]
fn star() {
    run_cases(
        r#"A <- "abc"*"#,
        &[
            ("", Value::Absent),
            ("abc", list(vec![text("abc")])),
            ("abcabc", list(vec![text("abc"), text("abc")])),
            ("abcabcabcabc", list(vec![text("abc"); 4])),
        ],
    );
}

#[test]
fn plus() {
    run_cases(
        r#"A <- "abc"+"#,
        &[
            ("abc", list(vec![text("abc")])),
            ("abcabc", list(vec![text("abc"), text("abc")])),
            ("abcabcabcabc", list(vec![text("abc"); 4])),
        ],
    );
}

#[test]
fn question() {
    run_cases(r#"A <- "abc"?"#, &[("", Value::Absent), ("abc", text("abc"))]);
}

#[test]
fn single_type_sequence() {
    run_cases(r#"A <- "a" "b" "c""#, &[("abc", list(vec![text("a"), text("b"), text("c")]))]);
}

#[test]
fn single_type_choice() {
    run_cases(
        r#"A <- "abc" / "☺☹" / ."#,
        &[("abc", text("abc")), ("☺☹", text("☺☹")), ("z", text("z"))],
    );
}

#[test]
fn multi_type_choice() {
    run_cases(
        r#"A <- "abc" / "x" "y" "z""#,
        &[("abc", text("abc")), ("xyz", list(vec![text("x"), text("y"), text("z")]))],
    );
}

#[test]
fn multi_type_sequence() {
    run_cases(
        r#"A <- ("a" "b" "c") "xyz""#,
        &[(
            "abcxyz",
            list(vec![list(vec![text("a"), text("b"), text("c")]), text("xyz")]),
        )],
    );
}

#[test]
fn identifier() {
    let grammar = indoc! {r#"
        A <- Abc "xyz"
        Abc <- "a" "b" "c"
    "#};
    run_cases(
        grammar,
        &[(
            "abcxyz",
            list(vec![list(vec![text("a"), text("b"), text("c")]), text("xyz")]),
        )],
    );
}

#[test]
fn true_predicate() {
    let grammar = indoc! {r#"
        A <- &Abc "abc"
        Abc <- "a" "b" "c"
    "#};
    run_cases(grammar, &[("abc", list(vec![Value::Bool(true), text("abc")]))]);
}

#[test]
fn false_predicate() {
    let grammar = indoc! {r#"
        A <- !Abc "xyz"
        Abc <- "a" "b" "c"
    "#};
    run_cases(grammar, &[("xyz", list(vec![Value::Bool(true), text("xyz")]))]);
}

#[test]
fn true_pred_code() {
    let grammar = indoc! {r#"
        A <- &{ true } "abc"
        Abc <- "a" "b" "c"
    "#};
    run_cases(grammar, &[("abc", list(vec![Value::Bool(true), text("abc")]))]);
}

#[test]
fn false_pred_code() {
    let grammar = indoc! {r#"
        A <- !{ false } "xyz"
        Abc <- "a" "b" "c"
    "#};
    run_cases(grammar, &[("xyz", list(vec![Value::Bool(true), text("xyz")]))]);
}

#[test]
fn failing_pred_code() {
    let compiled = tpeg::compile("action.peg", r#"A <- &{ false } "abc""#).unwrap();
    let actions = table();
    assert!(compiled.parser(&actions).parse("A", "abc").is_err());
}

#[test]
fn subexpr() {
    run_cases(r#"A <- ("a" "b" "c")"#, &[("abc", list(vec![text("a"), text("b"), text("c")]))]);
}

#[test]
fn label() {
    run_cases(
        r#"A <- l1:"a" l2:"b" l3:"c""#,
        &[("abc", list(vec![text("a"), text("b"), text("c")]))],
    );
}

#[test]
fn action() {
    let grammar = format!("A <- l1:. l2:. l3:. \"map[string]string\":{{{}}}", MAP_ACTION);
    let compiled = tpeg::compile("action.peg", &grammar).unwrap();
    let actions = table();
    let parser = compiled.parser(&actions);

    for (input, want) in [("abc", ["a", "b", "c"]), ("xyz", ["x", "y", "z"])] {
        match parser.parse("A", input).unwrap() {
            Value::Map(map) => {
                assert_eq!(map.keys().collect::<Vec<_>>(), ["1", "2", "3"]);
                for (k, v) in ["1", "2", "3"].iter().zip(want) {
                    assert_eq!(map[*k], text(v));
                }
            }
            other => panic!("expected a map, got {}", other),
        }
    }
}

#[test]
fn action_sees_only_its_alternative() {
    let grammar = r#"A <- x:"a" "b" str:{ x } / x:"a" y:"c" str:{ y }"#;
    let compiled = tpeg::compile("action.peg", grammar).unwrap();
    let actions = ActionTable::new()
        .on_action("x", |b| {
            assert_eq!(b.len(), 1);
            b["x"].clone()
        })
        .on_action("y", |b| {
            assert_eq!(b.iter().map(|(n, _)| n).collect::<Vec<_>>(), ["x", "y"]);
            b["y"].clone()
        });
    let parser = compiled.parser(&actions);
    assert_eq!(parser.parse("A", "ab").unwrap(), text("a"));
    assert_eq!(parser.parse("A", "ac").unwrap(), text("c"));
}

#[test]
fn labels_do_not_leak_out_of_rules() {
    let grammar = indoc! {r#"
        A <- x:"a" B str:{ outer }
        B <- y:"b" str:{ inner }
    "#};
    let compiled = tpeg::compile("action.peg", grammar).unwrap();
    let actions = ActionTable::new()
        .on_action("inner", |b| {
            assert!(b.get("x").is_none());
            b["y"].clone()
        })
        .on_action("outer", |b| {
            assert!(b.get("y").is_none());
            b["x"].clone()
        });
    assert_eq!(compiled.parser(&actions).parse("A", "ab").unwrap(), text("a"));
}

#[test]
fn lookahead_discards_bindings() {
    let grammar = r#"A <- &(x:"a") y:. str:{ y }"#;
    let compiled = tpeg::compile("action.peg", grammar).unwrap();
    let actions = ActionTable::new().on_action("y", |b| {
        assert!(b.get("x").is_none());
        b["y"].clone()
    });
    assert_eq!(compiled.parser(&actions).parse("A", "a").unwrap(), text("a"));
}

#[test]
fn code_predicate_sees_bindings() {
    let grammar = r#"A <- x:[a-z] &{ is_b } [0-9] / [a-z] [0-9]"#;
    let compiled = tpeg::compile("action.peg", grammar).unwrap();
    let actions = ActionTable::new().on_predicate("is_b", |b| b["x"].as_str() == Some("b"));
    let parser = compiled.parser(&actions);
    assert_eq!(
        parser.parse("A", "b1").unwrap(),
        list(vec![text("b"), Value::Bool(true), text("1")])
    );
    assert_eq!(parser.parse("A", "a1").unwrap(), list(vec![text("a"), text("1")]));
}

#[test]
fn missing_handler_yields_absent() {
    let compiled = tpeg::compile("action.peg", r#"A <- "a" str:{ nobody }"#).unwrap();
    assert_eq!(compiled.parser(()).parse("A", "a").unwrap(), Value::Absent);
    assert_eq!(compiled.parser(ActionTable::new()).parse("A", "a").unwrap(), Value::Absent);
}

#[test]
fn run_matches_a_prefix() {
    let compiled = tpeg::compile("action.peg", r#"A <- "ab""#).unwrap();
    let parser = compiled.parser(());
    assert_eq!(parser.run("A", "abc").unwrap(), tpeg::RuleResult::Matched(2, text("ab")));
    assert_eq!(parser.run("A", "x").unwrap(), tpeg::RuleResult::Failed);
    assert!(parser.parse("A", "abc").is_err());
}

#[test]
fn unknown_start_rule() {
    let compiled = tpeg::compile("action.peg", r#"A <- "ab""#).unwrap();
    let err = compiled.parser(()).parse("Nope", "ab").unwrap_err();
    assert_eq!(err, tpeg::RunError::UnknownRule("Nope".to_owned()));
    assert_eq!(err.to_string(), "no rule named `Nope`");
}
