use indoc::indoc;
use tpeg::{ActionTable, Compiled, Value};

// Operators associate to the right.
const CALCULATOR: &str = indoc! {r#"
    A <- Expr
    Expr <- l:Term op:(Plus / Minus) r:Expr int:{ return op(l, r) } / x:Term int:{ return x }
    Plus <- "+" "func(int, int) int":{ return func(a, b int) int { return a + b } }
    Minus <- "-" "func(int, int) int":{ return func(a, b int) int { return a - b } }
    Term <- l:Factor op:(Times / Divide) r:Term int:{ return op(l, r) } / x:Factor int:{ return x }
    Times <- "*" "func(int, int) int":{ return func(a, b int) int { return a * b } }
    Divide <- "/" "func(int, int) int":{ return func(a, b int) int { return a / b } }
    Factor <- Number / '(' x:Expr ')' int:{ return x }
    Number <- x:[0-9]+ int:{ var i int; for _, s := range x { i = i * 10 + (int(s[0]) - '0') }; return i }
"#};

fn calculator_actions() -> ActionTable {
    ActionTable::new()
        .on_action("return func(a, b int) int { return a + b }", |_| Value::from("+"))
        .on_action("return func(a, b int) int { return a - b }", |_| Value::from("-"))
        .on_action("return func(a, b int) int { return a * b }", |_| Value::from("*"))
        .on_action("return func(a, b int) int { return a / b }", |_| Value::from("/"))
        .on_action("return op(l, r)", |b| {
            let (l, r) = (b["l"].as_int().unwrap(), b["r"].as_int().unwrap());
            Value::Int(match b["op"].as_str().unwrap() {
                "+" => l + r,
                "-" => l - r,
                "*" => l * r,
                "/" => l / r,
                op => panic!("unknown operator {}", op),
            })
        })
        .on_action("return x", |b| b["x"].clone())
        .on_action(
            "var i int; for _, s := range x { i = i * 10 + (int(s[0]) - '0') }; return i",
            |b| {
                let digits: String = b["x"].items().iter().filter_map(Value::as_str).collect();
                Value::Int(digits.parse().unwrap())
            },
        )
}

fn calculator() -> Compiled {
    // Surfaces `[PEG_TRACE]` output when built with `--features trace`.
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
    tpeg::compile("calculator.peg", CALCULATOR).unwrap()
}

#[test]
fn evaluates_expressions() {
    let compiled = calculator();
    let actions = calculator_actions();
    let parser = compiled.parser(&actions);

    for (input, want) in [
        ("1", 1),
        ("(5)", 5),
        ("2*3", 6),
        ("2+3", 5),
        ("10-3*2", 4),
        ("10-(6/2)*5", -5),
    ] {
        assert_eq!(parser.parse("A", input).unwrap(), Value::Int(want), "{}", input);
    }
}

#[test]
fn right_associative() {
    let compiled = calculator();
    let actions = calculator_actions();
    // 10-(4-3)
    assert_eq!(compiled.parser(&actions).parse("A", "10-4-3").unwrap(), Value::Int(9));
}

#[test]
fn shapes_follow_declared_types() {
    let compiled = calculator();
    let shapes = compiled.shapes();
    assert_eq!(shapes.shape_of("Expr").unwrap().to_string(), "int");
    assert_eq!(shapes.shape_of("A").unwrap().to_string(), "int");
    assert_eq!(shapes.shape_of("Plus").unwrap().to_string(), "func(int, int) int");
    assert_eq!(shapes.shape_of("Factor").unwrap().to_string(), "int");
}

#[test]
fn reports_furthest_error() {
    let compiled = calculator();
    let actions = calculator_actions();
    let err = compiled.parser(&actions).parse("A", "2*(3+").unwrap_err();
    assert_eq!(err.to_string(), r#"error at 1:6: expected one of "(", [0-9]"#);
}
