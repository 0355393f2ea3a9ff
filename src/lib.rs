//! `tpeg` compiles parsing expression grammars with rule templates.
//!
//! A grammar is checked for definition errors, its template instantiations
//! are expanded into ordinary rules, and every expression is assigned the
//! shape of the value it produces. The expanded grammar can then be handed to
//! a code generator, or run directly against input with a packrat parser that
//! evaluates actions through a table of callbacks.
//!
//! ```
//! use tpeg::{ActionTable, Value};
//!
//! let grammar = tpeg::compile("list.peg", r#"
//!     List <- first:Item rest:("," i:Item str:{ item })* list:{ collect }
//!     Item <- [a-z]+
//! "#).unwrap();
//!
//! let actions = ActionTable::new()
//!     .on_action("item", |b| b["i"].clone())
//!     .on_action("collect", |b| {
//!         let mut items = vec![b["first"].clone()];
//!         items.extend(b["rest"].items().iter().cloned());
//!         Value::list(items)
//!     });
//!
//! let value = grammar.parser(&actions).parse("List", "ab,c").unwrap();
//! assert_eq!(value.to_string(), r#"[["a", "b"], ["c"]]"#);
//! ```
//!
//! ## Grammar syntax
//!
//! ```text
//! { prelude }              code handed to generators verbatim
//! Name <- e                a rule
//! Name<a, b> <- e          a template with parameters `a` and `b`
//! # text                   a comment, to the end of the line
//! ```
//!
//! ### Expressions
//!
//!   * `"literal"` / `'literal'` - match a literal string. The value is the
//!     matched text.
//!   * `[a-z]`, `[^0-9]` - match one character in (or not in) a set. The
//!     value is the matched character as text.
//!   * `.` - match any single character.
//!   * `rule` - match another rule; its value is the rule's value.
//!   * `template<a, b>` - match an instantiation of a template. Arguments are
//!     rule names, template parameters, or instantiations themselves.
//!   * `e1 e2 e3` - match expressions in sequence. The value is the list of
//!     the element values.
//!   * `e1 / e2 / e3` - try each alternative in order and use the first that
//!     matches.
//!   * `e*` - match zero or more repetitions; the value is a list, or absent
//!     when nothing matched.
//!   * `e+` - match one or more repetitions; the value is a list.
//!   * `e?` - match zero or one; the value is absent when nothing matched.
//!   * `&e` / `!e` - positive and negative lookahead. Consumes no input; the
//!     value is `true`.
//!   * `&{ code }` / `!{ code }` - a predicate evaluated by user code over the
//!     labels bound so far.
//!   * `name:e` - bind the value of `e` to `name` for the actions of the
//!     enclosing alternative.
//!   * `e Type:{ code }` - match `e`, then compute the value with user code.
//!     `Type` (an identifier or a string literal) names the result type for
//!     code generators.
//!   * `( e )` - grouping.
//!
//! Left-recursive rules are rejected at compile time.
//!
//! ## Tracing
//!
//! With the `trace` feature enabled the parser logs every rule it attempts,
//! matches, fails or answers from its cache at `tracing`'s trace level,
//! prefixed with `[PEG_TRACE]`.

pub use tpeg_compiler::{
    actions, analysis, ast, compile, diagnostic, exec, expand, shape, ActionCall, ActionTable,
    Actions, CompileError, Compiled, Compiler, Diagnostic, Diagnostics, Parser, RunError, Scalar,
    Shape, ShapedGrammar,
};
pub use tpeg_runtime::{error, str, Bindings, Parse, ParseElem, ParseLiteral, RuleResult, Value};
