//! Parser for grammar source text.

use crate::ast::*;
use codemap::Span;

fn span(file: Span, lo: usize, hi: usize) -> Span {
    file.subspan(lo as u64, hi as u64)
}

/// Collapse a one-element sequence or choice to its only element.
fn flatten(mut exprs: Vec<SpannedExpr>, sp: Span, wrap: fn(Vec<SpannedExpr>) -> Expr) -> SpannedExpr {
    if exprs.len() == 1 {
        exprs.remove(0)
    } else {
        wrap(exprs).at(sp)
    }
}

fn hex_char(digits: &str) -> Result<char, &'static str> {
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or("valid character code")
}

peg::parser! { pub grammar peggy(file: Span) for str {
    pub rule grammar() -> Grammar
        = _ prelude:(c:code() _ { c })? items:(i:item() _ { i })* {
            Grammar { prelude, items }
        }

    rule item() -> Item
        = s:position!() name:ident() params:(_ "<" _ p:(ident() ++ (_ "," _)) _ ">" { p })?
          _ "<-" _ expr:expr() e:position!() {
            let span = span(file, s, e);
            match params {
                Some(params) => Item::Template(Template { span, name, params, expr }),
                None => Item::Rule(Rule { span, name, expr }),
            }
        }

    rule expr() -> SpannedExpr
        = s:position!() alts:(act_expr() ++ (_ "/" _)) e:position!() {
            flatten(alts, span(file, s, e), Expr::Choice)
        }

    rule act_expr() -> SpannedExpr
        = s:position!() seq:seq_expr() act:(_ h:action_type() ":" _ c:code() { (h, c) })? e:position!() {
            match act {
                Some((hint, code)) => Expr::Action { hint, code, expr: Some(Box::new(seq)) }.at(span(file, s, e)),
                None => seq,
            }
        }
        / s:position!() hint:action_type() ":" _ code:code() e:position!() {
            Expr::Action { hint, code, expr: None }.at(span(file, s, e))
        }

    rule action_type() -> String
        = i:ident() { i.name }
        / string_literal()

    rule seq_expr() -> SpannedExpr
        = s:position!() items:(label_expr() ++ _) e:position!() {
            flatten(items, span(file, s, e), Expr::Sequence)
        }

    rule label_expr() -> SpannedExpr
        = s:position!() l:ident() ":" !(_ "{") _ inner:pred_expr() e:position!() {
            Expr::Label(l, Box::new(inner)).at(span(file, s, e))
        }
        / pred_expr()

    rule pred_expr() -> SpannedExpr
        = s:position!() "&" _ x:rep_expr() e:position!() {
            Expr::Predicate(PredicateKind::Positive, Box::new(x)).at(span(file, s, e))
        }
        / s:position!() "!" _ x:rep_expr() e:position!() {
            Expr::Predicate(PredicateKind::Negative, Box::new(x)).at(span(file, s, e))
        }
        / rep_expr()

    rule rep_expr() -> SpannedExpr
        = s:position!() x:operand() ops:(o:rep_op() e:position!() { (o, e) })* {
            ops.into_iter().fold(x, |inner, (op, e)| {
                let inner = Box::new(inner);
                match op {
                    '*' => Expr::Star(inner),
                    '+' => Expr::Plus(inner),
                    _ => Expr::Optional(inner),
                }.at(span(file, s, e))
            })
        }

    rule rep_op() -> char
        = "*" { '*' } / "+" { '+' } / "?" { '?' }

    rule operand() -> SpannedExpr
        = s:position!() "(" _ x:expr() _ ")" e:position!() {
            Expr::Group(Box::new(x)).at(span(file, s, e))
        }
        / s:position!() "&" _ c:code() e:position!() {
            Expr::CodePredicate(PredicateKind::Positive, c).at(span(file, s, e))
        }
        / s:position!() "!" _ c:code() e:position!() {
            Expr::CodePredicate(PredicateKind::Negative, c).at(span(file, s, e))
        }
        / r:rule_arg() !(_ "<-") !":" {
            Expr::Rule(r.name, r.args).at(r.span)
        }
        / s:position!() l:string_literal() !":" e:position!() {
            Expr::Literal(l).at(span(file, s, e))
        }
        / s:position!() c:char_class() e:position!() {
            Expr::CharClass(c).at(span(file, s, e))
        }
        / s:position!() "." e:position!() {
            Expr::AnyChar.at(span(file, s, e))
        }

    // An instantiation's span ends with its last argument.
    rule rule_arg() -> RuleArg
        = s:position!() name:ident() ne:position!() targs:template_args()? {
            let (args, e) = targs.unwrap_or((Vec::new(), ne));
            RuleArg { span: span(file, s, e), name, args }
        }

    rule template_args() -> (Vec<RuleArg>, usize)
        = "<" _ args:(rule_arg() ++ (_ "," _)) e:position!() _ ">" { (args, e) }

    rule ident() -> Ident
        = s:position!() n:$([c if c.is_alphabetic() || c == '_'] [c if c.is_alphanumeric() || c == '_']*) e:position!() {
            Ident::new(n, span(file, s, e))
        }

    rule code() -> Code
        = s:position!() "{" text:$(code_body()) "}" e:position!() {
            Code { text: text.to_owned(), span: span(file, s, e) }
        }

    rule code_body()
        = ("{" code_body() "}" / [^ '{' | '}'])*

    rule string_literal() -> String
        = "\"" s:(!"\"" c:lit_char() { c })* "\"" { s.into_iter().collect() }
        / "'" s:(!"'" c:lit_char() { c })* "'" { s.into_iter().collect() }

    rule lit_char() -> char
        = "\\" c:escape() { c }
        / !['\n'] c:[_] { c }

    rule escape() -> char
        = "n" { '\n' } / "t" { '\t' } / "r" { '\r' } / "0" { '\0' }
        / "\\" { '\\' } / "\"" { '"' } / "'" { '\'' }
        / "]" { ']' } / "-" { '-' } / "^" { '^' }
        / "x" h:$(['0'..='9' | 'a'..='f' | 'A'..='F']*<2>) {? hex_char(h) }
        / "u{" h:$(['0'..='9' | 'a'..='f' | 'A'..='F']*<1,6>) "}" {? hex_char(h) }

    rule char_class() -> CharClass
        = "[" neg:"^"? ranges:class_range()* "]" {
            CharClass { negated: neg.is_some(), ranges }
        }

    rule class_range() -> (char, char)
        = lo:class_char() "-" hi:class_char() {?
            if lo <= hi { Ok((lo, hi)) } else { Err("ascending character range") }
        }
        / c:class_char() { (c, c) }

    rule class_char() -> char
        = "\\" c:escape() { c }
        / !['\n' | ']'] c:[_] { c }

    rule _ = quiet!{ ([' ' | '\t' | '\r' | '\n'] / comment())* }

    rule comment() = "#" (!['\n'] [_])*
}}
