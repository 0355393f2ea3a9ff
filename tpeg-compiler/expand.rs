//! Monomorphization of template rules.
//!
//! Every instantiation site `T<A, B>` is replaced by a reference to a
//! specialized rule named `T<A, B>` whose body is the template body with each
//! parameter reference replaced by the corresponding argument. Specializations
//! are cached by (template, resolved arguments), so instantiating the same
//! template with the same arguments always refers to the same rule, and
//! recursive templates terminate once their argument lists repeat.

use std::collections::HashMap;
use tracing::debug;

use crate::ast::*;

/// Parameter bindings in effect while rewriting a template body.
struct LexicalContext<'a> {
    defs: HashMap<&'a str, String>,
}

impl<'a> LexicalContext<'a> {
    fn new() -> LexicalContext<'a> {
        LexicalContext {
            defs: HashMap::new(),
        }
    }
}

struct Expander<'a> {
    templates: HashMap<&'a str, &'a Template>,
    instances: HashMap<(String, Vec<String>), usize>,
    /// Specialized rules in first-instantiation order; a slot is `None` while
    /// its body is being built.
    specialized: Vec<Option<Rule>>,
}

/// Expand all template instantiations in a checked grammar, producing a new
/// template-free grammar.
///
/// The grammar must have passed [`check`](crate::analysis::check).
pub fn expand(grammar: &Grammar) -> Grammar {
    let mut expander = Expander {
        templates: grammar.iter_templates().map(|t| (t.name.name.as_str(), t)).collect(),
        instances: HashMap::new(),
        specialized: Vec::new(),
    };

    let lx = LexicalContext::new();
    let mut items: Vec<Item> = grammar
        .iter_rules()
        .map(|rule| {
            Item::Rule(Rule {
                span: rule.span,
                name: rule.name.clone(),
                expr: expander.expand_expr(&rule.expr, &lx),
            })
        })
        .collect();

    debug!(instantiations = expander.specialized.len(), "expanded templates");

    items.extend(expander.specialized.into_iter().flatten().map(Item::Rule));

    Grammar {
        prelude: grammar.prelude.clone(),
        items,
    }
}

impl<'a> Expander<'a> {
    /// Resolve a reference to the name of the concrete rule it denotes,
    /// instantiating templates as needed.
    fn resolve(&mut self, name: &Ident, args: &[RuleArg], lx: &LexicalContext) -> String {
        if args.is_empty() {
            return match lx.defs.get(name.name.as_str()) {
                Some(arg) => arg.clone(),
                None => name.name.clone(),
            };
        }

        let args: Vec<String> = args
            .iter()
            .map(|arg| self.resolve(&arg.name, &arg.args, lx))
            .collect();

        let template = match self.templates.get(name.name.as_str()) {
            Some(template) => *template,
            None => unreachable!("instantiation of undefined template `{}`", name),
        };
        self.instantiate(template, args)
    }

    fn instantiate(&mut self, template: &'a Template, args: Vec<String>) -> String {
        let name = format!("{}<{}>", template.name, args.join(", "));
        let key = (template.name.name.clone(), args);
        if self.instances.contains_key(&key) {
            return name;
        }

        let slot = self.specialized.len();
        self.specialized.push(None);
        self.instances.insert(key.clone(), slot);

        let lx = LexicalContext {
            defs: template
                .params
                .iter()
                .map(|param| param.name.as_str())
                .zip(key.1)
                .collect(),
        };
        let expr = self.expand_expr(&template.expr, &lx);

        self.specialized[slot] = Some(Rule {
            span: template.span,
            name: Ident::new(name.clone(), template.name.span),
            expr,
        });
        name
    }

    fn expand_boxed(&mut self, e: &SpannedExpr, lx: &LexicalContext) -> Box<SpannedExpr> {
        Box::new(self.expand_expr(e, lx))
    }

    fn expand_expr(&mut self, e: &SpannedExpr, lx: &LexicalContext) -> SpannedExpr {
        let expr = match e.expr {
            Expr::Rule(ref name, ref args) => {
                let resolved = self.resolve(name, args, lx);
                Expr::Rule(Ident::new(resolved, name.span), Vec::new())
            }
            Expr::Sequence(ref exprs) => {
                Expr::Sequence(exprs.iter().map(|x| self.expand_expr(x, lx)).collect())
            }
            Expr::Choice(ref exprs) => {
                Expr::Choice(exprs.iter().map(|x| self.expand_expr(x, lx)).collect())
            }
            Expr::Star(ref inner) => Expr::Star(self.expand_boxed(inner, lx)),
            Expr::Plus(ref inner) => Expr::Plus(self.expand_boxed(inner, lx)),
            Expr::Optional(ref inner) => Expr::Optional(self.expand_boxed(inner, lx)),
            Expr::Group(ref inner) => Expr::Group(self.expand_boxed(inner, lx)),
            Expr::Predicate(kind, ref inner) => Expr::Predicate(kind, self.expand_boxed(inner, lx)),
            Expr::Label(ref name, ref inner) => Expr::Label(name.clone(), self.expand_boxed(inner, lx)),
            Expr::Action {
                ref hint,
                ref code,
                ref expr,
            } => Expr::Action {
                hint: hint.clone(),
                code: code.clone(),
                expr: expr.as_ref().map(|inner| self.expand_boxed(inner, lx)),
            },
            Expr::Literal(_) | Expr::CharClass(_) | Expr::AnyChar | Expr::CodePredicate(..) => {
                e.expr.clone()
            }
        };

        expr.at(e.span)
    }
}
