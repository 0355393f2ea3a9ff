use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::ast::*;
use crate::diagnostic::{Diagnostic, Diagnostics};

/// Check a grammar for definition errors.
///
/// Every check runs over the whole grammar; an empty result means the grammar
/// is well formed and may be expanded.
pub fn check(grammar: &Grammar) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    let mut defs: HashMap<&str, &Item> = HashMap::new();

    for item in &grammar.items {
        let name = item.name().name.as_str();
        if defs.contains_key(name) {
            diagnostics.push(match item {
                Item::Rule(_) => Diagnostic::RuleRedefined(name.to_owned(), item.span()),
                Item::Template(t) => Diagnostic::TemplateRedefined(t.signature(), item.span()),
            });
        } else {
            defs.insert(name, item);
        }
    }

    for template in grammar.iter_templates() {
        let mut seen = Vec::new();
        for param in &template.params {
            if seen.contains(&param.name.as_str()) {
                diagnostics.push(Diagnostic::ParamRedefined(param.to_string(), param.span));
            } else {
                seen.push(param.name.as_str());
            }
        }
    }

    ExpressionVisitor::check(grammar, &defs, &mut diagnostics);

    debug!(diagnostics = diagnostics.len(), "checked grammar");
    diagnostics
}

type LabelScope<'a> = HashSet<&'a str>;

struct ExpressionVisitor<'a, 'd> {
    defs: &'a HashMap<&'a str, &'a Item>,
    params: &'a [Ident],
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> ExpressionVisitor<'a, 'd> {
    fn check(grammar: &'a Grammar, defs: &'a HashMap<&'a str, &'a Item>, diagnostics: &'d mut Diagnostics) {
        let mut visitor = ExpressionVisitor {
            defs,
            params: &[],
            diagnostics,
        };

        for item in &grammar.items {
            let expr = match item {
                Item::Rule(rule) => {
                    visitor.params = &[];
                    &rule.expr
                }
                Item::Template(template) => {
                    visitor.params = &template.params;
                    &template.expr
                }
            };
            visitor.walk_expr(expr, &mut LabelScope::new());
        }
    }

    fn is_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    fn walk_ref(&mut self, name: &Ident, args: &[RuleArg], span: codemap::Span) {
        if self.is_param(&name.name) {
            if !args.is_empty() {
                self.diagnostics.push(Diagnostic::ParamWithArgs(name.to_string(), name.span));
            }
        } else {
            match self.defs.get(name.name.as_str()) {
                None => {
                    self.diagnostics.push(Diagnostic::UndefinedRule(name.to_string(), span));
                }
                Some(Item::Rule(_)) => {
                    if !args.is_empty() {
                        self.diagnostics.push(Diagnostic::NotATemplate(name.to_string(), span));
                    }
                }
                Some(Item::Template(template)) => {
                    if template.params.len() != args.len() {
                        self.diagnostics.push(Diagnostic::ArgCountMismatch {
                            signature: template.signature(),
                            expected: template.params.len(),
                            got: args.len(),
                            span,
                        });
                    }
                }
            }
        }

        for arg in args {
            self.walk_ref(&arg.name, &arg.args, arg.span);
        }
    }

    fn walk_expr(&mut self, this_expr: &'a SpannedExpr, labels: &mut LabelScope<'a>) {
        use self::Expr::*;
        match this_expr.expr {
            Rule(ref name, ref args) => self.walk_ref(name, args, this_expr.span),

            Label(ref name, ref expr) => {
                if !labels.insert(name.name.as_str()) {
                    self.diagnostics.push(Diagnostic::LabelRedefined(name.to_string(), name.span));
                }
                self.walk_expr(expr, labels);
            }

            Sequence(ref exprs) => {
                for expr in exprs {
                    self.walk_expr(expr, labels);
                }
            }

            // Labels in sibling branches don't conflict with each other.
            Choice(ref choices) => {
                for expr in choices {
                    self.walk_expr(expr, &mut labels.clone());
                }
            }

            Action { expr: Some(ref expr), .. } => self.walk_expr(expr, labels),

            Star(ref expr)
            | Plus(ref expr)
            | Optional(ref expr)
            | Predicate(_, ref expr)
            | Group(ref expr) => self.walk_expr(expr, labels),

            Literal(_) | CharClass(_) | AnyChar | CodePredicate(..) | Action { expr: None, .. } => {}
        }
    }
}

/// Find left-recursive rules in a template-free grammar.
///
/// Every rule in a left-recursive cycle reports the cycle starting from
/// itself.
pub fn left_recursion(grammar: &Grammar) -> Diagnostics {
    let mut rules = HashMap::new();
    for rule in grammar.iter_rules() {
        rules.entry(rule.name.name.as_str()).or_insert(rule);
    }

    let mut visitor = RecursionVisitor {
        nullable: nullable_rules(&rules),
        rules: &rules,
        stack: Vec::new(),
        visited: HashSet::new(),
        errors: Vec::new(),
    };

    for rule in grammar.iter_rules() {
        visitor.visited.clear();
        visitor.walk_rule(rule);
        debug_assert!(visitor.stack.is_empty());
    }

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(visitor.errors);
    diagnostics
}

/// The rules that can match without consuming input, as a least fixpoint.
fn nullable_rules<'a>(rules: &HashMap<&'a str, &'a Rule>) -> HashSet<&'a str> {
    let mut nullable = HashSet::new();
    loop {
        let before = nullable.len();
        for (&name, rule) in rules {
            if !nullable.contains(name) && is_nullable(&rule.expr, &nullable) {
                nullable.insert(name);
            }
        }
        if nullable.len() == before {
            return nullable;
        }
    }
}

fn is_nullable(e: &SpannedExpr, nullable: &HashSet<&str>) -> bool {
    use self::Expr::*;
    match e.expr {
        Rule(ref name, _) => nullable.contains(name.name.as_str()),
        Sequence(ref elems) => elems.iter().all(|x| is_nullable(x, nullable)),
        Choice(ref choices) => choices.iter().any(|x| is_nullable(x, nullable)),
        Star(_) | Optional(_) | Predicate(..) | CodePredicate(..) | Action { expr: None, .. } => true,
        Plus(ref x) | Label(_, ref x) | Group(ref x) => is_nullable(x, nullable),
        Action { expr: Some(ref x), .. } => is_nullable(x, nullable),
        Literal(ref s) => s.is_empty(),
        CharClass(_) | AnyChar => false,
    }
}

struct RecursionVisitor<'a> {
    rules: &'a HashMap<&'a str, &'a Rule>,
    nullable: HashSet<&'a str>,
    stack: Vec<&'a str>,
    /// Rules already walked from the current root.
    visited: HashSet<&'a str>,
    errors: Vec<Diagnostic>,
}

impl<'a> RecursionVisitor<'a> {
    fn walk_rule(&mut self, rule: &'a Rule) {
        let name = rule.name.name.as_str();
        self.visited.insert(name);
        self.stack.push(name);
        self.walk_expr(&rule.expr);
        self.stack.pop();
    }

    /// Walk the parts of `this_expr` reachable before it consumes input.
    fn walk_expr(&mut self, this_expr: &'a SpannedExpr) {
        use self::Expr::*;
        match this_expr.expr {
            Rule(ref rule_ident, _) => {
                let name = rule_ident.name.as_str();

                if let Some(loop_start) = self.stack.iter().position(|caller| *caller == name) {
                    let mut recursive_loop: Vec<String> =
                        self.stack[loop_start..].iter().map(|s| s.to_string()).collect();
                    recursive_loop.push(name.to_owned());
                    let error = Diagnostic::LeftRecursion(recursive_loop, this_expr.span);
                    if !self.errors.contains(&error) {
                        self.errors.push(error);
                    }
                    return;
                }

                if self.visited.contains(name) {
                    return;
                }

                // Missing rules would have already been reported
                if let Some(rule) = self.rules.get(name) {
                    self.walk_rule(rule);
                }
            }

            Sequence(ref elems) => {
                for elem in elems {
                    self.walk_expr(elem);
                    if !is_nullable(elem, &self.nullable) {
                        break;
                    }
                }
            }

            Choice(ref choices) => {
                for expr in choices {
                    self.walk_expr(expr);
                }
            }

            Star(ref expr)
            | Optional(ref expr)
            | Predicate(_, ref expr)
            | Plus(ref expr)
            | Label(_, ref expr)
            | Group(ref expr)
            | Action { expr: Some(ref expr), .. } => self.walk_expr(expr),

            Action { expr: None, .. } | CodePredicate(..) | Literal(_) | CharClass(_) | AnyChar => {}
        }
    }
}
