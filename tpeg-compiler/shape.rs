//! Value-shape inference.
//!
//! Assigns every expression of a template-free grammar the shape of the value
//! it produces, so that a statically typed evaluator can be generated for it.

use std::collections::HashMap;
use std::fmt;
use tpeg_runtime::Value;
use tracing::debug;

use crate::ast::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// Matched text.
    Text,
    Bool,
    /// A type named by an action; opaque to the compiler.
    Declared(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar(Scalar),
    List(Box<Shape>),
    Optional(Box<Shape>),
    /// Any of the known shapes, decided at runtime.
    Dynamic,
}

impl Shape {
    pub fn text() -> Shape {
        Shape::Scalar(Scalar::Text)
    }

    pub fn bool() -> Shape {
        Shape::Scalar(Scalar::Bool)
    }

    pub fn list(elem: Shape) -> Shape {
        Shape::List(Box::new(elem))
    }

    /// `elem` made optional. Optionals don't nest: absence is absence.
    pub fn optional(elem: Shape) -> Shape {
        match elem {
            Shape::Optional(_) => elem,
            _ => Shape::Optional(Box::new(elem)),
        }
    }

    /// The shape shared by all of `shapes`, or `Dynamic` if they differ.
    fn common(mut shapes: impl Iterator<Item = Shape>) -> Shape {
        match shapes.next() {
            Some(first) => {
                if shapes.all(|s| s == first) {
                    first
                } else {
                    Shape::Dynamic
                }
            }
            None => Shape::Dynamic,
        }
    }

    /// Whether a runtime value is consistent with this shape.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (Shape::Dynamic, _) | (Shape::Scalar(Scalar::Declared(_)), _) => true,
            (Shape::Scalar(Scalar::Text), Value::Text(_)) => true,
            (Shape::Scalar(Scalar::Bool), Value::Bool(_)) => true,
            (Shape::List(elem), Value::List(items)) => items.iter().all(|v| elem.admits(v)),
            (Shape::Optional(_), Value::Absent) => true,
            (Shape::Optional(elem), v) => elem.admits(v),
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Shape::Scalar(Scalar::Text) => write!(f, "text"),
            Shape::Scalar(Scalar::Bool) => write!(f, "bool"),
            Shape::Scalar(Scalar::Declared(ty)) => write!(f, "{}", ty),
            Shape::List(elem) => write!(f, "[{}]", elem),
            Shape::Optional(elem) => write!(f, "{}?", elem),
            Shape::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// An expression annotated with its shape, mirroring the expression tree.
#[derive(Debug)]
pub struct ShapedExpr<'g> {
    pub expr: &'g SpannedExpr,
    pub shape: Shape,
    pub children: Vec<ShapedExpr<'g>>,
}

#[derive(Debug)]
pub struct ShapedRule<'g> {
    pub rule: &'g Rule,
    pub shape: Shape,
    pub body: ShapedExpr<'g>,
}

/// A template-free grammar with a shape for every rule and expression.
#[derive(Debug)]
pub struct ShapedGrammar<'g> {
    pub rules: Vec<ShapedRule<'g>>,
}

impl<'g> ShapedGrammar<'g> {
    pub fn rule(&self, name: &str) -> Option<&ShapedRule<'g>> {
        self.rules.iter().find(|r| r.rule.name.name == name)
    }

    pub fn shape_of(&self, name: &str) -> Option<&Shape> {
        self.rule(name).map(|r| &r.shape)
    }
}

/// Infer shapes for an expanded grammar.
///
/// Rules in a reference cycle are shaped with the cycle's references taken as
/// `Dynamic`. Every reference in the resulting trees carries the shape of the
/// rule it names.
pub fn infer(grammar: &Grammar) -> ShapedGrammar<'_> {
    let rules: Vec<&Rule> = grammar.iter_rules().collect();
    let mut index = HashMap::new();
    for (i, rule) in rules.iter().enumerate() {
        index.entry(rule.name.name.as_str()).or_insert(i);
    }
    let component = components(&rules, &index);

    let mut inferer = Inferer {
        shapes: vec![None; rules.len()],
        rules,
        index,
        component,
    };

    let shaped = (0..inferer.rules.len())
        .map(|i| {
            let rule = inferer.rules[i];
            let shape = inferer.rule_shape(i);
            let body = inferer.walk(&rule.expr, None);
            debug!(rule = %rule.name, shape = %shape, "inferred rule shape");
            ShapedRule { rule, shape, body }
        })
        .collect();

    ShapedGrammar { rules: shaped }
}

fn references<'g>(e: &'g SpannedExpr, out: &mut Vec<&'g str>) {
    use self::Expr::*;
    match e.expr {
        Rule(ref name, _) => out.push(&name.name),
        Sequence(ref exprs) | Choice(ref exprs) => {
            for x in exprs {
                references(x, out);
            }
        }
        Star(ref x) | Plus(ref x) | Optional(ref x) | Predicate(_, ref x) | Label(_, ref x) | Group(ref x) => {
            references(x, out)
        }
        Action { expr: Some(ref x), .. } => references(x, out),
        Literal(_) | CharClass(_) | AnyChar | CodePredicate(..) | Action { expr: None, .. } => {}
    }
}

/// The strongly connected component of each rule in the reference graph.
fn components(rules: &[&Rule], index: &HashMap<&str, usize>) -> Vec<usize> {
    let edges: Vec<Vec<usize>> = rules
        .iter()
        .map(|rule| {
            let mut names = Vec::new();
            references(&rule.expr, &mut names);
            names.into_iter().filter_map(|n| index.get(n).copied()).collect()
        })
        .collect();

    let mut tarjan = Tarjan {
        edges: &edges,
        order: vec![None; rules.len()],
        low: vec![0; rules.len()],
        stack: Vec::new(),
        on_stack: vec![false; rules.len()],
        component: vec![0; rules.len()],
        visited: 0,
        components: 0,
    };
    for v in 0..rules.len() {
        if tarjan.order[v].is_none() {
            tarjan.visit(v);
        }
    }
    tarjan.component
}

struct Tarjan<'a> {
    edges: &'a [Vec<usize>],
    order: Vec<Option<usize>>,
    low: Vec<usize>,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    component: Vec<usize>,
    visited: usize,
    components: usize,
}

impl Tarjan<'_> {
    fn visit(&mut self, v: usize) {
        self.order[v] = Some(self.visited);
        self.low[v] = self.visited;
        self.visited += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let edges = self.edges;
        for &w in &edges[v] {
            match self.order[w] {
                None => {
                    self.visit(w);
                    self.low[v] = self.low[v].min(self.low[w]);
                }
                Some(order) if self.on_stack[w] => self.low[v] = self.low[v].min(order),
                Some(_) => {}
            }
        }

        if self.order[v] == Some(self.low[v]) {
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                self.component[w] = self.components;
                if w == v {
                    break;
                }
            }
            self.components += 1;
        }
    }
}

struct Inferer<'g> {
    rules: Vec<&'g Rule>,
    index: HashMap<&'g str, usize>,
    component: Vec<usize>,
    shapes: Vec<Option<Shape>>,
}

impl<'g> Inferer<'g> {
    fn rule_shape(&mut self, i: usize) -> Shape {
        if let Some(ref shape) = self.shapes[i] {
            return shape.clone();
        }
        let rule = self.rules[i];
        let shape = self.walk(&rule.expr, Some(self.component[i])).shape;
        self.shapes[i] = Some(shape.clone());
        shape
    }

    /// Shape `e`. While a rule of component `within` is being shaped,
    /// references into that component are `Dynamic`.
    fn walk(&mut self, e: &'g SpannedExpr, within: Option<usize>) -> ShapedExpr<'g> {
        use self::Expr::*;
        let (shape, children) = match e.expr {
            Literal(_) | CharClass(_) | AnyChar => (Shape::text(), vec![]),

            Rule(ref name, _) => {
                let i = match self.index.get(name.name.as_str()) {
                    Some(&i) => i,
                    None => unreachable!("reference to undefined rule `{}`", name),
                };
                if within == Some(self.component[i]) {
                    (Shape::Dynamic, vec![])
                } else {
                    (self.rule_shape(i), vec![])
                }
            }

            Sequence(ref exprs) => {
                let children: Vec<_> = exprs.iter().map(|x| self.walk(x, within)).collect();
                let elem = Shape::common(children.iter().map(|c| c.shape.clone()));
                (Shape::list(elem), children)
            }

            Choice(ref exprs) => {
                let children: Vec<_> = exprs.iter().map(|x| self.walk(x, within)).collect();
                (Shape::common(children.iter().map(|c| c.shape.clone())), children)
            }

            Star(ref inner) => {
                let inner = self.walk(inner, within);
                (Shape::optional(Shape::list(inner.shape.clone())), vec![inner])
            }

            Plus(ref inner) => {
                let inner = self.walk(inner, within);
                (Shape::list(inner.shape.clone()), vec![inner])
            }

            Optional(ref inner) => {
                let inner = self.walk(inner, within);
                (Shape::optional(inner.shape.clone()), vec![inner])
            }

            Predicate(_, ref inner) => (Shape::bool(), vec![self.walk(inner, within)]),

            CodePredicate(..) => (Shape::bool(), vec![]),

            Label(_, ref inner) | Group(ref inner) => {
                let inner = self.walk(inner, within);
                (inner.shape.clone(), vec![inner])
            }

            Action { ref hint, ref expr, .. } => {
                let children = expr.iter().map(|x| self.walk(x, within)).collect();
                (Shape::Scalar(Scalar::Declared(hint.clone())), children)
            }
        };

        ShapedExpr {
            expr: e,
            shape,
            children,
        }
    }
}
