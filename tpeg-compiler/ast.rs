use codemap::Span;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Grammar {
    /// Opaque code block preceding the rules, passed through to backends.
    pub prelude: Option<Code>,
    pub items: Vec<Item>,
}

impl Grammar {
    pub fn iter_rules(&self) -> impl Iterator<Item = &Rule> {
        self.items.iter().filter_map(|item| match item {
            Item::Rule(r) => Some(r),
            _ => None,
        })
    }

    pub fn iter_templates(&self) -> impl Iterator<Item = &Template> {
        self.items.iter().filter_map(|item| match item {
            Item::Template(t) => Some(t),
            _ => None,
        })
    }

    pub fn find_rule(&self, name: &str) -> Option<&Rule> {
        self.iter_rules().find(|r| r.name.name == name)
    }

    pub fn find_template(&self, name: &str) -> Option<&Template> {
        self.iter_templates().find(|t| t.name.name == name)
    }
}

#[derive(Debug, Clone)]
pub enum Item {
    Rule(Rule),
    Template(Template),
}

impl Item {
    pub fn name(&self) -> &Ident {
        match self {
            Item::Rule(r) => &r.name,
            Item::Template(t) => &t.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Item::Rule(r) => r.span,
            Item::Template(t) => t.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub span: Span,
    pub name: Ident,
    pub expr: SpannedExpr,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub span: Span,
    pub name: Ident,
    pub params: Vec<Ident>,
    pub expr: SpannedExpr,
}

impl Template {
    /// The template's name with its parameter list, e.g. `A<x, y>`.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        format!("{}<{}>", self.name, params.join(", "))
    }
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Ident {
        Ident {
            name: name.into(),
            span,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// User code attached to an action or a predicate. Never interpreted here.
#[derive(Debug, Clone)]
pub struct Code {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SpannedExpr {
    pub span: Span,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(String),
    CharClass(CharClass),
    AnyChar,
    /// A rule reference, a template instantiation (non-empty args), or inside a
    /// template body a parameter.
    Rule(Ident, Vec<RuleArg>),
    Sequence(Vec<SpannedExpr>),
    Choice(Vec<SpannedExpr>),
    Star(Box<SpannedExpr>),
    Plus(Box<SpannedExpr>),
    Optional(Box<SpannedExpr>),
    Predicate(PredicateKind, Box<SpannedExpr>),
    CodePredicate(PredicateKind, Code),
    Label(Ident, Box<SpannedExpr>),
    Action {
        hint: String,
        code: Code,
        expr: Option<Box<SpannedExpr>>,
    },
    Group(Box<SpannedExpr>),
}

impl Expr {
    pub fn at(self, sp: Span) -> SpannedExpr {
        SpannedExpr {
            expr: self,
            span: sp,
        }
    }
}

/// A template argument: a rule name, possibly an instantiation itself.
#[derive(Debug, Clone)]
pub struct RuleArg {
    pub span: Span,
    pub name: Ident,
    pub args: Vec<RuleArg>,
}

impl fmt::Display for RuleArg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub negated: bool,
    pub ranges: Vec<(char, char)>,
}

impl CharClass {
    pub fn matches(&self, c: char) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi) != self.negated
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        if self.negated {
            write!(f, "^")?;
        }
        for &(lo, hi) in &self.ranges {
            if lo == hi {
                write!(f, "{}", lo.escape_debug())?;
            } else {
                write!(f, "{}-{}", lo.escape_debug(), hi.escape_debug())?;
            }
        }
        write!(f, "]")
    }
}
