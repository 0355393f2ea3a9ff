use codemap::{CodeMap, Span};
use codemap_diagnostic::{ColorConfig, Emitter, Level, SpanLabel, SpanStyle};
use std::fmt::Write;

/// An error found in a grammar definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    RuleRedefined(String, Span),
    /// Template signature (`A<x>`) and the redefining template's span.
    TemplateRedefined(String, Span),
    UndefinedRule(String, Span),
    ParamRedefined(String, Span),
    ArgCountMismatch {
        signature: String,
        expected: usize,
        got: usize,
        span: Span,
    },
    NotATemplate(String, Span),
    ParamWithArgs(String, Span),
    LabelRedefined(String, Span),
    LeftRecursion(Vec<String>, Span),
}

impl Diagnostic {
    pub fn primary_span(&self) -> Span {
        use self::Diagnostic::*;
        match *self {
            RuleRedefined(_, span)
            | TemplateRedefined(_, span)
            | UndefinedRule(_, span)
            | ParamRedefined(_, span)
            | NotATemplate(_, span)
            | ParamWithArgs(_, span)
            | LabelRedefined(_, span)
            | LeftRecursion(_, span) => span,
            ArgCountMismatch { span, .. } => span,
        }
    }

    pub fn msg(&self) -> String {
        use self::Diagnostic::*;
        match self {
            RuleRedefined(name, _) => format!("rule {} redefined", name),
            TemplateRedefined(signature, _) => format!("template {} redefined", signature),
            UndefinedRule(name, _) => format!("rule {} undefined", name),
            ParamRedefined(name, _) => format!("parameter {} redefined", name),
            ArgCountMismatch {
                signature,
                expected,
                got,
                ..
            } => format!(
                "template {} argument count mismatch: got {}, expected {}",
                signature, got, expected
            ),
            NotATemplate(name, _) => format!("rule {} is not a template", name),
            ParamWithArgs(name, _) => format!("parameter {} does not take arguments", name),
            LabelRedefined(name, _) => format!("label {} redefined", name),
            LeftRecursion(path, _) => format!(
                "left recursive rules create an infinite loop: {}",
                path.join(" -> ")
            ),
        }
    }

    fn to_codemap_diagnostic(&self) -> codemap_diagnostic::Diagnostic {
        codemap_diagnostic::Diagnostic {
            level: Level::Error,
            message: self.msg(),
            code: None,
            spans: vec![SpanLabel {
                span: self.primary_span(),
                label: None,
                style: SpanStyle::Primary,
            }],
        }
    }
}

/// Diagnostics collected over a whole grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.list.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.list.iter()
    }

    /// The diagnostics ordered by start line, then start column.
    pub fn sorted(&self, codemap: &CodeMap) -> Vec<&Diagnostic> {
        let mut sorted: Vec<&Diagnostic> = self.list.iter().collect();
        sorted.sort_by_key(|d| {
            let begin = codemap.look_up_span(d.primary_span()).begin;
            (begin.line, begin.column)
        });
        sorted
    }

    /// Render as `<source>:<line>.<col>,<line>.<col>: <message>` lines, sorted by
    /// position. Lines and columns are 1-based; the end column is exclusive.
    pub fn render(&self, codemap: &CodeMap) -> String {
        let mut out = String::new();
        for (i, d) in self.sorted(codemap).into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let loc = codemap.look_up_span(d.primary_span());
            // Writing to a String cannot fail.
            let _ = write!(
                out,
                "{}:{}.{},{}.{}: {}",
                loc.file.name(),
                loc.begin.line + 1,
                loc.begin.column + 1,
                loc.end.line + 1,
                loc.end.column + 1,
                d.msg()
            );
        }
        out
    }

    /// Pretty-print the diagnostics with source excerpts to stderr.
    pub fn emit(&self, codemap: &CodeMap) {
        if !self.list.is_empty() {
            let diagnostics: Vec<_> = self
                .sorted(codemap)
                .into_iter()
                .map(Diagnostic::to_codemap_diagnostic)
                .collect();
            let mut emitter = Emitter::stderr(ColorConfig::Auto, Some(codemap));
            emitter.emit(&diagnostics);
        }
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.list.extend(iter)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}
