//! Compiler for tpeg grammars: PEG with templates and labelled actions.
//!
//! Grammar text is parsed, checked for definition errors, expanded into a
//! template-free grammar and checked for left recursion. The result can be
//! handed to a code generator together with its inferred [value
//! shapes](shape), or run directly with [`Compiled::parser`].

use codemap::CodeMap;
use thiserror::Error;
use tracing::debug;

pub mod actions;
pub mod analysis;
pub mod ast;
pub mod diagnostic;
pub mod exec;
pub mod expand;
mod grammar;
pub mod shape;

#[cfg(test)]
mod test;

pub use actions::{ActionCall, ActionTable, Actions};
pub use diagnostic::{Diagnostic, Diagnostics};
pub use exec::{Parser, RunError};
pub use shape::{Scalar, Shape, ShapedGrammar};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("error parsing {source_name}: {error}")]
    Syntax {
        source_name: String,
        error: peg::error::ParseError<peg::str::LineCol>,
    },

    /// The grammar parsed but is not well formed. `rendered` holds one
    /// `<source>:<line>.<col>,<line>.<col>: <message>` line per diagnostic.
    #[error("{rendered}")]
    Invalid {
        rendered: String,
        diagnostics: Diagnostics,
    },
}

impl CompileError {
    /// The diagnostics of an invalid grammar; empty for syntax errors.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            CompileError::Invalid { diagnostics, .. } => Some(diagnostics),
            CompileError::Syntax { .. } => None,
        }
    }
}

/// Grammar compilation options.
#[derive(Debug, Clone)]
pub struct Compiler {
    source_name: String,
    emit_diagnostics: bool,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler {
            source_name: "grammar.peg".to_owned(),
            emit_diagnostics: false,
        }
    }
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler::default()
    }

    /// The file name diagnostics are reported against.
    pub fn source_name(mut self, name: impl Into<String>) -> Compiler {
        self.source_name = name.into();
        self
    }

    /// Also pretty-print diagnostics with source excerpts to stderr.
    pub fn emit_diagnostics(mut self, emit: bool) -> Compiler {
        self.emit_diagnostics = emit;
        self
    }

    pub fn compile(&self, text: &str) -> Result<Compiled, CompileError> {
        let mut codemap = CodeMap::new();
        let file = codemap.add_file(self.source_name.clone(), text.to_owned());

        let parsed = grammar::peggy::grammar(file.source(), file.span).map_err(|error| {
            CompileError::Syntax {
                source_name: self.source_name.clone(),
                error,
            }
        })?;
        debug!(source = %self.source_name, items = parsed.items.len(), "parsed grammar");

        let diagnostics = analysis::check(&parsed);
        if !diagnostics.is_empty() {
            return Err(self.invalid(&codemap, diagnostics));
        }

        let expanded = expand::expand(&parsed);

        let diagnostics = analysis::left_recursion(&expanded);
        if !diagnostics.is_empty() {
            return Err(self.invalid(&codemap, diagnostics));
        }

        debug!(rules = expanded.items.len(), "compiled grammar");
        Ok(Compiled {
            codemap,
            grammar: expanded,
        })
    }

    fn invalid(&self, codemap: &CodeMap, diagnostics: Diagnostics) -> CompileError {
        if self.emit_diagnostics {
            diagnostics.emit(codemap);
        }
        CompileError::Invalid {
            rendered: diagnostics.render(codemap),
            diagnostics,
        }
    }
}

/// Compile grammar text, reporting diagnostics against `source_name`.
pub fn compile(source_name: &str, text: &str) -> Result<Compiled, CompileError> {
    Compiler::new().source_name(source_name).compile(text)
}

/// A checked, template-free grammar.
pub struct Compiled {
    codemap: CodeMap,
    grammar: ast::Grammar,
}

impl Compiled {
    /// The expanded grammar: the source rules in order, followed by one rule
    /// per distinct template instantiation.
    pub fn grammar(&self) -> &ast::Grammar {
        &self.grammar
    }

    pub fn codemap(&self) -> &CodeMap {
        &self.codemap
    }

    pub fn shapes(&self) -> ShapedGrammar<'_> {
        shape::infer(&self.grammar)
    }

    pub fn parser<A: Actions>(&self, actions: A) -> Parser<'_, A> {
        Parser::new(&self.grammar, actions)
    }
}
