use std::fmt::Display;

pub mod error;
pub mod str;
mod value;

pub use value::{Bindings, Value};

/// The result of matching an expression or rule at a position.
///
/// `Matched` carries the position just past the match and the computed value.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum RuleResult<T> {
    Matched(usize, T),
    Failed,
}

impl<T> RuleResult<T> {
    pub fn is_matched(&self) -> bool {
        matches!(self, RuleResult::Matched(..))
    }
}

/// A type that can be used as input to a parser.
pub trait Parse {
    type PositionRepr: Display;
    fn start(&self) -> usize;
    fn is_eof(&self, p: usize) -> bool;
    fn position_repr(&self, p: usize) -> Self::PositionRepr;
}

/// A parser input type supporting the `[...]` and `.` syntax.
pub trait ParseElem: Parse {
    /// Type of a single atomic element of the input, for example a character
    type Element: Copy;

    /// Get the element at `pos`, or `Failed` if past end of input.
    fn parse_elem(&self, pos: usize) -> RuleResult<Self::Element>;
}

/// A parser input type supporting the `"literal"` syntax.
pub trait ParseLiteral: Parse {
    /// Attempt to match the `literal` string at `pos`, returning whether it
    /// matched or failed.
    fn parse_string_literal(&self, pos: usize, literal: &str) -> RuleResult<()>;
}
