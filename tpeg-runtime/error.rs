//! Furthest-failure error tracking.

use crate::{Parse, RuleResult};
use std::collections::BTreeSet;
use std::fmt::{self, Debug, Display};

/// What the parser would have accepted at the failure position, in sorted
/// order.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct ExpectedSet {
    expected: BTreeSet<String>,
}

impl ExpectedSet {
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.expected.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }
}

impl Display for ExpectedSet {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut tokens = self.tokens();
        match (tokens.next(), self.expected.len()) {
            (None, _) => write!(fmt, "<unreported>"),
            (Some(only), 1) => write!(fmt, "{}", only),
            (Some(first), _) => {
                write!(fmt, "one of {}", first)?;
                for token in tokens {
                    write!(fmt, ", {}", token)?;
                }
                Ok(())
            }
        }
    }
}

/// A parse failure.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ParseError<L> {
    /// The furthest position any expression failed at.
    pub location: L,

    /// What would have matched at `location`.
    pub expected: ExpectedSet,
}

impl<L: Display> Display for ParseError<L> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "error at {}: expected {}", self.location, self.expected)
    }
}

impl<L: Display + Debug> std::error::Error for ParseError<L> {}

#[doc(hidden)]
#[derive(Debug)]
pub struct ErrorState {
    /// Offset of the furthest failure seen.
    pub max_err_pos: usize,

    /// Lookahead nesting depth. Failures inside a lookahead are not recorded.
    pub suppress_fail: usize,

    /// Set on the second pass, which collects what was expected at
    /// `max_err_pos`.
    pub reparsing_on_failure: bool,

    pub expected: ExpectedSet,
}

impl ErrorState {
    pub fn new(initial_pos: usize) -> Self {
        ErrorState {
            max_err_pos: initial_pos,
            suppress_fail: 0,
            reparsing_on_failure: false,
            expected: ExpectedSet::default(),
        }
    }

    /// Prepare for the second pass over the same input.
    pub fn reparse_for_failure(&mut self) {
        self.suppress_fail = 0;
        self.reparsing_on_failure = true;
    }

    #[inline(never)]
    fn mark_failure_slow_path(&mut self, pos: usize, expected: &dyn Display) {
        if pos == self.max_err_pos {
            self.expected.expected.insert(expected.to_string());
        }
    }

    /// Flag a failure. `expected` is only formatted while reparsing.
    #[inline(always)]
    pub fn mark_failure<T>(&mut self, pos: usize, expected: impl Display) -> RuleResult<T> {
        if self.suppress_fail == 0 {
            if self.reparsing_on_failure {
                self.mark_failure_slow_path(pos, &expected);
            } else if pos > self.max_err_pos {
                self.max_err_pos = pos;
            }
        }
        RuleResult::Failed
    }

    /// Build the error for a failed parse.
    pub fn into_parse_error<I: Parse + ?Sized>(self, input: &I) -> ParseError<I::PositionRepr> {
        ParseError {
            location: input.position_repr(self.max_err_pos),
            expected: self.expected,
        }
    }
}
