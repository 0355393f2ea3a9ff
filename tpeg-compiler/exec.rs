//! Packrat execution of a template-free grammar.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use thiserror::Error;
use tpeg_runtime::error::{ErrorState, ParseError};
use tpeg_runtime::str::LineCol;
use tpeg_runtime::{Bindings, Parse, ParseElem, ParseLiteral, RuleResult, Value};
use tracing::{trace, warn};

use crate::actions::{ActionCall, Actions};
use crate::ast::*;

#[derive(Debug, Error, PartialEq)]
pub enum RunError {
    #[error("no rule named `{0}`")]
    UnknownRule(String),

    #[error(transparent)]
    Parse(#[from] ParseError<LineCol>),
}

/// What a failed terminal expected, formatted only when an error is reported.
enum Expected<'a> {
    Literal(&'a str),
    Class(&'a CharClass),
    AnyChar,
    Eof,
}

impl fmt::Display for Expected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expected::Literal(s) => write!(f, "{:?}", s),
            Expected::Class(c) => write!(f, "{}", c),
            Expected::AnyChar => write!(f, "any character"),
            Expected::Eof => write!(f, "EOF"),
        }
    }
}

enum Memo {
    /// The rule is being evaluated at this position.
    InProgress,
    Done(RuleResult<Value>),
}

/// Per-parse mutable state. Never shared between parses.
struct ParseState<'g> {
    /// One memo table per rule, keyed by start position.
    caches: Vec<HashMap<usize, Memo>>,
    /// Labels bound so far; the current rule's labels start at `frame`.
    bindings: Vec<(&'g str, Value)>,
    frame: usize,
    rule: &'g str,
}

impl<'g> ParseState<'g> {
    fn new(rules: usize) -> ParseState<'g> {
        ParseState {
            caches: (0..rules).map(|_| HashMap::new()).collect(),
            bindings: Vec::new(),
            frame: 0,
            rule: "",
        }
    }
}

/// Runs a template-free grammar against input, evaluating actions through `A`.
pub struct Parser<'g, A> {
    rules: Vec<&'g Rule>,
    index: HashMap<&'g str, usize>,
    actions: A,
}

impl<'g, A: Actions> Parser<'g, A> {
    pub fn new(grammar: &'g Grammar, actions: A) -> Parser<'g, A> {
        let rules: Vec<&Rule> = grammar.iter_rules().collect();
        let mut index = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            index.entry(rule.name.name.as_str()).or_insert(i);
        }
        Parser {
            rules,
            index,
            actions,
        }
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    fn start_rule(&self, start: &str) -> Result<usize, RunError> {
        self.index
            .get(start)
            .copied()
            .ok_or_else(|| RunError::UnknownRule(start.to_owned()))
    }

    /// Match `start` against a prefix of `input`, returning the end position
    /// and value on success.
    pub fn run(&self, start: &str, input: &str) -> Result<RuleResult<Value>, RunError> {
        let start = self.start_rule(start)?;
        let mut err_state = ErrorState::new(Parse::start(input));
        let mut state = ParseState::new(self.rules.len());
        Ok(self.invoke_rule(input, &mut state, &mut err_state, Parse::start(input), start))
    }

    /// Match `start` against the whole of `input`.
    ///
    /// On failure the input is parsed a second time to collect what was
    /// expected at the furthest position reached.
    pub fn parse(&self, start: &str, input: &str) -> Result<Value, RunError> {
        let start = self.start_rule(start)?;

        let mut err_state = ErrorState::new(Parse::start(input));
        let mut state = ParseState::new(self.rules.len());
        match self.invoke_rule(input, &mut state, &mut err_state, Parse::start(input), start) {
            RuleResult::Matched(pos, value) => {
                if Parse::is_eof(input, pos) {
                    return Ok(value);
                } else {
                    err_state.mark_failure::<()>(pos, Expected::Eof);
                }
            }
            RuleResult::Failed => (),
        }

        state = ParseState::new(self.rules.len());
        err_state.reparse_for_failure();

        match self.invoke_rule(input, &mut state, &mut err_state, Parse::start(input), start) {
            RuleResult::Matched(pos, value) => {
                if Parse::is_eof(input, pos) {
                    warn!("parser is nondeterministic: succeeded when reparsing for error position");
                    return Ok(value);
                } else {
                    err_state.mark_failure::<()>(pos, Expected::Eof);
                }
            }
            RuleResult::Failed => (),
        }

        Err(err_state.into_parse_error(input).into())
    }

    fn invoke_rule<I>(
        &self,
        input: &I,
        state: &mut ParseState<'g>,
        err_state: &mut ErrorState,
        pos: usize,
        index: usize,
    ) -> RuleResult<Value>
    where
        I: ParseElem<Element = char> + ParseLiteral + ?Sized,
    {
        let rule = self.rules[index];
        let name = rule.name.name.as_str();

        match state.caches[index].get(&pos) {
            Some(Memo::Done(entry)) => {
                if cfg!(feature = "trace") {
                    let loc = Parse::position_repr(input, pos);
                    match entry {
                        RuleResult::Matched(..) => trace!("[PEG_TRACE] Cached match of rule {} at {}", name, loc),
                        RuleResult::Failed => trace!("[PEG_TRACE] Cached fail of rule {} at {}", name, loc),
                    }
                }
                return entry.clone();
            }
            Some(Memo::InProgress) => {
                panic!("rule `{}` re-entered at offset {} before completing: left recursion", name, pos)
            }
            None => {}
        }

        state.caches[index].insert(pos, Memo::InProgress);

        if cfg!(feature = "trace") {
            let loc = Parse::position_repr(input, pos);
            trace!("[PEG_TRACE] Attempting to match rule `{}` at {}", name, loc);
        }

        let saved_frame = mem::replace(&mut state.frame, state.bindings.len());
        let saved_rule = mem::replace(&mut state.rule, name);
        let result = self.eval(input, state, err_state, pos, &rule.expr);
        state.bindings.truncate(state.frame);
        state.frame = saved_frame;
        state.rule = saved_rule;

        if cfg!(feature = "trace") {
            let loc = Parse::position_repr(input, pos);
            match result {
                RuleResult::Matched(epos, _) => {
                    let eloc = Parse::position_repr(input, epos);
                    trace!("[PEG_TRACE] Matched rule `{}` at {} to {}", name, loc, eloc);
                }
                RuleResult::Failed => trace!("[PEG_TRACE] Failed to match rule `{}` at {}", name, loc),
            }
        }

        state.caches[index].insert(pos, Memo::Done(result.clone()));
        result
    }

    fn call<'s>(&self, state: &'s ParseState<'g>, hint: Option<&'s str>, code: &'s Code) -> ActionCall<'s> {
        ActionCall {
            rule: state.rule,
            hint,
            code: &code.text,
        }
    }

    fn eval<I>(
        &self,
        input: &I,
        state: &mut ParseState<'g>,
        err_state: &mut ErrorState,
        pos: usize,
        e: &'g SpannedExpr,
    ) -> RuleResult<Value>
    where
        I: ParseElem<Element = char> + ParseLiteral + ?Sized,
    {
        use self::Expr::*;
        match e.expr {
            Literal(ref s) => match ParseLiteral::parse_string_literal(input, pos, s) {
                RuleResult::Matched(next, ()) => RuleResult::Matched(next, Value::Text(s.clone())),
                RuleResult::Failed => err_state.mark_failure(pos, Expected::Literal(s)),
            },

            CharClass(ref class) => match ParseElem::parse_elem(input, pos) {
                RuleResult::Matched(next, c) if class.matches(c) => RuleResult::Matched(next, Value::from(c)),
                _ => err_state.mark_failure(pos, Expected::Class(class)),
            },

            AnyChar => match ParseElem::parse_elem(input, pos) {
                RuleResult::Matched(next, c) => RuleResult::Matched(next, Value::from(c)),
                RuleResult::Failed => err_state.mark_failure(pos, Expected::AnyChar),
            },

            Rule(ref name, _) => match self.index.get(name.name.as_str()) {
                Some(&index) => self.invoke_rule(input, state, err_state, pos, index),
                None => unreachable!("reference to undefined rule `{}`", name),
            },

            Sequence(ref exprs) => {
                let mark = state.bindings.len();
                let mut values = Vec::with_capacity(exprs.len());
                let mut seq_pos = pos;
                for expr in exprs {
                    match self.eval(input, state, err_state, seq_pos, expr) {
                        RuleResult::Matched(next, value) => {
                            seq_pos = next;
                            values.push(value);
                        }
                        RuleResult::Failed => {
                            state.bindings.truncate(mark);
                            return RuleResult::Failed;
                        }
                    }
                }
                RuleResult::Matched(seq_pos, Value::list(values))
            }

            Choice(ref exprs) => {
                for expr in exprs {
                    let mark = state.bindings.len();
                    match self.eval(input, state, err_state, pos, expr) {
                        RuleResult::Matched(next, value) => return RuleResult::Matched(next, value),
                        RuleResult::Failed => state.bindings.truncate(mark),
                    }
                }
                RuleResult::Failed
            }

            Star(ref inner) | Plus(ref inner) => {
                let mut repeat_value = Vec::new();
                let mut repeat_pos = pos;
                loop {
                    let mark = state.bindings.len();
                    match self.eval(input, state, err_state, repeat_pos, inner) {
                        RuleResult::Matched(next, value) => {
                            repeat_value.push(value);
                            // A body that matched without consuming input would match forever.
                            if next == repeat_pos {
                                break;
                            }
                            repeat_pos = next;
                        }
                        RuleResult::Failed => {
                            state.bindings.truncate(mark);
                            break;
                        }
                    }
                }

                if !repeat_value.is_empty() {
                    RuleResult::Matched(repeat_pos, Value::list(repeat_value))
                } else if let Star(_) = e.expr {
                    RuleResult::Matched(pos, Value::Absent)
                } else {
                    RuleResult::Failed
                }
            }

            Optional(ref inner) => match self.eval(input, state, err_state, pos, inner) {
                RuleResult::Matched(next, value) => RuleResult::Matched(next, value),
                RuleResult::Failed => RuleResult::Matched(pos, Value::Absent),
            },

            Predicate(kind, ref inner) => {
                let mark = state.bindings.len();
                err_state.suppress_fail += 1;
                let assert_res = self.eval(input, state, err_state, pos, inner);
                err_state.suppress_fail -= 1;
                state.bindings.truncate(mark);
                match (kind, assert_res.is_matched()) {
                    (PredicateKind::Positive, true) | (PredicateKind::Negative, false) => {
                        RuleResult::Matched(pos, Value::Bool(true))
                    }
                    _ => RuleResult::Failed,
                }
            }

            CodePredicate(kind, ref code) => {
                let call = self.call(state, None, code);
                let holds = self
                    .actions
                    .predicate(&call, Bindings::new(&state.bindings[state.frame..]));
                if holds == (kind == PredicateKind::Positive) {
                    RuleResult::Matched(pos, Value::Bool(true))
                } else {
                    RuleResult::Failed
                }
            }

            Label(ref name, ref inner) => match self.eval(input, state, err_state, pos, inner) {
                RuleResult::Matched(next, value) => {
                    state.bindings.push((name.name.as_str(), value.clone()));
                    RuleResult::Matched(next, value)
                }
                RuleResult::Failed => RuleResult::Failed,
            },

            Action {
                ref hint,
                ref code,
                ref expr,
            } => {
                let next = match expr {
                    Some(inner) => match self.eval(input, state, err_state, pos, inner) {
                        RuleResult::Matched(next, _) => next,
                        RuleResult::Failed => return RuleResult::Failed,
                    },
                    None => pos,
                };
                let call = self.call(state, Some(hint.as_str()), code);
                let value = self
                    .actions
                    .action(&call, Bindings::new(&state.bindings[state.frame..]));
                RuleResult::Matched(next, value)
            }

            Group(ref inner) => self.eval(input, state, err_state, pos, inner),
        }
    }
}
