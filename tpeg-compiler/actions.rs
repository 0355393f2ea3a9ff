//! The boundary between the engine and user action code.
//!
//! Action and predicate code is opaque to tpeg. When the engine reaches an
//! action it hands the code, the action's declared type and the labels bound
//! so far in the enclosing alternative to an [`Actions`] implementation and
//! uses whatever value comes back.

use std::collections::HashMap;
use tpeg_runtime::{Bindings, Value};
use tracing::warn;

/// Identifies the action or predicate being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct ActionCall<'a> {
    /// The rule containing the code.
    pub rule: &'a str,
    /// The declared result type; `None` for predicates.
    pub hint: Option<&'a str>,
    /// The code between the braces, verbatim.
    pub code: &'a str,
}

/// Evaluates action and predicate code.
///
/// Implementations must behave as pure functions of their bindings: memoized
/// rule results are reused without re-running the actions inside them.
pub trait Actions {
    fn action(&self, call: &ActionCall<'_>, bindings: Bindings<'_>) -> Value;

    fn predicate(&self, call: &ActionCall<'_>, bindings: Bindings<'_>) -> bool;
}

impl<A: Actions + ?Sized> Actions for &A {
    fn action(&self, call: &ActionCall<'_>, bindings: Bindings<'_>) -> Value {
        (**self).action(call, bindings)
    }

    fn predicate(&self, call: &ActionCall<'_>, bindings: Bindings<'_>) -> bool {
        (**self).predicate(call, bindings)
    }
}

/// No actions: every action yields `Absent` and every code predicate fails.
impl Actions for () {
    fn action(&self, call: &ActionCall<'_>, _: Bindings<'_>) -> Value {
        warn!(rule = call.rule, code = call.code, "no action table; action yields no value");
        Value::Absent
    }

    fn predicate(&self, call: &ActionCall<'_>, _: Bindings<'_>) -> bool {
        warn!(rule = call.rule, code = call.code, "no action table; predicate fails");
        false
    }
}

type ActionFn = Box<dyn Fn(Bindings<'_>) -> Value + Send + Sync>;
type PredicateFn = Box<dyn Fn(Bindings<'_>) -> bool + Send + Sync>;

/// Actions looked up by their code text, ignoring surrounding whitespace.
///
/// ```
/// use tpeg_compiler::ActionTable;
///
/// let table = ActionTable::new()
///     .on_action("return x", |b| b["x"].clone())
///     .on_predicate("true", |_| true);
/// # let _ = table;
/// ```
#[derive(Default)]
pub struct ActionTable {
    actions: HashMap<String, ActionFn>,
    predicates: HashMap<String, PredicateFn>,
}

impl ActionTable {
    pub fn new() -> ActionTable {
        ActionTable::default()
    }

    pub fn on_action(
        mut self,
        code: &str,
        f: impl Fn(Bindings<'_>) -> Value + Send + Sync + 'static,
    ) -> ActionTable {
        self.actions.insert(code.trim().to_owned(), Box::new(f));
        self
    }

    pub fn on_predicate(
        mut self,
        code: &str,
        f: impl Fn(Bindings<'_>) -> bool + Send + Sync + 'static,
    ) -> ActionTable {
        self.predicates.insert(code.trim().to_owned(), Box::new(f));
        self
    }
}

impl Actions for ActionTable {
    fn action(&self, call: &ActionCall<'_>, bindings: Bindings<'_>) -> Value {
        match self.actions.get(call.code.trim()) {
            Some(f) => f(bindings),
            None => {
                warn!(rule = call.rule, code = call.code, "no handler registered for action");
                Value::Absent
            }
        }
    }

    fn predicate(&self, call: &ActionCall<'_>, bindings: Bindings<'_>) -> bool {
        match self.predicates.get(call.code.trim()) {
            Some(f) => f(bindings),
            None => {
                warn!(rule = call.rule, code = call.code, "no handler registered for predicate");
                false
            }
        }
    }
}
