use std::cell::Cell;
use std::rc::Rc;

use crate::env::Env;
use crate::error::MaltError;
use crate::value::Value;

/// Default limit on nested evaluations before a `Fatal` error is raised.
pub const DEFAULT_MAX_DEPTH: usize = 2048;

/// Whether structural errors (unbound symbols, arity, type...) are visible to
/// `try*`/`catch*`. Thrown values are always catchable; fatal errors never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    #[default]
    Catchable,
    Propagate,
}

impl ErrorPolicy {
    pub fn name(self) -> &'static str {
        match self {
            ErrorPolicy::Catchable => "catchable",
            ErrorPolicy::Propagate => "propagate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "catchable" => Some(ErrorPolicy::Catchable),
            "propagate" => Some(ErrorPolicy::Propagate),
            _ => None,
        }
    }
}

pub type EvalFn = fn(&EvalContext, &Value, &Env) -> Result<Value, MaltError>;
pub type ApplyFn = fn(&EvalContext, &Value, &[Value]) -> Result<Value, MaltError>;

/// Explicit interpreter state threaded through evaluation and builtins.
pub struct EvalContext {
    pub global_env: Env,
    pub policy: ErrorPolicy,
    pub max_depth: usize,
    pub eval_depth: Cell<usize>,
    eval_fn: Cell<Option<EvalFn>>,
    apply_fn: Cell<Option<ApplyFn>>,
}

/// RAII guard that releases one level of evaluation depth on drop.
pub struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

impl EvalContext {
    pub fn new(global_env: Env) -> Self {
        EvalContext {
            global_env,
            policy: ErrorPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            eval_depth: Cell::new(0),
            eval_fn: Cell::new(None),
            apply_fn: Cell::new(None),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Install the evaluator entry points builtins use to re-enter evaluation.
    pub fn set_callbacks(&self, eval: EvalFn, apply: ApplyFn) {
        self.eval_fn.set(Some(eval));
        self.apply_fn.set(Some(apply));
    }

    pub fn eval(&self, ast: &Value, env: &Env) -> Result<Value, MaltError> {
        match self.eval_fn.get() {
            Some(f) => f(self, ast, env),
            None => Err(MaltError::fatal("no evaluator installed")),
        }
    }

    pub fn eval_global(&self, ast: &Value) -> Result<Value, MaltError> {
        self.eval(ast, &self.global_env)
    }

    /// Call `op` with already-evaluated arguments.
    pub fn apply(&self, op: &Value, args: &[Value]) -> Result<Value, MaltError> {
        match (op, self.apply_fn.get()) {
            (Value::Builtin(f), _) => (f.func)(self, args),
            (_, Some(f)) => f(self, op, args),
            (_, None) => Err(MaltError::fatal("no evaluator installed")),
        }
    }

    /// Enter one level of evaluation, failing once `max_depth` is exceeded.
    pub fn enter(&self) -> Result<DepthGuard<'_>, MaltError> {
        let depth = self.eval_depth.get() + 1;
        if depth > self.max_depth {
            return Err(MaltError::fatal(format!(
                "maximum evaluation depth exceeded ({})",
                self.max_depth
            )));
        }
        self.eval_depth.set(depth);
        Ok(DepthGuard {
            depth: &self.eval_depth,
        })
    }

    /// Global env handle suitable as a closure parent.
    pub fn global(&self) -> Rc<Env> {
        Rc::new(self.global_env.clone())
    }
}
