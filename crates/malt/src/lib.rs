//! Malt: a small Lisp with closures, macros and proper tail calls.
//!
//! This module provides the embedding API for the Malt interpreter.
//!
//! # Quick Start
//!
//! ```no_run
//! use malt::{Interpreter, Value};
//!
//! let interp = Interpreter::new();
//! let result = interp.eval_str("(+ 1 2)").unwrap();
//! assert_eq!(result, Value::Int(3));
//! ```

// Re-export core types.
pub use malt_core::{
    intern, pr_str, resolve, with_resolved, Env, ErrorPolicy, EvalContext, MaltError, NativeFn,
    ReadError, Value, DEFAULT_MAX_DEPTH,
};

pub type Result<T> = std::result::Result<T, MaltError>;

/// Result of evaluating a Malt expression.
pub type EvalResult = Result<Value>;

/// Builder for configuring and constructing an [`Interpreter`].
///
/// By default the standard library and the prelude are both loaded.
pub struct InterpreterBuilder {
    stdlib: bool,
    prelude: bool,
    policy: ErrorPolicy,
    max_depth: usize,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            stdlib: true,
            prelude: true,
            policy: ErrorPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Enable or disable the builtin library (default: `true`).
    pub fn with_stdlib(mut self, enable: bool) -> Self {
        self.stdlib = enable;
        self
    }

    /// Enable or disable the Lisp prelude (default: `true`). The prelude
    /// needs the builtin library, so it is skipped without it.
    pub fn with_prelude(mut self, enable: bool) -> Self {
        self.prelude = enable;
        self
    }

    /// Choose whether structural errors can be caught by `try*`.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Limit on nested evaluations before a fatal error.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build the [`Interpreter`] with the configured options.
    pub fn build(self) -> Interpreter {
        let env = Env::new();
        if self.stdlib {
            malt_stdlib::register_stdlib(&env);
        }

        let ctx = EvalContext::new(env)
            .with_policy(self.policy)
            .with_max_depth(self.max_depth);
        malt_eval::install(&ctx);

        let interp = Interpreter { ctx };
        if self.stdlib && self.prelude {
            if let Err(e) = interp.eval_str(malt_eval::PRELUDE) {
                tracing::warn!(error = %e, "prelude failed to load");
            }
        }
        tracing::debug!(
            policy = self.policy.name(),
            max_depth = self.max_depth,
            "interpreter ready"
        );
        interp
    }
}

/// A Malt interpreter instance.
///
/// Use [`InterpreterBuilder`] for fine-grained control, or call
/// [`Interpreter::new`] for a default interpreter.
pub struct Interpreter {
    ctx: EvalContext,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with the builtin library and prelude loaded.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    /// Create an [`InterpreterBuilder`] for fine-grained configuration.
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Evaluate a single parsed [`Value`] in the global environment.
    pub fn eval(&self, expr: &Value) -> EvalResult {
        malt_eval::eval_value(&self.ctx, expr, &self.ctx.global_env)
    }

    /// Parse and evaluate every form in `input`, returning the last value.
    ///
    /// Definitions (`def!`) persist across calls.
    pub fn eval_str(&self, input: &str) -> EvalResult {
        malt_eval::eval_string(&self.ctx, input, &self.ctx.global_env)
    }

    /// Read, evaluate and print one line of REPL input. Blank input gives
    /// `Ok(None)`.
    pub fn rep(&self, input: &str) -> Result<Option<String>> {
        let forms = malt_reader::read_many(input)?;
        let Some((last, init)) = forms.split_last() else {
            return Ok(None);
        };
        for form in init {
            self.eval(form)?;
        }
        let val = self.eval(last)?;
        Ok(Some(pr_str(&val, true)))
    }

    /// Register a native function that can be called from Malt code.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use malt::{Interpreter, MaltError, Value};
    ///
    /// let interp = Interpreter::new();
    /// interp.register_fn("square", |args: &[Value]| {
    ///     match &args[0] {
    ///         Value::Int(n) => Ok(Value::Int(n * n)),
    ///         other => Err(MaltError::type_error("integer", other.type_name())),
    ///     }
    /// });
    /// ```
    pub fn register_fn<F>(&self, name: &str, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        self.install(name, NativeFn::simple(name, f));
    }

    /// Bind a native function in the global environment.
    pub fn install(&self, name: &str, f: NativeFn) {
        self.ctx.global_env.define_str(name, Value::native_fn(f));
    }

    /// Bind `*ARGV*` to a list of strings.
    pub fn set_argv(&self, args: &[String]) {
        let argv = args.iter().map(|a| Value::string(a)).collect();
        self.ctx.global_env.define_str("*ARGV*", Value::list(argv));
    }

    /// Return a reference to the global environment.
    pub fn global_env(&self) -> &Env {
        &self.ctx.global_env
    }

    pub fn context(&self) -> &EvalContext {
        &self.ctx
    }

    /// Global bindings in name order, for REPL inspection.
    pub fn global_names(&self) -> Vec<String> {
        self.ctx.global_env.names()
    }
}
