mod arithmetic;
mod atom;
mod comparison;
mod control;
mod list;
mod map;
mod meta;
mod predicates;
mod string;
mod system;

use malt_core::{intern, Env, EvalContext, MaltError, NativeFn, Value};

/// Install every builtin into `env`.
pub fn register_stdlib(env: &Env) {
    arithmetic::register(env);
    comparison::register(env);
    list::register(env);
    map::register(env);
    predicates::register(env);
    atom::register(env);
    meta::register(env);
    string::register(env);
    control::register(env);
    system::register(env);
    tracing::debug!(bindings = env.bindings.borrow().len(), "stdlib registered");
}

fn register_fn(env: &Env, name: &str, f: impl Fn(&[Value]) -> Result<Value, MaltError> + 'static) {
    env.define(intern(name), Value::native_fn(NativeFn::simple(name, f)));
}

/// Register a builtin that re-enters the evaluator through the context.
fn register_ctx_fn(
    env: &Env,
    name: &str,
    f: impl Fn(&EvalContext, &[Value]) -> Result<Value, MaltError> + 'static,
) {
    env.define(intern(name), Value::native_fn(NativeFn::with_ctx(name, f)));
}

/// Items of a list, vector or nil.
fn seq_items<'a>(name: &str, v: &'a Value) -> Result<&'a [Value], MaltError> {
    match v {
        Value::Nil => Ok(&[]),
        other => other
            .as_seq()
            .ok_or_else(|| MaltError::type_error(format!("{name}: list or vector"), other.type_name())),
    }
}
