use malt_core::{with_resolved, Closure, Env, EvalContext, MaltError, Value};

use crate::special_forms::{self, special_forms};

/// Minimum stack headroom before a nested evaluation, and the size of the
/// segment allocated when less remains.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Trampoline for tail-call optimization.
pub enum Trampoline {
    Value(Value),
    Eval(Value, Env),
}

pub type EvalResult = Result<Value, MaltError>;

/// Install this evaluator as the context's re-entry point for builtins.
pub fn install(ctx: &EvalContext) {
    ctx.set_callbacks(eval_value, apply);
}

/// Evaluate a string containing one or more expressions.
pub fn eval_string(ctx: &EvalContext, input: &str, env: &Env) -> EvalResult {
    let exprs = malt_reader::read_many(input)?;
    let mut result = Value::Nil;
    for expr in &exprs {
        result = eval_value(ctx, expr, env)?;
    }
    Ok(result)
}

/// Evaluate with trampoline for TCO.
///
/// Nested evaluations grow the host stack on demand, so the depth limit is
/// the only bound on non-tail recursion regardless of the calling thread.
pub fn eval_value(ctx: &EvalContext, expr: &Value, env: &Env) -> EvalResult {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || eval_loop(ctx, expr, env))
}

fn eval_loop(ctx: &EvalContext, expr: &Value, env: &Env) -> EvalResult {
    let _guard = ctx.enter()?;
    let mut current_expr = expr.clone();
    let mut current_env = env.clone();

    loop {
        if debug_eval(&current_env) {
            tracing::info!("EVAL: {}", current_expr);
        }
        match eval_step(ctx, &current_expr, &current_env)? {
            Trampoline::Value(v) => return Ok(v),
            Trampoline::Eval(next_expr, next_env) => {
                current_expr = next_expr;
                current_env = next_env;
            }
        }
    }
}

fn debug_eval(env: &Env) -> bool {
    env.get(special_forms().debug_eval)
        .is_some_and(|v| v.is_truthy())
}

fn eval_step(ctx: &EvalContext, expr: &Value, env: &Env) -> Result<Trampoline, MaltError> {
    match expr {
        Value::Symbol(spur) => env.lookup(*spur).map(Trampoline::Value),
        Value::Vector(items, _) => {
            let mut result = Vec::with_capacity(items.len());
            for item in items.iter() {
                result.push(eval_value(ctx, item, env)?);
            }
            Ok(Trampoline::Value(Value::vector(result)))
        }
        Value::Map(map, _) => {
            let mut result = (**map).clone();
            for (k, v) in map.iter() {
                result = result.insert(k.clone(), eval_value(ctx, v, env)?)?;
            }
            Ok(Trampoline::Value(Value::map(result)))
        }
        Value::List(items, _) if !items.is_empty() => {
            let head = &items[0];
            let args = &items[1..];

            if let Some(spur) = head.as_symbol_spur() {
                if let Some(result) = special_forms::try_eval_special(spur, args, env, ctx) {
                    return result;
                }
            }

            let func = eval_value(ctx, head, env)?;

            // Macros receive unevaluated arguments; the expansion runs in the
            // caller's env.
            if let Value::Closure(mac) = &func {
                if mac.is_macro {
                    let expanded = expand_once(ctx, head, &func, args)?;
                    tracing::trace!(form = %expr, expansion = %expanded, "macro expanded");
                    return Ok(Trampoline::Eval(expanded, env.clone()));
                }
            }

            let mut eval_args = Vec::with_capacity(args.len());
            for arg in args {
                eval_args.push(eval_value(ctx, arg, env)?);
            }

            match &func {
                Value::Builtin(native) => (native.func)(ctx, &eval_args).map(Trampoline::Value),
                Value::Closure(closure) => {
                    let frame = closure_frame(head, &func, closure, &eval_args)?;
                    Ok(Trampoline::Eval(closure.body.clone(), frame))
                }
                other => Err(MaltError::not_applicable(other)),
            }
        }
        // Empty lists and every other leaf evaluate to themselves
        other => Ok(Trampoline::Value(other.clone())),
    }
}

/// Bind a closure's parameters, naming it in arity errors by the symbol it
/// was called through, or by its printed form when called anonymously.
fn closure_frame(
    head: &Value,
    func: &Value,
    closure: &Closure,
    args: &[Value],
) -> Result<Env, MaltError> {
    match head.as_symbol_spur() {
        Some(spur) => with_resolved(spur, |name| {
            Env::lambda_frame(&closure.env, name, &closure.params, args)
        }),
        None => Env::lambda_frame(&closure.env, &func.to_string(), &closure.params, args),
    }
}

/// Run a macro body once over unevaluated argument forms.
fn expand_once(ctx: &EvalContext, head: &Value, mac: &Value, args: &[Value]) -> EvalResult {
    let Value::Closure(closure) = mac else {
        return Err(MaltError::not_applicable(mac));
    };
    let frame = closure_frame(head, mac, closure, args)?;
    eval_value(ctx, &closure.body, &frame)
}

/// The macro a form's head names in `env`, if any.
fn macro_head(form: &Value, env: &Env) -> Option<Value> {
    let head = form.as_list()?.first()?.as_symbol_spur()?;
    env.get(head).filter(Value::is_macro)
}

/// Expand `form` until its head no longer names a macro.
pub fn macroexpand(ctx: &EvalContext, form: &Value, env: &Env) -> EvalResult {
    let mut current = form.clone();
    while let Some(mac) = macro_head(&current, env) {
        let Some((head, args)) = current.as_list().and_then(<[Value]>::split_first) else {
            break;
        };
        current = expand_once(ctx, head, &mac, args)?;
    }
    Ok(current)
}

/// Call `op` with already-evaluated arguments, outside tail position.
pub fn apply(ctx: &EvalContext, op: &Value, args: &[Value]) -> EvalResult {
    match op {
        Value::Builtin(native) => (native.func)(ctx, args),
        Value::Closure(closure) if !closure.is_macro => {
            let frame = closure_frame(&Value::Nil, op, closure, args)?;
            eval_value(ctx, &closure.body, &frame)
        }
        other => Err(MaltError::not_applicable(other)),
    }
}
