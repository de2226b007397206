use std::cmp::Ordering;

use malt_core::{check_arity, Env, MaltError, Value};

use crate::register_fn;

/// Order two operands. Numbers compare by value; two sequences compare by
/// item count.
fn order(a: &Value, b: &Value) -> Result<Ordering, MaltError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (x, y) = (a.as_float().unwrap_or_default(), b.as_float().unwrap_or_default());
            x.partial_cmp(&y)
                .ok_or_else(|| MaltError::eval("cannot order NaN"))
        }
        _ => match (a.as_seq(), b.as_seq()) {
            (Some(x), Some(y)) => Ok(x.len().cmp(&y.len())),
            (None, _) => Err(MaltError::type_error("number or sequence", a.type_name())),
            (Some(_), None) => Err(MaltError::type_error("sequence", b.type_name())),
        },
    }
}

fn chain(args: &[Value], name: &str, accept: fn(Ordering) -> bool) -> Result<Value, MaltError> {
    check_arity!(args, name, 1..);
    for pair in args.windows(2) {
        if !accept(order(&pair[0], &pair[1])?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub fn register(env: &Env) {
    register_fn(env, "<", |args| chain(args, "<", Ordering::is_lt));
    register_fn(env, ">", |args| chain(args, ">", Ordering::is_gt));
    register_fn(env, "<=", |args| chain(args, "<=", Ordering::is_le));
    register_fn(env, ">=", |args| chain(args, ">=", Ordering::is_ge));

    register_fn(env, "=", |args| {
        check_arity!(args, "=", 1..);
        Ok(Value::Bool(args.windows(2).all(|p| p[0] == p[1])))
    });

    register_fn(env, "identical?", |args| {
        check_arity!(args, "identical?", 2);
        Ok(Value::Bool(args[0].identical(&args[1])))
    });
}
