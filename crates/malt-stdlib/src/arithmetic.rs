use malt_core::{check_arity, Env, MaltError, Value};

use crate::register_fn;

type IntOp = fn(i64, i64) -> Result<i64, MaltError>;

fn number(v: &Value) -> Result<&Value, MaltError> {
    match v {
        Value::Int(_) | Value::Float(_) => Ok(v),
        other => Err(MaltError::type_error("number", other.type_name())),
    }
}

fn overflow(name: &str) -> MaltError {
    MaltError::eval(format!("{name}: integer overflow"))
}

/// Left fold over numeric arguments. Integers stay integers until a float
/// shows up; from then on the result is a float.
fn fold(args: &[Value], int_op: IntOp, float_op: fn(f64, f64) -> f64) -> Result<Value, MaltError> {
    let mut acc = number(&args[0])?.clone();
    for arg in &args[1..] {
        acc = match (&acc, number(arg)?) {
            (Value::Int(a), Value::Int(b)) => Value::Int(int_op(*a, *b)?),
            (a, b) => Value::Float(float_op(
                a.as_float().unwrap_or_default(),
                b.as_float().unwrap_or_default(),
            )),
        };
    }
    Ok(acc)
}

fn checked_div(a: i64, b: i64) -> Result<i64, MaltError> {
    if b == 0 {
        return Err(MaltError::DivisionByZero);
    }
    a.checked_div(b).ok_or_else(|| overflow("/"))
}

fn checked_rem(a: i64, b: i64) -> Result<i64, MaltError> {
    if b == 0 {
        return Err(MaltError::DivisionByZero);
    }
    a.checked_rem(b).ok_or_else(|| overflow("mod"))
}

pub fn register(env: &Env) {
    register_fn(env, "+", |args| {
        if args.is_empty() {
            return Ok(Value::Int(0));
        }
        fold(args, |a, b| a.checked_add(b).ok_or_else(|| overflow("+")), |a, b| a + b)
    });

    register_fn(env, "-", |args| {
        check_arity!(args, "-", 1..);
        if args.len() == 1 {
            return match number(&args[0])? {
                Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| overflow("-")),
                other => Ok(Value::Float(-other.as_float().unwrap_or_default())),
            };
        }
        fold(args, |a, b| a.checked_sub(b).ok_or_else(|| overflow("-")), |a, b| a - b)
    });

    register_fn(env, "*", |args| {
        if args.is_empty() {
            return Ok(Value::Int(1));
        }
        fold(args, |a, b| a.checked_mul(b).ok_or_else(|| overflow("*")), |a, b| a * b)
    });

    register_fn(env, "/", |args| {
        check_arity!(args, "/", 2..);
        fold(args, checked_div, |a, b| a / b)
    });

    register_fn(env, "mod", |args| {
        check_arity!(args, "mod", 2);
        fold(args, checked_rem, |a, b| a % b)
    });

    register_fn(env, "inc", |args| {
        check_arity!(args, "inc", 1);
        let operands = [args[0].clone(), Value::Int(1)];
        fold(&operands, |a, b| a.checked_add(b).ok_or_else(|| overflow("inc")), |a, b| a + b)
    });

    register_fn(env, "abs", |args| {
        check_arity!(args, "abs", 1);
        match number(&args[0])? {
            Value::Int(n) => n.checked_abs().map(Value::Int).ok_or_else(|| overflow("abs")),
            other => Ok(Value::Float(other.as_float().unwrap_or_default().abs())),
        }
    });

    register_fn(env, "dec", |args| {
        check_arity!(args, "dec", 1);
        let operands = [args[0].clone(), Value::Int(1)];
        fold(&operands, |a, b| a.checked_sub(b).ok_or_else(|| overflow("dec")), |a, b| a - b)
    });
}
