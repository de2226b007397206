use malt_core::{check_arity, Env, MaltError, Value};

use crate::register_fn;

pub fn register(env: &Env) {
    register_fn(env, "nil?", |args| {
        check_arity!(args, "nil?", 1);
        Ok(Value::Bool(args[0].is_nil()))
    });

    register_fn(env, "true?", |args| {
        check_arity!(args, "true?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Bool(true))))
    });

    register_fn(env, "false?", |args| {
        check_arity!(args, "false?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Bool(false))))
    });

    register_fn(env, "symbol", |args| {
        check_arity!(args, "symbol", 1);
        match &args[0] {
            Value::String(s) => Ok(Value::symbol(s)),
            sym @ Value::Symbol(_) => Ok(sym.clone()),
            other => Err(MaltError::type_error("string", other.type_name())),
        }
    });

    register_fn(env, "symbol?", |args| {
        check_arity!(args, "symbol?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Symbol(_))))
    });

    register_fn(env, "keyword", |args| {
        check_arity!(args, "keyword", 1);
        match &args[0] {
            Value::String(s) => Ok(Value::keyword(s)),
            kw @ Value::Keyword(_) => Ok(kw.clone()),
            other => Err(MaltError::type_error("string or keyword", other.type_name())),
        }
    });

    register_fn(env, "keyword?", |args| {
        check_arity!(args, "keyword?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Keyword(_))))
    });

    register_fn(env, "string?", |args| {
        check_arity!(args, "string?", 1);
        Ok(Value::Bool(matches!(args[0], Value::String(_))))
    });

    register_fn(env, "number?", |args| {
        check_arity!(args, "number?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Int(_) | Value::Float(_))))
    });

    register_fn(env, "zero?", |args| {
        check_arity!(args, "zero?", 1);
        match &args[0] {
            Value::Int(n) => Ok(Value::Bool(*n == 0)),
            Value::Float(f) => Ok(Value::Bool(*f == 0.0)),
            other => Err(MaltError::type_error("number", other.type_name())),
        }
    });

    register_fn(env, "fn?", |args| {
        check_arity!(args, "fn?", 1);
        Ok(Value::Bool(match &args[0] {
            Value::Closure(c) => !c.is_macro,
            Value::Builtin(_) => true,
            _ => false,
        }))
    });

    register_fn(env, "macro?", |args| {
        check_arity!(args, "macro?", 1);
        Ok(Value::Bool(args[0].is_macro()))
    });
}
