use malt_core::{check_arity, Env, MaltError, Value};

use crate::{register_ctx_fn, register_fn, seq_items};

pub fn register(env: &Env) {
    register_fn(env, "list", |args| Ok(Value::list(args.to_vec())));

    register_fn(env, "list?", |args| {
        check_arity!(args, "list?", 1);
        Ok(Value::Bool(matches!(args[0], Value::List(..))))
    });

    register_fn(env, "vector", |args| Ok(Value::vector(args.to_vec())));

    register_fn(env, "vector?", |args| {
        check_arity!(args, "vector?", 1);
        Ok(Value::Bool(matches!(args[0], Value::Vector(..))))
    });

    register_fn(env, "sequential?", |args| {
        check_arity!(args, "sequential?", 1);
        Ok(Value::Bool(args[0].as_seq().is_some()))
    });

    register_fn(env, "vec", |args| {
        check_arity!(args, "vec", 1);
        match &args[0] {
            v @ Value::Vector(..) => Ok(v.clone()),
            other => Ok(Value::vector(seq_items("vec", other)?.to_vec())),
        }
    });

    register_fn(env, "cons", |args| {
        check_arity!(args, "cons", 2);
        let tail = seq_items("cons", &args[1])?;
        let mut items = Vec::with_capacity(tail.len() + 1);
        items.push(args[0].clone());
        items.extend_from_slice(tail);
        Ok(Value::list(items))
    });

    register_fn(env, "concat", |args| {
        let mut items = Vec::new();
        for arg in args {
            items.extend_from_slice(seq_items("concat", arg)?);
        }
        Ok(Value::list(items))
    });

    register_fn(env, "nth", |args| {
        check_arity!(args, "nth", 2);
        let items = seq_items("nth", &args[0])?;
        let index = args[1]
            .as_int()
            .ok_or_else(|| MaltError::type_error("int", args[1].type_name()))?;
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or_else(|| MaltError::eval(format!("nth: index {index} out of range")))
    });

    register_fn(env, "first", |args| {
        check_arity!(args, "first", 1);
        Ok(seq_items("first", &args[0])?
            .first()
            .cloned()
            .unwrap_or(Value::Nil))
    });

    register_fn(env, "rest", |args| {
        check_arity!(args, "rest", 1);
        let items = seq_items("rest", &args[0])?;
        Ok(Value::list(items.iter().skip(1).cloned().collect()))
    });

    register_fn(env, "empty?", |args| {
        check_arity!(args, "empty?", 1);
        match &args[0] {
            Value::Map(m, _) => Ok(Value::Bool(m.is_empty())),
            other => Ok(Value::Bool(seq_items("empty?", other)?.is_empty())),
        }
    });

    register_fn(env, "count", |args| {
        check_arity!(args, "count", 1);
        let n = match &args[0] {
            Value::Map(m, _) => m.len(),
            other => seq_items("count", other)?.len(),
        };
        Ok(Value::Int(n as i64))
    });

    register_fn(env, "conj", |args| {
        check_arity!(args, "conj", 1..);
        match &args[0] {
            Value::Vector(items, _) => {
                let mut out = items.to_vec();
                out.extend_from_slice(&args[1..]);
                Ok(Value::vector(out))
            }
            other => {
                let existing = seq_items("conj", other)?;
                let mut out: Vec<Value> = args[1..].iter().rev().cloned().collect();
                out.extend_from_slice(existing);
                Ok(Value::list(out))
            }
        }
    });

    register_fn(env, "seq", |args| {
        check_arity!(args, "seq", 1);
        match &args[0] {
            Value::String(s) if s.is_empty() => Ok(Value::Nil),
            Value::String(s) => Ok(Value::list(
                s.chars().map(|c| Value::string(c.encode_utf8(&mut [0; 4]))).collect(),
            )),
            l @ Value::List(items, _) if !items.is_empty() => Ok(l.clone()),
            other => {
                let items = seq_items("seq", other)?;
                if items.is_empty() {
                    Ok(Value::Nil)
                } else {
                    Ok(Value::list(items.to_vec()))
                }
            }
        }
    });

    register_ctx_fn(env, "apply", |ctx, args| {
        check_arity!(args, "apply", 2..);
        let (last, middle) = (&args[args.len() - 1], &args[1..args.len() - 1]);
        let mut call_args = middle.to_vec();
        call_args.extend_from_slice(seq_items("apply", last)?);
        ctx.apply(&args[0], &call_args)
    });

    register_ctx_fn(env, "map", |ctx, args| {
        check_arity!(args, "map", 2);
        let results = seq_items("map", &args[1])?
            .iter()
            .map(|item| ctx.apply(&args[0], std::slice::from_ref(item)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::list(results))
    });
}
