use std::rc::Rc;

use malt_core::{check_arity, CritMap, Env, MaltError, Value};

use crate::register_fn;

fn map_arg<'a>(name: &str, v: &'a Value) -> Result<&'a CritMap, MaltError> {
    v.as_map()
        .ok_or_else(|| MaltError::type_error(format!("{name}: map"), v.type_name()))
}

fn insert_pairs(mut map: CritMap, name: &str, kvs: &[Value]) -> Result<CritMap, MaltError> {
    if kvs.len() % 2 != 0 {
        return Err(MaltError::eval(format!(
            "{name}: expected key/value pairs, got an odd number of arguments"
        )));
    }
    for pair in kvs.chunks(2) {
        map = map.insert(pair[0].clone(), pair[1].clone())?;
    }
    Ok(map)
}

pub fn register(env: &Env) {
    register_fn(env, "hash-map", |args| {
        Ok(Value::map(insert_pairs(CritMap::new(), "hash-map", args)?))
    });

    register_fn(env, "map?", |args| {
        check_arity!(args, "map?", 1);
        Ok(Value::Bool(args[0].as_map().is_some()))
    });

    register_fn(env, "assoc", |args| {
        check_arity!(args, "assoc", 1..);
        let Value::Map(map, meta) = &args[0] else {
            return Err(MaltError::type_error("assoc: map", args[0].type_name()));
        };
        let updated = insert_pairs((**map).clone(), "assoc", &args[1..])?;
        Ok(Value::Map(Rc::new(updated), meta.clone()))
    });

    register_fn(env, "dissoc", |args| {
        check_arity!(args, "dissoc", 1..);
        let Value::Map(map, meta) = &args[0] else {
            return Err(MaltError::type_error("dissoc: map", args[0].type_name()));
        };
        let updated = args[1..]
            .iter()
            .fold((**map).clone(), |m, key| m.remove(key));
        Ok(Value::Map(Rc::new(updated), meta.clone()))
    });

    register_fn(env, "get", |args| {
        check_arity!(args, "get", 2);
        if args[0].is_nil() {
            return Ok(Value::Nil);
        }
        Ok(map_arg("get", &args[0])?
            .get(&args[1])
            .cloned()
            .unwrap_or(Value::Nil))
    });

    register_fn(env, "contains?", |args| {
        check_arity!(args, "contains?", 2);
        if args[0].is_nil() {
            return Ok(Value::Bool(false));
        }
        Ok(Value::Bool(map_arg("contains?", &args[0])?.contains_key(&args[1])))
    });

    register_fn(env, "keys", |args| {
        check_arity!(args, "keys", 1);
        Ok(Value::list(map_arg("keys", &args[0])?.keys().cloned().collect()))
    });

    register_fn(env, "vals", |args| {
        check_arity!(args, "vals", 1);
        Ok(Value::list(map_arg("vals", &args[0])?.values().cloned().collect()))
    });
}
