use malt_core::{check_arity, pr_str, Env, MaltError, Value};

use crate::register_fn;

fn join(args: &[Value], readably: bool, sep: &str) -> String {
    args.iter()
        .map(|v| pr_str(v, readably))
        .collect::<Vec<_>>()
        .join(sep)
}

pub fn register(env: &Env) {
    register_fn(env, "pr-str", |args| Ok(Value::string(&join(args, true, " "))));

    register_fn(env, "str", |args| Ok(Value::string(&join(args, false, ""))));

    register_fn(env, "prn", |args| {
        println!("{}", join(args, true, " "));
        Ok(Value::Nil)
    });

    register_fn(env, "println", |args| {
        println!("{}", join(args, false, " "));
        Ok(Value::Nil)
    });

    register_fn(env, "read-string", |args| {
        check_arity!(args, "read-string", 1);
        let text = args[0]
            .as_str()
            .ok_or_else(|| MaltError::type_error("string", args[0].type_name()))?;
        Ok(malt_reader::read(text)?)
    });
}
