use malt_core::{check_arity, Env};

use crate::register_fn;

pub fn register(env: &Env) {
    register_fn(env, "meta", |args| {
        check_arity!(args, "meta", 1);
        Ok(args[0].meta())
    });

    register_fn(env, "with-meta", |args| {
        check_arity!(args, "with-meta", 2);
        args[0].with_meta(args[1].clone())
    });
}
