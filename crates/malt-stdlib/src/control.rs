use malt_core::{check_arity, Env, MaltError};

use crate::{register_ctx_fn, register_fn};

pub fn register(env: &Env) {
    register_fn(env, "throw", |args| {
        check_arity!(args, "throw", 1);
        tracing::trace!(value = %args[0], "throw");
        Err(MaltError::Exception(args[0].clone()))
    });

    // Always evaluates in the global environment, never the caller's.
    register_ctx_fn(env, "eval", |ctx, args| {
        check_arity!(args, "eval", 1);
        ctx.eval_global(&args[0])
    });
}
