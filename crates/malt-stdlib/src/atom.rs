use std::cell::RefCell;
use std::rc::Rc;

use malt_core::{check_arity, Env, MaltError, Value};

use crate::{register_ctx_fn, register_fn};

fn atom_arg<'a>(name: &str, v: &'a Value) -> Result<&'a Rc<RefCell<Value>>, MaltError> {
    v.as_atom()
        .ok_or_else(|| MaltError::type_error(format!("{name}: atom"), v.type_name()))
}

pub fn register(env: &Env) {
    register_fn(env, "atom", |args| {
        check_arity!(args, "atom", 1);
        Ok(Value::atom(args[0].clone()))
    });

    register_fn(env, "atom?", |args| {
        check_arity!(args, "atom?", 1);
        Ok(Value::Bool(args[0].as_atom().is_some()))
    });

    register_fn(env, "deref", |args| {
        check_arity!(args, "deref", 1);
        Ok(atom_arg("deref", &args[0])?.borrow().clone())
    });

    register_fn(env, "reset!", |args| {
        check_arity!(args, "reset!", 2);
        *atom_arg("reset!", &args[0])?.borrow_mut() = args[1].clone();
        Ok(args[1].clone())
    });

    // (swap! a f extra...) stores (f @a extra...)
    register_ctx_fn(env, "swap!", |ctx, args| {
        check_arity!(args, "swap!", 2..);
        let cell = atom_arg("swap!", &args[0])?;
        let mut call_args = Vec::with_capacity(args.len() - 1);
        call_args.push(cell.borrow().clone());
        call_args.extend_from_slice(&args[2..]);
        let updated = ctx.apply(&args[1], &call_args)?;
        *cell.borrow_mut() = updated.clone();
        Ok(updated)
    });
}
