use std::cell::Cell;
use std::rc::Rc;

use malt_core::{intern, Closure, Env, EvalContext, MaltError, Param, Spur, Value};

use crate::eval::{self, Trampoline};
use crate::quasiquote;

/// Pre-interned `Spur` handles for the special form names and the handful of
/// other symbols the evaluator matches on.
pub(crate) struct SpecialFormSpurs {
    pub def_bang: Spur,
    pub let_star: Spur,
    pub fn_star: Spur,
    pub if_: Spur,
    pub do_: Spur,
    pub quote: Spur,
    pub quasiquote: Spur,
    pub quasiquoteexpand: Spur,
    pub defmacro_bang: Spur,
    pub macroexpand: Spur,
    pub try_star: Spur,
    pub catch_star: Spur,
    pub while_: Spur,
    pub and: Spur,
    pub or: Spur,
    pub set: Spur,
    pub bound: Spur,

    // Symbols produced or consumed by quasiquote expansion
    pub unquote: Spur,
    pub splice_unquote: Spur,
    pub cons: Spur,
    pub concat: Spur,
    pub vec: Spur,

    pub ampersand: Spur,
    pub debug_eval: Spur,
}

impl SpecialFormSpurs {
    fn init() -> Self {
        Self {
            def_bang: intern("def!"),
            let_star: intern("let*"),
            fn_star: intern("fn*"),
            if_: intern("if"),
            do_: intern("do"),
            quote: intern("quote"),
            quasiquote: intern("quasiquote"),
            quasiquoteexpand: intern("quasiquoteexpand"),
            defmacro_bang: intern("defmacro!"),
            macroexpand: intern("macroexpand"),
            try_star: intern("try*"),
            catch_star: intern("catch*"),
            while_: intern("while"),
            and: intern("and"),
            or: intern("or"),
            set: intern("set"),
            bound: intern("bound?"),

            unquote: intern("unquote"),
            splice_unquote: intern("splice-unquote"),
            cons: intern("cons"),
            concat: intern("concat"),
            vec: intern("vec"),

            ampersand: intern("&"),
            debug_eval: intern("DEBUG-EVAL"),
        }
    }
}

thread_local! {
    static SF: Cell<Option<&'static SpecialFormSpurs>> = const { Cell::new(None) };
}

pub(crate) fn special_forms() -> &'static SpecialFormSpurs {
    SF.with(|cell| match cell.get() {
        Some(sf) => sf,
        None => {
            let sf: &'static SpecialFormSpurs = Box::leak(Box::new(SpecialFormSpurs::init()));
            cell.set(Some(sf));
            sf
        }
    })
}

/// Every special form name the evaluator recognizes.
pub const SPECIAL_FORM_NAMES: &[&str] = &[
    "and",
    "bound?",
    "def!",
    "defmacro!",
    "do",
    "fn*",
    "if",
    "let*",
    "macroexpand",
    "or",
    "quasiquote",
    "quasiquoteexpand",
    "quote",
    "set",
    "try*",
    "while",
];

/// Evaluate a special form. Returns Some(result) if the head is a special form, None otherwise.
pub fn try_eval_special(
    head_spur: Spur,
    args: &[Value],
    env: &Env,
    ctx: &EvalContext,
) -> Option<Result<Trampoline, MaltError>> {
    let sf = special_forms();

    if head_spur == sf.if_ {
        Some(eval_if(args, env, ctx))
    } else if head_spur == sf.def_bang {
        Some(eval_def(args, env, ctx))
    } else if head_spur == sf.let_star {
        Some(eval_let_star(args, env, ctx))
    } else if head_spur == sf.do_ {
        Some(eval_do(args, env, ctx))
    } else if head_spur == sf.fn_star {
        Some(eval_fn(args, env))
    } else if head_spur == sf.quote {
        Some(eval_quote(args))
    } else if head_spur == sf.quasiquote {
        Some(eval_quasiquote(args, env))
    } else if head_spur == sf.quasiquoteexpand {
        Some(eval_quasiquoteexpand(args))
    } else if head_spur == sf.defmacro_bang {
        Some(eval_defmacro(args, env, ctx))
    } else if head_spur == sf.macroexpand {
        Some(eval_macroexpand(args, env, ctx))
    } else if head_spur == sf.try_star {
        Some(eval_try(args, env, ctx))
    } else if head_spur == sf.while_ {
        Some(eval_while(args, env, ctx))
    } else if head_spur == sf.and {
        Some(eval_and_or("and", false, args, env, ctx))
    } else if head_spur == sf.or {
        Some(eval_and_or("or", true, args, env, ctx))
    } else if head_spur == sf.set {
        Some(eval_set(args, env, ctx))
    } else if head_spur == sf.bound {
        Some(eval_bound(args, env))
    } else {
        None
    }
}

fn symbol_arg(form: &str, v: &Value) -> Result<Spur, MaltError> {
    v.as_symbol_spur()
        .ok_or_else(|| MaltError::type_error(format!("{form}: symbol"), v.type_name()))
}

fn eval_quote(args: &[Value]) -> Result<Trampoline, MaltError> {
    if args.len() != 1 {
        return Err(MaltError::arity("quote", "1", args.len()));
    }
    Ok(Trampoline::Value(args[0].clone()))
}

fn eval_if(args: &[Value], env: &Env, ctx: &EvalContext) -> Result<Trampoline, MaltError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(MaltError::arity("if", "2 or 3", args.len()));
    }
    let cond = eval::eval_value(ctx, &args[0], env)?;
    if cond.is_truthy() {
        Ok(Trampoline::Eval(args[1].clone(), env.clone()))
    } else if args.len() == 3 {
        Ok(Trampoline::Eval(args[2].clone(), env.clone()))
    } else {
        Ok(Trampoline::Value(Value::nil()))
    }
}

/// (def! name expr) or (def! a 1 b 2 ...): bind through `Env::set`, returning
/// the last value.
fn eval_def(args: &[Value], env: &Env, ctx: &EvalContext) -> Result<Trampoline, MaltError> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(MaltError::arity("def!", "2, 4, ...", args.len()));
    }
    let mut last = Value::nil();
    for pair in args.chunks(2) {
        let spur = symbol_arg("def!", &pair[0])?;
        last = eval::eval_value(ctx, &pair[1], env)?;
        tracing::trace!(name = %pair[0], "def!");
        env.set(spur, last.clone());
    }
    Ok(Trampoline::Value(last))
}

fn eval_let_star(args: &[Value], env: &Env, ctx: &EvalContext) -> Result<Trampoline, MaltError> {
    if args.len() != 2 {
        return Err(MaltError::arity("let*", "2", args.len()));
    }
    let bindings = args[0]
        .as_seq()
        .ok_or_else(|| MaltError::type_error("let*: list or vector", args[0].type_name()))?;
    if bindings.len() % 2 != 0 {
        return Err(MaltError::eval("let*: bindings must come in name/value pairs"));
    }

    let new_env = Env::with_parent(Rc::new(env.clone()));
    for pair in bindings.chunks(2) {
        let spur = symbol_arg("let*", &pair[0])?;
        let val = eval::eval_value(ctx, &pair[1], &new_env)?;
        new_env.define(spur, val);
    }
    Ok(Trampoline::Eval(args[1].clone(), new_env))
}

fn eval_do(args: &[Value], env: &Env, ctx: &EvalContext) -> Result<Trampoline, MaltError> {
    let Some((last, init)) = args.split_last() else {
        return Err(MaltError::arity("do", "1+", 0));
    };
    for expr in init {
        eval::eval_value(ctx, expr, env)?;
    }
    Ok(Trampoline::Eval(last.clone(), env.clone()))
}

/// Parse a `fn*` parameter list. `&` must be followed by exactly one name;
/// anything after that name is bound to nil when the closure runs.
pub(crate) fn parse_params(list: &Value) -> Result<Rc<[Param]>, MaltError> {
    let sf = special_forms();
    let items = list
        .as_seq()
        .ok_or_else(|| MaltError::type_error("fn*: parameter list", list.type_name()))?;
    let mut params = Vec::with_capacity(items.len());
    let mut seen_rest = false;
    for (i, item) in items.iter().enumerate() {
        let spur = symbol_arg("fn*", item)?;
        if spur == sf.ampersand {
            if seen_rest {
                return Err(MaltError::eval("fn*: '&' may appear only once"));
            }
            if items.get(i + 1).and_then(Value::as_symbol_spur).is_none() {
                return Err(MaltError::eval("fn*: '&' must be followed by a name"));
            }
            seen_rest = true;
            params.push(Param::Variadic);
        } else {
            params.push(Param::Name(spur));
        }
    }
    Ok(params.into())
}

fn eval_fn(args: &[Value], env: &Env) -> Result<Trampoline, MaltError> {
    if args.len() != 2 {
        return Err(MaltError::arity("fn*", "2", args.len()));
    }
    let params = parse_params(&args[0])?;
    Ok(Trampoline::Value(Value::closure(Closure {
        params,
        body: args[1].clone(),
        env: env.clone(),
        is_macro: false,
        meta: Value::Nil,
    })))
}

fn eval_quasiquote(args: &[Value], env: &Env) -> Result<Trampoline, MaltError> {
    if args.len() != 1 {
        return Err(MaltError::arity("quasiquote", "1", args.len()));
    }
    Ok(Trampoline::Eval(quasiquote::expand(&args[0])?, env.clone()))
}

fn eval_quasiquoteexpand(args: &[Value]) -> Result<Trampoline, MaltError> {
    if args.len() != 1 {
        return Err(MaltError::arity("quasiquoteexpand", "1", args.len()));
    }
    Ok(Trampoline::Value(quasiquote::expand(&args[0])?))
}

/// (defmacro! name fn-expr): bind a macro-marked copy of the closure.
fn eval_defmacro(args: &[Value], env: &Env, ctx: &EvalContext) -> Result<Trampoline, MaltError> {
    if args.len() != 2 {
        return Err(MaltError::arity("defmacro!", "2", args.len()));
    }
    let spur = symbol_arg("defmacro!", &args[0])?;
    let val = eval::eval_value(ctx, &args[1], env)?;
    let Value::Closure(closure) = &val else {
        return Err(MaltError::type_error("defmacro!: function", val.type_name()));
    };
    let mac = Value::closure(Closure {
        is_macro: true,
        ..(**closure).clone()
    });
    tracing::debug!(name = %args[0], "macro defined");
    env.set(spur, mac.clone());
    Ok(Trampoline::Value(mac))
}

/// (macroexpand form): expand `form` until its head is no longer a macro.
/// The form itself is not evaluated first.
fn eval_macroexpand(args: &[Value], env: &Env, ctx: &EvalContext) -> Result<Trampoline, MaltError> {
    if args.len() != 1 {
        return Err(MaltError::arity("macroexpand", "1", args.len()));
    }
    Ok(Trampoline::Value(eval::macroexpand(ctx, &args[0], env)?))
}

/// (try* body (catch* name handler))
fn eval_try(args: &[Value], env: &Env, ctx: &EvalContext) -> Result<Trampoline, MaltError> {
    let sf = special_forms();
    if args.is_empty() || args.len() > 2 {
        return Err(MaltError::arity("try*", "1 or 2", args.len()));
    }

    let Some(clause) = args.get(1) else {
        return Ok(Trampoline::Eval(args[0].clone(), env.clone()));
    };
    let parts = clause
        .as_list()
        .filter(|parts| parts.first().and_then(Value::as_symbol_spur) == Some(sf.catch_star))
        .ok_or_else(|| MaltError::eval("try*: second argument must be (catch* name handler)"))?;
    if parts.len() != 3 {
        return Err(MaltError::arity("catch*", "2", parts.len() - 1));
    }
    let catch_var = symbol_arg("catch*", &parts[1])?;

    match eval::eval_value(ctx, &args[0], env) {
        Ok(val) => Ok(Trampoline::Value(val)),
        Err(err) => match err.caught_value(ctx.policy) {
            Some(payload) => {
                tracing::debug!(error = %err, "caught by try*");
                let catch_env = Env::with_parent(Rc::new(env.clone()));
                catch_env.define(catch_var, payload);
                Ok(Trampoline::Eval(parts[2].clone(), catch_env))
            }
            None => Err(err),
        },
    }
}

/// (while test body): pre-tested loop, value of the last body run or nil.
fn eval_while(args: &[Value], env: &Env, ctx: &EvalContext) -> Result<Trampoline, MaltError> {
    if args.len() != 2 {
        return Err(MaltError::arity("while", "2", args.len()));
    }
    let mut last = Value::nil();
    while eval::eval_value(ctx, &args[0], env)?.is_truthy() {
        last = eval::eval_value(ctx, &args[1], env)?;
    }
    Ok(Trampoline::Value(last))
}

/// (and a b ...) / (or a b ...): evaluate left to right, stopping at the
/// first operand whose truthiness equals `stop_on`. Always a boolean.
fn eval_and_or(
    name: &str,
    stop_on: bool,
    args: &[Value],
    env: &Env,
    ctx: &EvalContext,
) -> Result<Trampoline, MaltError> {
    if args.len() < 2 {
        return Err(MaltError::arity(name, "2+", args.len()));
    }
    for arg in args {
        if eval::eval_value(ctx, arg, env)?.is_truthy() == stop_on {
            return Ok(Trampoline::Value(Value::bool(stop_on)));
        }
    }
    Ok(Trampoline::Value(Value::bool(!stop_on)))
}

/// (set name expr): rebind like a single `def!` pair.
fn eval_set(args: &[Value], env: &Env, ctx: &EvalContext) -> Result<Trampoline, MaltError> {
    if args.len() != 2 {
        return Err(MaltError::arity("set", "2", args.len()));
    }
    let spur = symbol_arg("set", &args[0])?;
    let val = eval::eval_value(ctx, &args[1], env)?;
    env.set(spur, val.clone());
    Ok(Trampoline::Value(val))
}

/// (bound? name): whether the unevaluated symbol resolves from here.
fn eval_bound(args: &[Value], env: &Env) -> Result<Trampoline, MaltError> {
    if args.len() != 1 {
        return Err(MaltError::arity("bound?", "1", args.len()));
    }
    let bound = args[0]
        .as_symbol_spur()
        .is_some_and(|spur| env.get(spur).is_some());
    Ok(Trampoline::Value(Value::bool(bound)))
}
