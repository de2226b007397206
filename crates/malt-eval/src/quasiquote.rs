//! Quasiquote expansion into `cons`/`concat`/`vec` constructor calls.

use malt_core::{resolve, MaltError, Spur, Value};

use crate::special_forms::special_forms;

/// Expand a quasiquoted form into code that rebuilds it at runtime.
pub fn expand(form: &Value) -> Result<Value, MaltError> {
    let sf = special_forms();
    match form {
        Value::List(items, _) => {
            if let Some(x) = tagged(items, sf.unquote)? {
                return Ok(x.clone());
            }
            expand_seq(items)
        }
        Value::Vector(items, _) => Ok(call(sf.vec, vec![expand_seq(items)?])),
        Value::Symbol(_) | Value::Map(..) => Ok(call(sf.quote, vec![form.clone()])),
        other => Ok(other.clone()),
    }
}

/// Right-to-left fold over `items`, seeded with the empty list.
fn expand_seq(items: &[Value]) -> Result<Value, MaltError> {
    let sf = special_forms();
    let mut acc = Value::list(vec![]);
    for elt in items.iter().rev() {
        let spliced = match elt {
            Value::List(inner, _) => tagged(inner, sf.splice_unquote)?,
            _ => None,
        };
        acc = match spliced {
            Some(x) => call(sf.concat, vec![x.clone(), acc]),
            None => call(sf.cons, vec![expand(elt)?, acc]),
        };
    }
    Ok(acc)
}

/// If `items` is `(tag x)`, return `x`. A matching head with the wrong number
/// of operands is an arity error.
fn tagged(items: &[Value], tag: Spur) -> Result<Option<&Value>, MaltError> {
    match items.first().and_then(Value::as_symbol_spur) {
        Some(head) if head == tag => {
            if items.len() != 2 {
                return Err(MaltError::arity(resolve(tag), "1", items.len() - 1));
            }
            Ok(Some(&items[1]))
        }
        _ => Ok(None),
    }
}

fn call(head: Spur, mut args: Vec<Value>) -> Value {
    args.insert(0, Value::Symbol(head));
    Value::list(args)
}
