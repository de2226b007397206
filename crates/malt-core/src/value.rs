use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lasso::{Rodeo, Spur};

use crate::context::EvalContext;
use crate::critbit::CritMap;
use crate::env::Env;
use crate::error::MaltError;
use crate::printer::Printer;

thread_local! {
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
}

/// Intern a string, returning a Spur key.
pub fn intern(s: &str) -> Spur {
    INTERNER.with(|r| r.borrow_mut().get_or_intern(s))
}

/// Resolve a Spur key back to a String.
pub fn resolve(spur: Spur) -> String {
    INTERNER.with(|r| r.borrow().resolve(&spur).to_string())
}

/// Resolve a Spur and call f with the &str, avoiding allocation.
pub fn with_resolved<F, R>(spur: Spur, f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    INTERNER.with(|r| {
        let interner = r.borrow();
        f(interner.resolve(&spur))
    })
}

/// A native function callable from Malt.
pub type NativeFnInner = dyn Fn(&EvalContext, &[Value]) -> Result<Value, MaltError>;

pub struct NativeFn {
    pub name: String,
    pub func: Rc<NativeFnInner>,
    pub meta: Value,
}

impl NativeFn {
    pub fn simple(
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, MaltError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(move |_ctx, args| f(args)),
            meta: Value::Nil,
        }
    }

    pub fn with_ctx(
        name: impl Into<String>,
        f: impl Fn(&EvalContext, &[Value]) -> Result<Value, MaltError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(f),
            meta: Value::Nil,
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native-fn {}>", self.name)
    }
}

/// One entry of a closure's parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Name(Spur),
    /// The `&` marker: the following name receives the remaining arguments.
    Variadic,
}

/// A user-defined function or macro.
#[derive(Debug, Clone)]
pub struct Closure {
    pub params: Rc<[Param]>,
    pub body: Value,
    pub env: Env,
    pub is_macro: bool,
    pub meta: Value,
}

/// Metadata slot carried by collections. `None` reads as `nil`.
pub type Meta = Option<Rc<Value>>;

/// The core Value type for all Malt data.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Rc<str>),
    Symbol(Spur),
    Keyword(Spur),
    List(Rc<Vec<Value>>, Meta),
    Vector(Rc<Vec<Value>>, Meta),
    Map(Rc<CritMap>, Meta),
    Atom(Rc<RefCell<Value>>),
    Closure(Rc<Closure>),
    Builtin(Rc<NativeFn>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Keyword(_) => "keyword",
            Value::List(..) => "list",
            Value::Vector(..) => "vector",
            Value::Map(..) => "map",
            Value::Atom(_) => "atom",
            Value::Closure(c) if c.is_macro => "macro",
            Value::Closure(_) => "function",
            Value::Builtin(_) => "builtin",
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Value::Closure(c) if c.is_macro)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<String> {
        match self {
            Value::Symbol(s) => Some(resolve(*s)),
            _ => None,
        }
    }

    pub fn as_symbol_spur(&self) -> Option<Spur> {
        match self {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_keyword_spur(&self) -> Option<Spur> {
        match self {
            Value::Keyword(s) => Some(*s),
            _ => None,
        }
    }

    /// True for a symbol spelled exactly `name`.
    pub fn is_symbol(&self, name: &str) -> bool {
        match self {
            Value::Symbol(s) => with_resolved(*s, |sym| sym == name),
            _ => false,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v, _) => Some(v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(v, _) => Some(v),
            _ => None,
        }
    }

    /// Items of a list or a vector.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(v, _) | Value::Vector(v, _) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&CritMap> {
        match self {
            Value::Map(m, _) => Some(m),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&Rc<RefCell<Value>>> {
        match self {
            Value::Atom(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Rc<Closure>> {
        match self {
            Value::Closure(c) => Some(c),
            _ => None,
        }
    }

    pub fn nil() -> Value {
        Value::Nil
    }

    pub fn bool(b: bool) -> Value {
        Value::Bool(b)
    }

    pub fn int(n: i64) -> Value {
        Value::Int(n)
    }

    pub fn float(f: f64) -> Value {
        Value::Float(f)
    }

    pub fn string(s: &str) -> Value {
        Value::String(Rc::from(s))
    }

    pub fn symbol(s: &str) -> Value {
        Value::Symbol(intern(s))
    }

    pub fn keyword(s: &str) -> Value {
        Value::Keyword(intern(s))
    }

    pub fn list(v: Vec<Value>) -> Value {
        Value::List(Rc::new(v), None)
    }

    pub fn vector(v: Vec<Value>) -> Value {
        Value::Vector(Rc::new(v), None)
    }

    pub fn map(m: CritMap) -> Value {
        Value::Map(Rc::new(m), None)
    }

    pub fn atom(v: Value) -> Value {
        Value::Atom(Rc::new(RefCell::new(v)))
    }

    pub fn closure(c: Closure) -> Value {
        Value::Closure(Rc::new(c))
    }

    pub fn native_fn(f: NativeFn) -> Value {
        Value::Builtin(Rc::new(f))
    }

    pub fn meta(&self) -> Value {
        match self {
            Value::List(_, m) | Value::Vector(_, m) | Value::Map(_, m) => {
                m.as_deref().cloned().unwrap_or(Value::Nil)
            }
            Value::Closure(c) => c.meta.clone(),
            Value::Builtin(f) => f.meta.clone(),
            _ => Value::Nil,
        }
    }

    /// Shallow copy carrying `meta`. The original is untouched.
    pub fn with_meta(&self, meta: Value) -> Result<Value, MaltError> {
        let slot = Some(Rc::new(meta.clone()));
        match self {
            Value::List(items, _) => Ok(Value::List(Rc::clone(items), slot)),
            Value::Vector(items, _) => Ok(Value::Vector(Rc::clone(items), slot)),
            Value::Map(map, _) => Ok(Value::Map(Rc::clone(map), slot)),
            Value::Closure(c) => Ok(Value::Closure(Rc::new(Closure {
                meta,
                ..(**c).clone()
            }))),
            Value::Builtin(f) => Ok(Value::Builtin(Rc::new(NativeFn {
                name: f.name.clone(),
                func: Rc::clone(&f.func),
                meta,
            }))),
            other => Err(MaltError::type_error(
                "collection or function",
                other.type_name(),
            )),
        }
    }

    /// Pointer identity for reference-backed values; plain equality for leaves.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a, _), Value::List(b, _)) | (Value::Vector(a, _), Value::Vector(b, _)) => {
                Rc::ptr_eq(a, b)
            }
            (Value::Map(a, _), Value::Map(b, _)) => Rc::ptr_eq(a, b),
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Atom(a), Value::Atom(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Nil, Value::Nil)
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Int(_), Value::Int(_))
            | (Value::Symbol(_), Value::Symbol(_))
            | (Value::Keyword(_), Value::Keyword(_)) => self == other,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (
                Value::List(a, _) | Value::Vector(a, _),
                Value::List(b, _) | Value::Vector(b, _),
            ) => Rc::ptr_eq(a, b) || a == b,
            (Value::Map(a, _), Value::Map(b, _)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Atom(a), Value::Atom(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::readable(self).fmt(f)
    }
}
