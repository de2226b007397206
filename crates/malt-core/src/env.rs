use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap as SpurMap;
use lasso::Spur;

use crate::error::MaltError;
use crate::value::{intern, resolve, Param, Value};

/// A lexical environment frame.
///
/// Cloning is cheap: the bindings table is shared, so a clone is another
/// handle onto the same frame.
#[derive(Clone)]
pub struct Env {
    pub bindings: Rc<RefCell<SpurMap<Spur, Value>>>,
    pub parent: Option<Rc<Env>>,
    /// Parameter names owned by a lambda frame. `None` for ordinary frames.
    own: Option<Rc<[Spur]>>,
}

impl Env {
    pub fn new() -> Self {
        Env {
            bindings: Rc::new(RefCell::new(SpurMap::new())),
            parent: None,
            own: None,
        }
    }

    pub fn with_parent(parent: Rc<Env>) -> Self {
        Env {
            bindings: Rc::new(RefCell::new(SpurMap::new())),
            parent: Some(parent),
            own: None,
        }
    }

    /// Frame for one closure call.
    ///
    /// Positional parameters bind in order. At `&` the next name receives the
    /// remaining arguments as a list and any names declared after it start
    /// out as `nil`.
    pub fn lambda_frame(
        outer: &Env,
        name: &str,
        params: &[Param],
        args: &[Value],
    ) -> Result<Env, MaltError> {
        let mut bindings = SpurMap::with_capacity(params.len());
        let mut own = Vec::with_capacity(params.len());
        let mut rest = args.iter();
        let mut it = params.iter();

        while let Some(param) = it.next() {
            match param {
                Param::Name(p) => {
                    let Some(arg) = rest.next() else {
                        return Err(MaltError::arity(name, arity_label(params), args.len()));
                    };
                    bindings.insert(*p, arg.clone());
                    own.push(*p);
                }
                Param::Variadic => {
                    if let Some(Param::Name(p)) = it.next() {
                        bindings.insert(*p, Value::list(rest.by_ref().cloned().collect()));
                        own.push(*p);
                    }
                    for trailing in it.by_ref() {
                        if let Param::Name(p) = trailing {
                            bindings.insert(*p, Value::Nil);
                            own.push(*p);
                        }
                    }
                }
            }
        }
        if rest.next().is_some() {
            return Err(MaltError::arity(name, arity_label(params), args.len()));
        }

        Ok(Env {
            bindings: Rc::new(RefCell::new(bindings)),
            parent: Some(Rc::new(outer.clone())),
            own: Some(own.into()),
        })
    }

    pub fn is_lambda_frame(&self) -> bool {
        self.own.is_some()
    }

    pub fn get(&self, name: Spur) -> Option<Value> {
        if let Some(val) = self.bindings.borrow().get(&name) {
            Some(val.clone())
        } else if let Some(parent) = &self.parent {
            parent.get(name)
        } else {
            None
        }
    }

    pub fn get_str(&self, name: &str) -> Option<Value> {
        self.get(intern(name))
    }

    /// Like `get`, but an unbound name is an error.
    pub fn lookup(&self, name: Spur) -> Result<Value, MaltError> {
        self.get(name)
            .ok_or_else(|| MaltError::Unbound(resolve(name)))
    }

    /// Bind in this frame only.
    pub fn define(&self, name: Spur, val: Value) {
        self.bindings.borrow_mut().insert(name, val);
    }

    pub fn define_str(&self, name: &str, val: Value) {
        self.define(intern(name), val);
    }

    /// Bind as `def!` does. A lambda frame keeps only its own parameters and
    /// hands every other name to the enclosing frame.
    pub fn set(&self, name: Spur, val: Value) {
        match (&self.own, &self.parent) {
            (Some(own), Some(parent)) if !own.contains(&name) => parent.set(name, val),
            _ => self.define(name, val),
        }
    }

    /// The outermost frame of the chain.
    pub fn root(&self) -> Env {
        let mut current = self.clone();
        while let Some(parent) = current.parent.clone() {
            current = (*parent).clone();
        }
        current
    }

    /// Names bound directly in this frame.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.borrow().keys().map(|k| resolve(*k)).collect();
        names.sort();
        names
    }
}

fn arity_label(params: &[Param]) -> String {
    match params.iter().position(|p| *p == Param::Variadic) {
        Some(fixed) => format!("{fixed}+"),
        None => params.len().to_string(),
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<env {} bindings>", self.bindings.borrow().len())
    }
}
