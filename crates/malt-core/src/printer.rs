use std::cell::RefCell;
use std::fmt;
use std::ptr;

use crate::value::{with_resolved, Value};

/// Render `value` as text. Readable output re-reads to an equal value.
pub fn pr_str(value: &Value, readably: bool) -> String {
    Printer { value, readably, trail: None }.to_string()
}

/// Atoms currently being printed, innermost first. An atom that contains
/// itself prints as `(atom ...)` at the point it recurs.
struct AtomTrail<'a> {
    cell: &'a RefCell<Value>,
    outer: Option<&'a AtomTrail<'a>>,
}

impl AtomTrail<'_> {
    fn contains(&self, cell: &RefCell<Value>) -> bool {
        ptr::eq(self.cell, cell) || self.outer.is_some_and(|o| o.contains(cell))
    }
}

/// `Display` adapter over a value in either print mode.
pub struct Printer<'a> {
    value: &'a Value,
    readably: bool,
    trail: Option<&'a AtomTrail<'a>>,
}

impl<'a> Printer<'a> {
    pub fn readable(value: &'a Value) -> Self {
        Printer {
            value,
            readably: true,
            trail: None,
        }
    }

    pub fn raw(value: &'a Value) -> Self {
        Printer {
            value,
            readably: false,
            trail: None,
        }
    }

    fn nested(&self, value: &'a Value) -> Self {
        Printer {
            value,
            readably: self.readably,
            trail: self.trail,
        }
    }

    fn seq(&self, f: &mut fmt::Formatter<'_>, items: &'a [Value], open: &str, close: &str) -> fmt::Result {
        f.write_str(open)?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", self.nested(item))?;
        }
        f.write_str(close)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Printer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{n}")
                }
            }
            Value::String(s) if self.readably => write_escaped(f, s),
            Value::String(s) => f.write_str(s),
            Value::Symbol(s) => with_resolved(*s, |name| f.write_str(name)),
            Value::Keyword(s) => with_resolved(*s, |name| write!(f, ":{name}")),
            Value::List(items, _) => self.seq(f, items, "(", ")"),
            Value::Vector(items, _) => self.seq(f, items, "[", "]"),
            Value::Map(map, _) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{} {}", self.nested(k), self.nested(v))?;
                }
                f.write_str("}")
            }
            Value::Atom(cell) => {
                if self.trail.is_some_and(|t| t.contains(cell)) {
                    return f.write_str("(atom ...)");
                }
                let trail = AtomTrail {
                    cell: &**cell,
                    outer: self.trail,
                };
                let inner = cell.borrow();
                let printer = Printer {
                    value: &inner,
                    readably: self.readably,
                    trail: Some(&trail),
                };
                write!(f, "(atom {printer})")
            }
            Value::Closure(c) if c.is_macro => write!(f, "#<macro>"),
            Value::Closure(_) => write!(f, "#<function>"),
            Value::Builtin(n) => write!(f, "#<builtin {}>", n.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critbit::CritMap;
    use crate::value::NativeFn;

    #[test]
    fn scalars() {
        assert_eq!(pr_str(&Value::Nil, true), "nil");
        assert_eq!(pr_str(&Value::bool(true), true), "true");
        assert_eq!(pr_str(&Value::int(-7), true), "-7");
        assert_eq!(pr_str(&Value::float(2.0), true), "2.0");
        assert_eq!(pr_str(&Value::float(2.5), true), "2.5");
        assert_eq!(pr_str(&Value::keyword("k"), true), ":k");
        assert_eq!(pr_str(&Value::symbol("sym"), true), "sym");
    }

    #[test]
    fn strings_escape_only_when_readable() {
        let s = Value::string("a\"b\\c\nd");
        assert_eq!(pr_str(&s, true), r#""a\"b\\c\nd""#);
        assert_eq!(pr_str(&s, false), "a\"b\\c\nd");
    }

    #[test]
    fn collections() {
        let list = Value::list(vec![Value::int(1), Value::string("x")]);
        let vector = Value::vector(vec![Value::int(1), list.clone()]);
        assert_eq!(pr_str(&list, true), r#"(1 "x")"#);
        assert_eq!(pr_str(&list, false), "(1 x)");
        assert_eq!(pr_str(&vector, true), r#"[1 (1 "x")]"#);
        assert_eq!(pr_str(&Value::list(vec![]), true), "()");
    }

    #[test]
    fn maps_print_in_key_order() {
        let map = CritMap::from_pairs(vec![
            (Value::keyword("b"), Value::int(2)),
            (Value::string("a"), Value::int(1)),
        ])
        .unwrap();
        assert_eq!(pr_str(&Value::map(map), true), r#"{"a" 1 :b 2}"#);
    }

    #[test]
    fn opaque_values() {
        let f = Value::native_fn(NativeFn::simple("car", |_| Ok(Value::Nil)));
        assert_eq!(pr_str(&f, true), "#<builtin car>");
        let atom = Value::atom(Value::string("s"));
        assert_eq!(pr_str(&atom, true), r#"(atom "s")"#);
        assert_eq!(pr_str(&atom, false), "(atom s)");
    }

    #[test]
    fn self_referencing_atom_is_cut_off() {
        let atom = Value::atom(Value::Nil);
        if let Value::Atom(cell) = &atom {
            *cell.borrow_mut() = Value::list(vec![Value::int(1), atom.clone()]);
        }
        assert_eq!(pr_str(&atom, true), "(atom (1 (atom ...)))");

        // The same atom twice side by side is not a cycle.
        let shared = Value::atom(Value::int(5));
        let pair = Value::vector(vec![shared.clone(), shared]);
        assert_eq!(pr_str(&pair, true), "[(atom 5) (atom 5)]");
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(Value::string("q").to_string(), "\"q\"");
    }
}
