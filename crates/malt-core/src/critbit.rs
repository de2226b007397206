//! Persistent crit-bit (PATRICIA) trie used for Malt hash-maps.
//!
//! Keys are strings or keywords. Each key is encoded as a tag byte (`0` for
//! strings, `1` for keywords) followed by its UTF-8 bytes, so `"a"` and `:a`
//! never collide. Every encoded byte contributes nine bits: a presence bit
//! (always 1) followed by the eight data bits, most significant first. Bits
//! past the end of a key read as 0, which places a key before any key it is a
//! prefix of and makes in-order traversal match byte order.
//!
//! Updates copy only the path from the root to the touched leaf; every other
//! subtree is shared with the map the update started from.

use std::fmt;
use std::rc::Rc;

use crate::error::MaltError;
use crate::value::{with_resolved, Value};

const STRING_TAG: u8 = 0;
const KEYWORD_TAG: u8 = 1;

enum Node {
    Leaf {
        bytes: Box<[u8]>,
        key: Value,
        val: Value,
    },
    Branch {
        crit: usize,
        left: Rc<Node>,
        right: Rc<Node>,
    },
}

/// Immutable map from string/keyword keys to values.
#[derive(Clone, Default)]
pub struct CritMap {
    root: Option<Rc<Node>>,
    len: usize,
}

/// Encode a map key, or fail for anything that is not a string or keyword.
pub fn encode_key(key: &Value) -> Result<Vec<u8>, MaltError> {
    match key {
        Value::String(s) => {
            let mut out = Vec::with_capacity(s.len() + 1);
            out.push(STRING_TAG);
            out.extend_from_slice(s.as_bytes());
            Ok(out)
        }
        Value::Keyword(k) => Ok(with_resolved(*k, |name| {
            let mut out = Vec::with_capacity(name.len() + 1);
            out.push(KEYWORD_TAG);
            out.extend_from_slice(name.as_bytes());
            out
        })),
        other => Err(MaltError::type_error("string or keyword", other.type_name())),
    }
}

fn bit(key: &[u8], index: usize) -> bool {
    let (pos, sub) = (index / 9, index % 9);
    match key.get(pos) {
        None => false,
        Some(_) if sub == 0 => true,
        Some(b) => (b >> (8 - sub)) & 1 == 1,
    }
}

/// Index of the first bit at which `a` and `b` differ.
fn critical_bit(a: &[u8], b: &[u8]) -> Option<usize> {
    let shared = a.len().min(b.len());
    for pos in 0..shared {
        let diff = a[pos] ^ b[pos];
        if diff != 0 {
            return Some(pos * 9 + 1 + diff.leading_zeros() as usize);
        }
    }
    if a.len() == b.len() {
        None
    } else {
        Some(shared * 9)
    }
}

/// The leaf reached by following `key`'s bits: its encoded key and value.
fn nearest<'a>(mut node: &'a Node, key: &[u8]) -> (&'a [u8], &'a Value) {
    loop {
        match node {
            Node::Branch { crit, left, right } => {
                node = if bit(key, *crit) { right } else { left };
            }
            Node::Leaf { bytes, val, .. } => return (bytes, val),
        }
    }
}

fn leaf(bytes: Vec<u8>, key: Value, val: Value) -> Rc<Node> {
    Rc::new(Node::Leaf {
        bytes: bytes.into_boxed_slice(),
        key,
        val,
    })
}

fn branch(crit: usize, left: Rc<Node>, right: Rc<Node>) -> Rc<Node> {
    Rc::new(Node::Branch { crit, left, right })
}

fn insert_at(node: &Rc<Node>, bytes: &[u8], crit: usize, new_leaf: Rc<Node>) -> Rc<Node> {
    match &**node {
        Node::Branch {
            crit: c,
            left,
            right,
        } if *c < crit => {
            if bit(bytes, *c) {
                branch(*c, Rc::clone(left), insert_at(right, bytes, crit, new_leaf))
            } else {
                branch(*c, insert_at(left, bytes, crit, new_leaf), Rc::clone(right))
            }
        }
        _ => {
            if bit(bytes, crit) {
                branch(crit, Rc::clone(node), new_leaf)
            } else {
                branch(crit, new_leaf, Rc::clone(node))
            }
        }
    }
}

fn replace_at(node: &Rc<Node>, bytes: Vec<u8>, key: Value, val: Value) -> Rc<Node> {
    match &**node {
        Node::Branch { crit, left, right } => {
            if bit(&bytes, *crit) {
                branch(*crit, Rc::clone(left), replace_at(right, bytes, key, val))
            } else {
                branch(*crit, replace_at(left, bytes, key, val), Rc::clone(right))
            }
        }
        Node::Leaf { .. } => leaf(bytes, key, val),
    }
}

enum Removed {
    NotFound,
    Gone,
    Replaced(Rc<Node>),
}

fn remove_at(node: &Rc<Node>, bytes: &[u8]) -> Removed {
    match &**node {
        Node::Leaf { bytes: own, .. } => {
            if **own == *bytes {
                Removed::Gone
            } else {
                Removed::NotFound
            }
        }
        Node::Branch { crit, left, right } => {
            let go_right = bit(bytes, *crit);
            let (child, sibling) = if go_right { (right, left) } else { (left, right) };
            match remove_at(child, bytes) {
                Removed::NotFound => Removed::NotFound,
                Removed::Gone => Removed::Replaced(Rc::clone(sibling)),
                Removed::Replaced(n) if go_right => {
                    Removed::Replaced(branch(*crit, Rc::clone(left), n))
                }
                Removed::Replaced(n) => Removed::Replaced(branch(*crit, n, Rc::clone(right))),
            }
        }
    }
}

impl CritMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from key/value pairs. Later duplicates win.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> Result<Self, MaltError> {
        let mut map = CritMap::new();
        for (k, v) in pairs {
            map = map.insert(k, v)?;
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Look up `key`. Keys that cannot be map keys are simply absent.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let bytes = encode_key(key).ok()?;
        let root = self.root.as_deref()?;
        let (own, val) = nearest(root, &bytes);
        (own == bytes.as_slice()).then_some(val)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// A new map with `key` bound to `val`; `self` is unchanged.
    pub fn insert(&self, key: Value, val: Value) -> Result<CritMap, MaltError> {
        let bytes = encode_key(&key)?;
        let Some(root) = &self.root else {
            return Ok(CritMap {
                root: Some(leaf(bytes, key, val)),
                len: 1,
            });
        };
        let (own, _) = nearest(root, &bytes);
        Ok(match critical_bit(own, &bytes) {
            None => CritMap {
                root: Some(replace_at(root, bytes, key, val)),
                len: self.len,
            },
            Some(crit) => {
                let new_leaf = leaf(bytes.clone(), key, val);
                CritMap {
                    root: Some(insert_at(root, &bytes, crit, new_leaf)),
                    len: self.len + 1,
                }
            }
        })
    }

    /// A new map without `key`; `self` is unchanged.
    pub fn remove(&self, key: &Value) -> CritMap {
        let (Ok(bytes), Some(root)) = (encode_key(key), &self.root) else {
            return self.clone();
        };
        match remove_at(root, &bytes) {
            Removed::NotFound => self.clone(),
            Removed::Gone => CritMap::new(),
            Removed::Replaced(n) => CritMap {
                root: Some(n),
                len: self.len - 1,
            },
        }
    }

    /// Entries in encoded-key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(_, v)| v)
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Value, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop()? {
                Node::Leaf { key, val, .. } => return Some((key, val)),
                Node::Branch { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
    }
}

impl PartialEq for CritMap {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self
                .iter()
                .zip(other.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl fmt::Debug for CritMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
