//! Lambda variable bindings

use crate::evaluator::Value;
use std::fmt;
use std::rc::Rc;

/// Immutable name → value bindings visible inside a lambda body
///
/// Extending an environment layers a new frame over the existing one and returns a new
/// handle; the original stays untouched, so closures can keep their defining scope.
/// Lookups are case-insensitive and the innermost binding wins.
#[derive(Clone, Default)]
pub struct Environment {
    head: Option<Rc<Frame>>,
}

struct Frame {
    bindings: Vec<(String, Value)>,
    parent: Option<Rc<Frame>>,
}

impl Environment {
    /// The empty top-level environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut frame = self.head.as_deref();
        while let Some(current) = frame {
            let found = current
                .bindings
                .iter()
                .rev()
                .find(|(key, _)| key.eq_ignore_ascii_case(name));
            if let Some((_, value)) = found {
                return Some(value);
            }
            frame = current.parent.as_deref();
        }
        None
    }

    /// Whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// A new environment with one more binding
    pub fn with(&self, name: impl Into<String>, value: Value) -> Self {
        self.extend([(name.into(), value)])
    }

    /// A new environment with a frame of bindings layered over this one
    pub fn extend(&self, bindings: impl IntoIterator<Item = (String, Value)>) -> Self {
        let bindings: Vec<_> = bindings.into_iter().collect();
        if bindings.is_empty() {
            return self.clone();
        }
        Self {
            head: Some(Rc::new(Frame {
                bindings,
                parent: self.head.clone(),
            })),
        }
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Visible bindings, innermost first, shadowed names omitted
    fn visible(&self) -> Vec<(&str, &Value)> {
        let mut seen: Vec<(&str, &Value)> = Vec::new();
        let mut frame = self.head.as_deref();
        while let Some(current) = frame {
            for (name, value) in current.bindings.iter().rev() {
                if !seen.iter().any(|(n, _)| n.eq_ignore_ascii_case(name)) {
                    seen.push((name, value));
                }
            }
            frame = current.parent.as_deref();
        }
        seen
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.visible()).finish()
    }
}
