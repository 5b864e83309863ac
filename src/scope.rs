//! Scoped producer bindings with hierarchical fallback.
//!
//! A [`Scope`] maps string keys to [`Producer`] functions and carries an
//! optional parent for fallback lookup, forming a tree rooted at the default
//! scope. Scopes are never deleted once created; they live for the process
//! lifetime.

use crate::command::BoxedCommand;
use crate::error::ShapeError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod registry;

pub use registry::{EnterScopeCommand, RegisterCommand, ScopeContext, ScopeRegistry};

/// Typed parameter passed to a producer on resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
    Vector(Vec<i64>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[i64]> {
        match self {
            Value::Vector(vector) => Some(vector),
            _ => None,
        }
    }
}

/// Typed result of invoking a producer.
///
/// The closed set of shapes producers actually yield: a unit of work or a
/// plain value. Callers assert the expected shape via the `into_*` accessors;
/// a mismatch is a programming error reported as [`ShapeError`].
pub enum Resolved {
    Command(BoxedCommand),
    Int(i64),
    Vector(Vec<i64>),
}

impl Resolved {
    pub fn shape(&self) -> &'static str {
        match self {
            Resolved::Command(_) => "command",
            Resolved::Int(_) => "int",
            Resolved::Vector(_) => "vector",
        }
    }

    pub fn into_command(self) -> Result<BoxedCommand, ShapeError> {
        match self {
            Resolved::Command(command) => Ok(command),
            other => Err(ShapeError::UnsupportedShape {
                expected: "command",
                actual: other.shape(),
            }),
        }
    }

    pub fn into_int(self) -> Result<i64, ShapeError> {
        match self {
            Resolved::Int(value) => Ok(value),
            other => Err(ShapeError::UnsupportedShape {
                expected: "int",
                actual: other.shape(),
            }),
        }
    }

    pub fn into_vector(self) -> Result<Vec<i64>, ShapeError> {
        match self {
            Resolved::Vector(vector) => Ok(vector),
            other => Err(ShapeError::UnsupportedShape {
                expected: "vector",
                actual: other.shape(),
            }),
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Command(_) => f.write_str("Resolved::Command(..)"),
            Resolved::Int(value) => write!(f, "Resolved::Int({value})"),
            Resolved::Vector(vector) => write!(f, "Resolved::Vector({vector:?})"),
        }
    }
}

/// Function registered under a key, invoked with the caller's parameters on
/// each resolution.
pub type Producer = Arc<dyn Fn(&[Value]) -> Resolved + Send + Sync>;

/// Wrap a closure into a [`Producer`].
pub fn producer<F>(f: F) -> Producer
where
    F: Fn(&[Value]) -> Resolved + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A registry of key -> producer bindings with one parent for fallback.
pub struct Scope {
    bindings: RwLock<HashMap<String, Producer>>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    /// The default (root) scope has no parent.
    pub(crate) fn root() -> Arc<Scope> {
        Arc::new(Scope {
            bindings: RwLock::new(HashMap::new()),
            parent: None,
        })
    }

    /// Child scopes fix their parent at creation time.
    pub(crate) fn child(parent: Arc<Scope>) -> Arc<Scope> {
        Arc::new(Scope {
            bindings: RwLock::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Store a producer under `key` in this exact scope, overwriting any
    /// prior binding for that key here (ancestors are untouched).
    pub fn bind(&self, key: impl Into<String>, producer: Producer) {
        self.bindings.write().insert(key.into(), producer);
    }

    /// Look up `key` here, then along parent links; invoke the producer with
    /// `params` on the first match. `None` when no ancestor binds the key.
    pub fn resolve(&self, key: &str, params: &[Value]) -> Option<Resolved> {
        let mut scope = self;
        loop {
            // Clone the producer out so the read lock is not held while it runs.
            let hit = scope.bindings.read().get(key).cloned();
            if let Some(producer) = hit {
                return Some(producer(params));
            }
            match &scope.parent {
                Some(parent) => scope = parent,
                None => return None,
            }
        }
    }
}
