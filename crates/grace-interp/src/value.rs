// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Runtime values.

use std::rc::Rc;

use grace_ast::Node;

use crate::scope::ScopeId;

/// A runtime value in the interpreter.
///
/// Everything except user objects is an immutable wrapper; user objects
/// live in the scope arena and are referenced by handle, so cloning a
/// `Value` never copies an object.
#[derive(Debug, Clone)]
pub enum Value {
    /// Number (all numbers are f64 in the interpreter)
    Number(f64),
    /// String
    String(String),
    /// Boolean
    Bool(bool),
    /// The unit/void result of statements
    Done,
    /// Sentinel for a declared but never assigned field. Distinct from
    /// every user value, including `Done`.
    Uninitialised,
    /// Block (closure)
    Block(Rc<BlockValue>),
    /// User object, a handle into the scope arena
    Object(ScopeId),
}

/// A closure: parameters and body paired with the scope that was active
/// when the block literal was evaluated.
#[derive(Debug)]
pub struct BlockValue {
    pub params: Vec<String>,
    pub body: Vec<Node>,
    /// The defining scope, shared not owned.
    pub home: ScopeId,
}

impl Value {
    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Bool(_) => "Boolean",
            Value::Done => "Done",
            Value::Uninitialised => "Uninitialised",
            Value::Block(_) => "Block",
            Value::Object(_) => "Object",
        }
    }
}

/// Format a number the way programs print it: whole values without the
/// trailing `.0`.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Done => write!(f, "done"),
            Value::Uninitialised => write!(f, "uninitialised"),
            Value::Block(_) => write!(f, "a block"),
            // Objects with an asString method are rendered by
            // Interpreter::stringify; this is the fallback.
            Value::Object(_) => write!(f, "an object"),
        }
    }
}
