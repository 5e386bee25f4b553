// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The request protocol: a message send as an ordered sequence of named
//! parts, each carrying already-evaluated argument values.
//!
//! The canonical selector concatenates each part name with its argument
//! count, e.g. `if(1)then(1)else(1)`. The same encoding is used for
//! method registration and lookup, so keyword-style multi-part sends and
//! plain sends dispatch uniformly.

use crate::interp::RuntimeError;
use crate::value::Value;

/// One part of a request: a name and its evaluated arguments.
#[derive(Debug, Clone)]
pub struct RequestPart {
    pub name: String,
    pub args: Vec<Value>,
}

impl RequestPart {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// One message send. Arguments are evaluated in the calling scope,
/// left-to-right, part-by-part, before the request is built.
#[derive(Debug, Clone)]
pub struct Request {
    parts: Vec<RequestPart>,
    selector: String,
}

impl Request {
    /// Build a request. Every send has at least one part.
    pub fn new(parts: Vec<RequestPart>) -> Result<Self, RuntimeError> {
        if parts.is_empty() {
            return Err(RuntimeError::EmptyRequest);
        }
        let selector = canonical_selector(&parts);
        Ok(Self { parts, selector })
    }

    /// Build a single-part request.
    pub fn single(name: impl Into<String>, args: Vec<Value>) -> Self {
        let parts = vec![RequestPart::new(name, args)];
        let selector = canonical_selector(&parts);
        Self { parts, selector }
    }

    /// The canonical dispatch key for this request.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn parts(&self) -> &[RequestPart] {
        &self.parts
    }

    /// Argument `arg` of part `part`, if present.
    pub fn arg(&self, part: usize, arg: usize) -> Option<&Value> {
        self.parts.get(part)?.args.get(arg)
    }
}

fn canonical_selector(parts: &[RequestPart]) -> String {
    use std::fmt::Write;
    let mut selector = String::new();
    for part in parts {
        let _ = write!(selector, "{}({})", part.name, part.args.len());
    }
    selector
}
