// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree-walk interpreter runtime for the Grace language.
//!
//! Executes a finished AST directly: every computation is a request (a
//! keyword-structured message send) resolved against an object's method
//! table and, failing that, its enclosing lexical scope.

mod value;
mod request;
mod scope;
mod loader;
mod interp;

pub use interp::{Interpreter, RuntimeDiagnostic, RuntimeError};
pub use loader::{FsLoader, MemoryLoader, ModuleParser, SourceLoader};
pub use request::{Request, RequestPart};
pub use scope::ScopeId;
pub use value::Value;
