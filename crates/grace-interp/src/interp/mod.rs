// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The interpreter implementation.
//!
//! Single-threaded, synchronous, direct-call evaluation. The only
//! non-local control transfer is the return unwind, which travels on
//! [`Interrupt::Return`], a channel deliberately separate from
//! [`RuntimeError`].

use std::sync::{Arc, Mutex};

use grace_ast::{Node, Span};
use indexmap::IndexMap;

mod eval;
mod dispatch;
mod prelude;

use crate::loader::{FsLoader, ModuleParser, SourceLoader};
use crate::scope::{ScopeArena, ScopeId};
use crate::value::Value;

/// The tree-walk interpreter. One instance owns one scope arena and one
/// module cache; independent instances share nothing.
pub struct Interpreter {
    /// Owner of every scope object created during this run.
    pub(crate) arena: ScopeArena,
    /// Already-evaluated modules by source name. At-most-once load and
    /// evaluation per distinct source name per instance.
    modules: IndexMap<String, Value>,
    /// Source names currently being loaded; used to fail fast on cycles.
    loading: Vec<String>,
    /// Module source and file access.
    pub(crate) loader: Box<dyn SourceLoader>,
    /// Module source parsing; imports fail without one installed.
    parser: Option<Box<dyn ModuleParser>>,
    /// Optional output buffer for capturing print output (used in tests).
    output_buffer: Option<Arc<Mutex<String>>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            arena: ScopeArena::new(),
            modules: IndexMap::new(),
            loading: Vec::new(),
            loader: Box::new(FsLoader),
            parser: None,
            output_buffer: None,
        }
    }

    /// Returns interpreter and output buffer reference.
    pub fn with_captured_output() -> (Self, Arc<Mutex<String>>) {
        let buffer = Arc::new(Mutex::new(String::new()));
        let mut interp = Self::new();
        interp.output_buffer = Some(buffer.clone());
        (interp, buffer)
    }

    /// Replace the source loader.
    pub fn set_loader(&mut self, loader: Box<dyn SourceLoader>) {
        self.loader = loader;
    }

    /// Install the module parser used by imports.
    pub fn set_parser(&mut self, parser: Box<dyn ModuleParser>) {
        self.parser = Some(parser);
    }

    /// Pre-bind an already-evaluated module under a source name.
    pub fn bind_module(&mut self, name: impl Into<String>, module: Value) {
        self.modules.insert(name.into(), module);
    }

    /// Evaluate a program (an object-constructor node) against a fresh
    /// prelude-rooted scope.
    pub fn run(&mut self, program: &Node) -> Result<Value, RuntimeDiagnostic> {
        match self.eval_in_fresh_prelude(program) {
            Ok(value) => Ok(value),
            Err(Interrupt::Fault(diag)) => Err(diag),
            Err(Interrupt::Return { .. }) => Err(RuntimeDiagnostic::new(
                RuntimeError::EscapedReturn,
                program.span,
            )),
        }
    }

    /// Evaluate a module body. Identical to [`Interpreter::run`]; imports
    /// go through this path via the module cache.
    pub fn evaluate_module(&mut self, module: &Node) -> Result<Value, RuntimeDiagnostic> {
        self.run(module)
    }

    /// Send an already-built request to a receiver value, on the same
    /// dispatch path request nodes use. Embedders and tests drive
    /// evaluated objects with this.
    pub fn send(
        &mut self,
        receiver: Value,
        request: &crate::request::Request,
    ) -> Result<Value, RuntimeDiagnostic> {
        match self.dispatch(receiver, request, Span::DUMMY) {
            Ok(value) => Ok(value),
            Err(Interrupt::Fault(diag)) => Err(diag),
            Err(Interrupt::Return { .. }) => Err(RuntimeDiagnostic::new(
                RuntimeError::EscapedReturn,
                Span::DUMMY,
            )),
        }
    }

    pub(crate) fn eval_in_fresh_prelude(&mut self, program: &Node) -> EvalResult {
        let root = prelude::install(self);
        self.eval_node(root, program)
    }

    pub(crate) fn parse_module(&self, source: &str) -> Result<Node, String> {
        match &self.parser {
            Some(parser) => parser.parse(source),
            None => Err("no module parser installed".to_string()),
        }
    }

    pub(crate) fn module_cached(&self, source: &str) -> Option<Value> {
        self.modules.get(source).cloned()
    }

    pub(crate) fn module_loading(&self, source: &str) -> bool {
        self.loading.iter().any(|s| s == source)
    }

    pub(crate) fn begin_module_load(&mut self, source: &str) {
        self.loading.push(source.to_string());
    }

    pub(crate) fn finish_module_load(&mut self, source: &str, value: Option<Value>) {
        self.loading.pop();
        // No partial module state is cached on failure.
        if let Some(value) = value {
            self.modules.insert(source.to_string(), value);
        }
    }

    pub(crate) fn write_output(&self, s: &str) {
        if let Some(buf) = &self.output_buffer {
            buf.lock().unwrap().push_str(s);
        } else {
            print!("{}", s);
        }
    }

    pub(crate) fn write_output_ln(&self) {
        if let Some(buf) = &self.output_buffer {
            buf.lock().unwrap().push('\n');
        } else {
            println!();
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// A runtime error.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("no such method or field `{selector}` on {receiver}")]
    NoSuchMethod { selector: String, receiver: String },

    #[error("no such method in scope: `{0}`")]
    NoSuchReceiver(String),

    #[error("field `{0}` is not initialised")]
    UninitialisedField(String),

    #[error("{0}")]
    InvalidContext(String),

    #[error("invalid assignment target: {0}")]
    InvalidAssignmentTarget(String),

    #[error("malformed node: {0}")]
    MalformedNode(String),

    #[error("error loading module `{module}`: {reason}")]
    ModuleLoadFailure { module: String, reason: String },

    #[error("error reading file: {0}")]
    FileRead(String),

    #[error("a request needs at least one part")]
    EmptyRequest,

    #[error("{0}")]
    TypeError(String),

    #[error("expected {expected} argument{}, got {got}", if *.expected == 1 { "" } else { "s" })]
    ArityMismatch { expected: usize, got: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("return unwound past every live method activation")]
    EscapedReturn,
}

/// Runtime error with source location for diagnostic display.
#[derive(Debug)]
pub struct RuntimeDiagnostic {
    pub error: RuntimeError,
    pub span: Span,
}

impl RuntimeDiagnostic {
    pub fn new(error: RuntimeError, span: Span) -> Self {
        Self { error, span }
    }
}

impl std::fmt::Display for RuntimeDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RuntimeDiagnostic {}

/// Why evaluation of a node stopped early.
///
/// `Return` is control flow, not an error: it unwinds to one specific
/// activation and is intercepted only by the method invocation whose
/// scope it targets. Everything else re-propagates it unchanged.
#[derive(Debug)]
pub(crate) enum Interrupt {
    /// An actual error; aborts evaluation unless it reaches the caller.
    Fault(RuntimeDiagnostic),
    /// Non-local return unwinding to `target`.
    Return { target: ScopeId, value: Value },
}

impl From<RuntimeDiagnostic> for Interrupt {
    fn from(diag: RuntimeDiagnostic) -> Self {
        Interrupt::Fault(diag)
    }
}

/// Shorthand for raising a fault at a known location.
pub(crate) fn fault(error: RuntimeError, span: Span) -> Interrupt {
    Interrupt::Fault(RuntimeDiagnostic::new(error, span))
}

pub(crate) type EvalResult = Result<Value, Interrupt>;
