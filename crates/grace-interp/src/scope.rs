// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scope objects and the arena that owns them.
//!
//! A scope object is simultaneously a field/method namespace and a link
//! in the lexical-scope chain. Scopes are arena-allocated and referenced
//! by [`ScopeId`]; the lexical-parent relation is a handle, never an
//! owning pointer, so the chain cannot form ownership cycles even though
//! many scopes share one ancestor (the prelude outlives every program
//! scope built from it).

use std::rc::Rc;

use grace_ast::node::MethodPart;
use grace_ast::Node;
use indexmap::IndexMap;

use crate::interp::{EvalResult, Interpreter};
use crate::request::Request;
use crate::value::Value;

/// Handle to a scope object in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// A native method installed on a scope, usually by the prelude.
pub(crate) type BuiltinFn = fn(&mut Interpreter, &Request) -> EvalResult;

/// A user method: declaration parts, body, and the scope it was defined
/// in. Invocations run in a fresh return-boundary child of `home`.
#[derive(Debug)]
pub(crate) struct UserMethod {
    pub parts: Vec<MethodPart>,
    pub body: Vec<Node>,
    pub home: ScopeId,
}

/// An entry in a scope's method table.
#[derive(Clone)]
pub(crate) enum Method {
    /// Native function (prelude built-ins)
    Builtin(BuiltinFn),
    /// Declared method evaluated against its body
    User(Rc<UserMethod>),
    /// Zero-arity field read; rejects a still-uninitialised field
    FieldGetter(String),
    /// `name:=(1)` writer that unconditionally overwrites the field
    FieldWriter(String),
    /// `self(0)`, bound as a method so it never becomes a parent-chain edge
    SelfRef,
    /// Identity `==(1)`, installed at construction
    IdentityEq,
    /// Identity `!=(1)`, installed at construction
    IdentityNe,
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Method::Builtin(_) => write!(f, "Builtin"),
            Method::User(m) => write!(f, "User({} parts)", m.parts.len()),
            Method::FieldGetter(name) => write!(f, "FieldGetter({})", name),
            Method::FieldWriter(name) => write!(f, "FieldWriter({})", name),
            Method::SelfRef => write!(f, "SelfRef"),
            Method::IdentityEq => write!(f, "IdentityEq"),
            Method::IdentityNe => write!(f, "IdentityNe"),
        }
    }
}

/// A scope object: field table, method table, lexical parent.
#[derive(Debug)]
pub(crate) struct ScopeObject {
    pub fields: IndexMap<String, Value>,
    pub methods: IndexMap<String, Method>,
    pub lexical_parent: Option<ScopeId>,
    /// True exactly for scopes created to run a method body; marks where
    /// a non-local return is caught.
    pub is_return_boundary: bool,
}

impl ScopeObject {
    fn new(lexical_parent: Option<ScopeId>, is_return_boundary: bool, bind_self: bool) -> Self {
        let mut methods = IndexMap::new();
        methods.insert("==(1)".to_string(), Method::IdentityEq);
        methods.insert("!=(1)".to_string(), Method::IdentityNe);
        if bind_self {
            methods.insert("self(0)".to_string(), Method::SelfRef);
        }
        Self {
            fields: IndexMap::new(),
            methods,
            lexical_parent,
            is_return_boundary,
        }
    }

    /// Declare a field: present (as `Uninitialised`) from this moment,
    /// with a zero-arity getter that rejects reads before first write.
    pub fn add_field(&mut self, name: &str) {
        self.fields.insert(name.to_string(), Value::Uninitialised);
        self.methods
            .insert(format!("{}(0)", name), Method::FieldGetter(name.to_string()));
    }

    /// Install the `name:=(1)` writer for a mutable field.
    pub fn add_field_writer(&mut self, name: &str) {
        self.methods
            .insert(format!("{}:=(1)", name), Method::FieldWriter(name.to_string()));
    }

    pub fn add_method(&mut self, selector: impl Into<String>, method: Method) {
        self.methods.insert(selector.into(), method);
    }

    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Whether a request with this selector can be answered here, either
    /// by a method or by a bare arity-0 field read.
    fn answers(&self, selector: &str) -> bool {
        if self.methods.contains_key(selector) {
            return true;
        }
        bare_field_name(selector)
            .map(|name| self.fields.contains_key(name))
            .unwrap_or(false)
    }
}

/// If `selector` is a bare read (`name(0)`), the field name.
pub(crate) fn bare_field_name(selector: &str) -> Option<&str> {
    selector.strip_suffix("(0)")
}

/// If `selector` is an implicit write (`name:=(1)`), the field name.
pub(crate) fn writer_field_name(selector: &str) -> Option<&str> {
    selector.strip_suffix(":=(1)")
}

/// Owner of every scope object. Scope lifetime is tracked by the owner
/// for the whole interpreter run; handles stay valid as long as the
/// interpreter does.
#[derive(Debug, Default)]
pub(crate) struct ScopeArena {
    scopes: Vec<ScopeObject>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(
        &mut self,
        lexical_parent: Option<ScopeId>,
        is_return_boundary: bool,
        bind_self: bool,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes
            .push(ScopeObject::new(lexical_parent, is_return_boundary, bind_self));
        id
    }

    pub fn get(&self, id: ScopeId) -> &ScopeObject {
        &self.scopes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut ScopeObject {
        &mut self.scopes[id.0 as usize]
    }

    /// Nearest scope (self first, then lexical parents) that answers the
    /// selector.
    pub fn find_receiver(&self, from: ScopeId, selector: &str) -> Option<ScopeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.get(id);
            if scope.answers(selector) {
                return Some(id);
            }
            current = scope.lexical_parent;
        }
        None
    }

    /// Nearest scope (self first, then lexical parents) created to run a
    /// method body.
    pub fn find_return_boundary(&self, from: ScopeId) -> Option<ScopeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.get(id);
            if scope.is_return_boundary {
                return Some(id);
            }
            current = scope.lexical_parent;
        }
        None
    }
}
