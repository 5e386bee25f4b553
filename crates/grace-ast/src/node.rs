// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! AST node types.
//!
//! Every construct of the language is a [`Node`] tagged with a [`NodeKind`].
//! Requests (message sends) are keyword-structured: a send like
//! `if (c) then { a } else { b }` is one request with three parts, each
//! carrying its own argument list.

use crate::Span;

/// A node in the AST.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Replace the span, keeping the kind. Used by builders.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// The kind of node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Object constructor: `object { body... }`. A whole module is one of these.
    ObjectConstructor { body: Vec<Node> },
    /// Implicit-receiver request, resolved against the lexical scope chain.
    LexicalRequest { parts: Vec<RequestPartNode> },
    /// Request with an explicit receiver expression: `receiver.name(args)...`.
    ExplicitRequest {
        receiver: Box<Node>,
        parts: Vec<RequestPartNode>,
    },
    /// Number literal
    Number(f64),
    /// String literal with no embedded expressions
    StringLiteral(String),
    /// Interpolated string segment: a literal prefix, an embedded expression,
    /// and the rest of the chain. The chain must end in a `StringLiteral`.
    InterpString {
        prefix: String,
        expression: Box<Node>,
        rest: Box<Node>,
    },
    /// Immutable field declaration: `def name = value`
    Def { name: String, value: Box<Node> },
    /// Mutable field declaration: `var name` or `var name := value`
    Var {
        name: String,
        value: Option<Box<Node>>,
    },
    /// Method declaration: `method name(p) part(q)... { body }`
    Method {
        parts: Vec<MethodPart>,
        body: Vec<Node>,
    },
    /// Assignment: `target := value`
    Assign { target: Box<Node>, value: Box<Node> },
    /// Block (closure) literal: `{ p1, p2 -> body }`
    Block {
        params: Vec<String>,
        body: Vec<Node>,
    },
    /// Non-local return: `return value`
    Return { value: Box<Node> },
    /// Comment, ignored by evaluation
    Comment(String),
    /// Module import: `import "source" as name`
    Import { source: String, name: String },
}

/// One part of a request at the AST level: a name and unevaluated arguments.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestPartNode {
    pub name: String,
    pub args: Vec<Node>,
}

/// One part of a method declaration header: a name and parameter names.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodPart {
    pub name: String,
    pub params: Vec<String>,
}

impl MethodPart {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}
