// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Programmatic node constructors.
//!
//! The parser lives outside this workspace, so tests and embedders build
//! trees directly with these helpers. All constructed nodes carry
//! [`Span::DUMMY`]; use [`Node::at`] to attach a real location.

use crate::node::{MethodPart, Node, NodeKind, RequestPartNode};
use crate::Span;

fn node(kind: NodeKind) -> Node {
    Node::new(kind, Span::DUMMY)
}

/// An object constructor with the given body.
pub fn object(body: Vec<Node>) -> Node {
    node(NodeKind::ObjectConstructor { body })
}

/// A request part with arguments.
pub fn part(name: impl Into<String>, args: Vec<Node>) -> RequestPartNode {
    RequestPartNode {
        name: name.into(),
        args,
    }
}

/// A multi-part implicit-receiver request.
pub fn lexical_request(parts: Vec<RequestPartNode>) -> Node {
    node(NodeKind::LexicalRequest { parts })
}

/// A bare name lookup: a one-part, zero-argument lexical request.
pub fn name(name: impl Into<String>) -> Node {
    lexical_request(vec![part(name, vec![])])
}

/// A multi-part request on an explicit receiver.
pub fn explicit_request(receiver: Node, parts: Vec<RequestPartNode>) -> Node {
    node(NodeKind::ExplicitRequest {
        receiver: Box::new(receiver),
        parts,
    })
}

pub fn number(value: f64) -> Node {
    node(NodeKind::Number(value))
}

pub fn string(value: impl Into<String>) -> Node {
    node(NodeKind::StringLiteral(value.into()))
}

/// One link of an interpolated-string chain. `rest` must end in a
/// [`string`] literal.
pub fn interp_string(prefix: impl Into<String>, expression: Node, rest: Node) -> Node {
    node(NodeKind::InterpString {
        prefix: prefix.into(),
        expression: Box::new(expression),
        rest: Box::new(rest),
    })
}

pub fn def(name: impl Into<String>, value: Node) -> Node {
    node(NodeKind::Def {
        name: name.into(),
        value: Box::new(value),
    })
}

pub fn var(name: impl Into<String>, value: Option<Node>) -> Node {
    node(NodeKind::Var {
        name: name.into(),
        value: value.map(Box::new),
    })
}

/// A method declaration part: name plus parameter names.
pub fn method_part(name: impl Into<String>, params: Vec<&str>) -> MethodPart {
    MethodPart::new(name, params.into_iter().map(String::from).collect())
}

pub fn method(parts: Vec<MethodPart>, body: Vec<Node>) -> Node {
    node(NodeKind::Method { parts, body })
}

pub fn assign(target: Node, value: Node) -> Node {
    node(NodeKind::Assign {
        target: Box::new(target),
        value: Box::new(value),
    })
}

pub fn block(params: Vec<&str>, body: Vec<Node>) -> Node {
    node(NodeKind::Block {
        params: params.into_iter().map(String::from).collect(),
        body,
    })
}

pub fn ret(value: Node) -> Node {
    node(NodeKind::Return {
        value: Box::new(value),
    })
}

pub fn comment(text: impl Into<String>) -> Node {
    node(NodeKind::Comment(text.into()))
}

pub fn import(source: impl Into<String>, name: impl Into<String>) -> Node {
    node(NodeKind::Import {
        source: source.into(),
        name: name.into(),
    })
}
