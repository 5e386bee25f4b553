// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Abstract Syntax Tree types for the Grace interpreter.
//!
//! This crate defines the plain-data AST nodes the evaluator consumes.
//! Nodes carry no behaviour; a parser (external to this workspace) or the
//! [`build`] helpers produce them.

pub mod span;
pub mod node;
pub mod build;

pub use node::{MethodPart, Node, NodeKind, RequestPartNode};
pub use span::Span;
