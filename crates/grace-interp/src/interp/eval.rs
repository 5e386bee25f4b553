// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Node evaluation: one arm per AST node kind.

use grace_ast::node::{MethodPart, NodeKind, RequestPartNode};
use grace_ast::{Node, Span};

use crate::request::{Request, RequestPart};
use crate::scope::{Method, ScopeId, UserMethod};
use crate::value::{BlockValue, Value};

use super::{fault, EvalResult, Interpreter, RuntimeError};

impl Interpreter {
    /// Evaluate one node against the current scope.
    pub(crate) fn eval_node(&mut self, scope: ScopeId, node: &Node) -> EvalResult {
        let span = node.span;
        match &node.kind {
            NodeKind::ObjectConstructor { body } => self.eval_object_constructor(scope, body),

            NodeKind::LexicalRequest { parts } => {
                let parts = self.eval_request_parts(scope, parts)?;
                let request = Request::new(parts).map_err(|e| fault(e, span))?;
                let receiver = self.lexical_receiver(scope, &request, span)?;
                self.dispatch(Value::Object(receiver), &request, span)
            }

            NodeKind::ExplicitRequest { receiver, parts } => {
                let parts = self.eval_request_parts(scope, parts)?;
                let request = Request::new(parts).map_err(|e| fault(e, span))?;
                let receiver = self.eval_node(scope, receiver)?;
                self.dispatch(receiver, &request, span)
            }

            NodeKind::Number(n) => Ok(Value::Number(*n)),
            NodeKind::StringLiteral(s) => Ok(Value::String(s.clone())),
            NodeKind::InterpString { .. } => self.eval_interp_string(scope, node),

            NodeKind::Def { name, value } => {
                let value = self.eval_node(scope, value)?;
                self.arena.get_mut(scope).set_field(name, value);
                Ok(Value::Done)
            }

            // Initialization goes through the normal request path so it
            // shares semantics with later reassignment.
            NodeKind::Var { name, value } => {
                if let Some(value) = value {
                    let value = self.eval_node(scope, value)?;
                    let request = Request::single(format!("{}:=", name), vec![value]);
                    let receiver = self.lexical_receiver(scope, &request, span)?;
                    self.dispatch(Value::Object(receiver), &request, span)?;
                }
                Ok(Value::Done)
            }

            NodeKind::Method { parts, body } => {
                self.register_method(scope, parts, body);
                Ok(Value::Done)
            }

            NodeKind::Assign { target, value } => self.eval_assign(scope, target, value, span),

            NodeKind::Block { params, body } => Ok(Value::Block(std::rc::Rc::new(BlockValue {
                params: params.clone(),
                body: body.clone(),
                home: scope,
            }))),

            NodeKind::Return { value } => {
                let value = self.eval_node(scope, value)?;
                let target = self.arena.find_return_boundary(scope).ok_or_else(|| {
                    fault(
                        RuntimeError::InvalidContext(
                            "return is only valid inside a method body".to_string(),
                        ),
                        span,
                    )
                })?;
                Err(super::Interrupt::Return { target, value })
            }

            NodeKind::Comment(_) => Ok(Value::Done),

            NodeKind::Import { source, name } => self.eval_import(scope, source, name, span),
        }
    }

    /// Evaluate each part's arguments, left to right, part by part.
    fn eval_request_parts(
        &mut self,
        scope: ScopeId,
        parts: &[RequestPartNode],
    ) -> Result<Vec<RequestPart>, super::Interrupt> {
        let mut evaluated = Vec::with_capacity(parts.len());
        for part in parts {
            let mut args = Vec::with_capacity(part.args.len());
            for arg in &part.args {
                args.push(self.eval_node(scope, arg)?);
            }
            evaluated.push(RequestPart::new(part.name.clone(), args));
        }
        Ok(evaluated)
    }

    fn lexical_receiver(
        &self,
        scope: ScopeId,
        request: &Request,
        span: Span,
    ) -> Result<ScopeId, super::Interrupt> {
        self.arena
            .find_receiver(scope, request.selector())
            .ok_or_else(|| fault(RuntimeError::NoSuchReceiver(request.selector().to_string()), span))
    }

    /// Object construction is two-pass: pass 1 registers every field and
    /// method so siblings can forward-reference each other, pass 2
    /// evaluates the body in textual order. A field's initializer still
    /// runs at its sequential position, so reading an as-yet-unevaluated
    /// sibling field fails with the uninitialised-read error.
    fn eval_object_constructor(&mut self, scope: ScopeId, body: &[Node]) -> EvalResult {
        let object = self.arena.alloc(Some(scope), false, true);
        for node in body {
            match &node.kind {
                NodeKind::Def { name, .. } => self.arena.get_mut(object).add_field(name),
                NodeKind::Var { name, .. } => {
                    self.arena.get_mut(object).add_field(name);
                    self.arena.get_mut(object).add_field_writer(name);
                }
                NodeKind::Import { name, .. } => self.arena.get_mut(object).add_field(name),
                NodeKind::Method { parts, body } => self.register_method(object, parts, body),
                _ => {}
            }
        }
        for node in body {
            self.eval_node(object, node)?;
        }
        Ok(Value::Object(object))
    }

    fn register_method(&mut self, scope: ScopeId, parts: &[MethodPart], body: &[Node]) {
        let mut selector = String::new();
        for part in parts {
            use std::fmt::Write;
            let _ = write!(selector, "{}({})", part.name, part.params.len());
        }
        let method = Method::User(std::rc::Rc::new(UserMethod {
            parts: parts.to_vec(),
            body: body.to_vec(),
            home: scope,
        }));
        self.arena.get_mut(scope).add_method(selector, method);
    }

    /// Pre-register `def`/`var` fields of a method or block body so the
    /// declarations can be assigned through the normal request path.
    pub(super) fn register_body_fields(&mut self, scope: ScopeId, body: &[Node]) {
        for node in body {
            match &node.kind {
                NodeKind::Def { name, .. } => self.arena.get_mut(scope).add_field(name),
                NodeKind::Var { name, .. } => {
                    self.arena.get_mut(scope).add_field(name);
                    self.arena.get_mut(scope).add_field_writer(name);
                }
                _ => {}
            }
        }
    }

    fn eval_assign(
        &mut self,
        scope: ScopeId,
        target: &Node,
        value: &Node,
        span: Span,
    ) -> EvalResult {
        match &target.kind {
            NodeKind::LexicalRequest { parts } => {
                let name = match parts.first() {
                    Some(part) => part.name.clone(),
                    None => {
                        return Err(fault(
                            RuntimeError::InvalidAssignmentTarget("empty request".to_string()),
                            span,
                        ))
                    }
                };
                let value = self.eval_node(scope, value)?;
                let request = Request::single(format!("{}:=", name), vec![value]);
                let receiver = self.lexical_receiver(scope, &request, span)?;
                self.dispatch(Value::Object(receiver), &request, span)?;
                Ok(Value::Done)
            }
            NodeKind::ExplicitRequest { receiver, parts } => {
                let name = match parts.first() {
                    Some(part) => part.name.clone(),
                    None => {
                        return Err(fault(
                            RuntimeError::InvalidAssignmentTarget("empty request".to_string()),
                            span,
                        ))
                    }
                };
                let value = self.eval_node(scope, value)?;
                let request = Request::single(format!("{}:=", name), vec![value]);
                let receiver = self.eval_node(scope, receiver)?;
                self.dispatch(receiver, &request, span)?;
                Ok(Value::Done)
            }
            other => Err(fault(
                RuntimeError::InvalidAssignmentTarget(format!("{} node", variant_name(other))),
                span,
            )),
        }
    }

    fn eval_interp_string(&mut self, scope: ScopeId, node: &Node) -> EvalResult {
        let mut out = String::new();
        let mut current = node;
        loop {
            match &current.kind {
                NodeKind::InterpString {
                    prefix,
                    expression,
                    rest,
                } => {
                    out.push_str(prefix);
                    let value = self.eval_node(scope, expression)?;
                    out.push_str(&self.stringify(&value)?);
                    current = rest;
                }
                // The chain must end in a plain literal segment.
                NodeKind::StringLiteral(s) => {
                    out.push_str(s);
                    return Ok(Value::String(out));
                }
                _ => {
                    return Err(fault(
                        RuntimeError::MalformedNode(
                            "interpolated string chain must terminate in a string literal"
                                .to_string(),
                        ),
                        current.span,
                    ))
                }
            }
        }
    }

    fn eval_import(
        &mut self,
        scope: ScopeId,
        source: &str,
        local_name: &str,
        span: Span,
    ) -> EvalResult {
        if let Some(cached) = self.module_cached(source) {
            self.arena.get_mut(scope).set_field(local_name, cached);
            return Ok(Value::Done);
        }
        if self.module_loading(source) {
            return Err(fault(
                RuntimeError::ModuleLoadFailure {
                    module: source.to_string(),
                    reason: "cyclic import".to_string(),
                },
                span,
            ));
        }

        let filename = format!("{}.grace", source);
        let text = self.loader.read_file(&filename).map_err(|e| {
            fault(
                RuntimeError::ModuleLoadFailure {
                    module: source.to_string(),
                    reason: format!("error reading file {}: {}", filename, e),
                },
                span,
            )
        })?;
        let ast = self.parse_module(&text).map_err(|reason| {
            fault(
                RuntimeError::ModuleLoadFailure {
                    module: source.to_string(),
                    reason,
                },
                span,
            )
        })?;
        if !matches!(ast.kind, NodeKind::ObjectConstructor { .. }) {
            return Err(fault(
                RuntimeError::ModuleLoadFailure {
                    module: source.to_string(),
                    reason: "module source did not parse to an object constructor".to_string(),
                },
                span,
            ));
        }

        self.begin_module_load(source);
        match self.eval_in_fresh_prelude(&ast) {
            Ok(value) => {
                self.finish_module_load(source, Some(value.clone()));
                self.arena.get_mut(scope).set_field(local_name, value);
                Ok(Value::Done)
            }
            Err(interrupt) => {
                self.finish_module_load(source, None);
                Err(interrupt)
            }
        }
    }
}

fn variant_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::ObjectConstructor { .. } => "ObjectConstructor",
        NodeKind::LexicalRequest { .. } => "LexicalRequest",
        NodeKind::ExplicitRequest { .. } => "ExplicitRequest",
        NodeKind::Number(_) => "Number",
        NodeKind::StringLiteral(_) => "StringLiteral",
        NodeKind::InterpString { .. } => "InterpString",
        NodeKind::Def { .. } => "Def",
        NodeKind::Var { .. } => "Var",
        NodeKind::Method { .. } => "Method",
        NodeKind::Assign { .. } => "Assign",
        NodeKind::Block { .. } => "Block",
        NodeKind::Return { .. } => "Return",
        NodeKind::Comment(_) => "Comment",
        NodeKind::Import { .. } => "Import",
    }
}
