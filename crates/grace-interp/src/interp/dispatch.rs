// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Request dispatch: method routing on scope objects, primitive value
//! methods, block application, and user-method invocation.

use grace_ast::Span;

use crate::request::Request;
use crate::scope::{bare_field_name, writer_field_name, Method, ScopeId};
use crate::value::{format_number, BlockValue, Value};

use super::{fault, EvalResult, Interpreter, Interrupt, RuntimeError};

impl Interpreter {
    /// Send a request to a receiver value.
    pub(crate) fn dispatch(&mut self, receiver: Value, request: &Request, span: Span) -> EvalResult {
        match receiver {
            Value::Object(id) => self.object_request(id, request, span),
            Value::Block(block) => self.block_request(&block, request, span),
            Value::Number(n) => self.number_request(n, request, span),
            Value::String(s) => self.string_request(&s, request, span),
            Value::Bool(b) => self.bool_request(b, request, span),
            Value::Done | Value::Uninitialised => self.sentinel_request(&receiver, request, span),
        }
    }

    /// The base request path on a scope object: method table, then bare
    /// field read, then the implicit `name:=(1)` setter fallback.
    fn object_request(&mut self, id: ScopeId, request: &Request, span: Span) -> EvalResult {
        let selector = request.selector();
        if let Some(method) = self.arena.get(id).methods.get(selector).cloned() {
            return self.invoke_method(id, method, request, span);
        }

        if let Some(name) = bare_field_name(selector) {
            if let Some(value) = self.arena.get(id).fields.get(name) {
                return match value {
                    Value::Uninitialised => {
                        Err(fault(RuntimeError::UninitialisedField(name.to_string()), span))
                    }
                    value => Ok(value.clone()),
                };
            }
        }

        // No explicit writer installed: synthesize the field assignment.
        // This is deliberately relaxed about `def` immutability; see the
        // design notes.
        if request.parts().len() == 1 {
            if let Some(name) = writer_field_name(selector) {
                if let Some(value) = request.arg(0, 0).cloned() {
                    self.arena.get_mut(id).set_field(name, value);
                    return Ok(Value::Done);
                }
            }
        }

        Err(fault(
            RuntimeError::NoSuchMethod {
                selector: selector.to_string(),
                receiver: id.to_string(),
            },
            span,
        ))
    }

    fn invoke_method(
        &mut self,
        receiver: ScopeId,
        method: Method,
        request: &Request,
        span: Span,
    ) -> EvalResult {
        match method {
            Method::Builtin(f) => f(self, request),
            Method::User(method) => self.invoke_user_method(&method, request, span),
            Method::FieldGetter(name) => match self.arena.get(receiver).fields.get(&name) {
                Some(Value::Uninitialised) | None => {
                    Err(fault(RuntimeError::UninitialisedField(name), span))
                }
                Some(value) => Ok(value.clone()),
            },
            Method::FieldWriter(name) => {
                let value = request.arg(0, 0).cloned().ok_or_else(|| {
                    fault(
                        RuntimeError::ArityMismatch {
                            expected: 1,
                            got: 0,
                        },
                        span,
                    )
                })?;
                self.arena.get_mut(receiver).set_field(&name, value);
                Ok(Value::Done)
            }
            Method::SelfRef => Ok(Value::Object(receiver)),
            Method::IdentityEq => Ok(Value::Bool(identity_eq(receiver, request))),
            Method::IdentityNe => Ok(Value::Bool(!identity_eq(receiver, request))),
        }
    }

    /// Run a user method: fresh return-boundary child of the defining
    /// scope, parameters bound in declaration order across parts, body
    /// fields pre-registered, then the body in sequence. A return unwind
    /// targeting this exact activation is caught here; any other unwind
    /// or fault re-propagates unchanged.
    fn invoke_user_method(
        &mut self,
        method: &crate::scope::UserMethod,
        request: &Request,
        _span: Span,
    ) -> EvalResult {
        let activation = self.arena.alloc(Some(method.home), true, false);
        for (decl_part, req_part) in method.parts.iter().zip(request.parts()) {
            for (param, arg) in decl_part.params.iter().zip(&req_part.args) {
                self.arena.get_mut(activation).add_field(param);
                self.arena.get_mut(activation).set_field(param, arg.clone());
            }
        }
        self.register_body_fields(activation, &method.body);

        let mut last = Value::Done;
        for node in &method.body {
            match self.eval_node(activation, node) {
                Ok(value) => last = value,
                Err(Interrupt::Return { target, value }) if target == activation => {
                    return Ok(value);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(last)
    }

    /// Blocks answer `apply` with their parameter count; a fresh
    /// (non-boundary) child of the captured scope runs the body.
    fn block_request(&mut self, block: &BlockValue, request: &Request, span: Span) -> EvalResult {
        let expected = format!("apply({})", block.params.len());
        if request.selector() != expected {
            if request.selector().starts_with("apply(") {
                let got = request.parts().first().map(|p| p.args.len()).unwrap_or(0);
                return Err(fault(
                    RuntimeError::ArityMismatch {
                        expected: block.params.len(),
                        got,
                    },
                    span,
                ));
            }
            return Err(fault(
                RuntimeError::NoSuchMethod {
                    selector: request.selector().to_string(),
                    receiver: "a block".to_string(),
                },
                span,
            ));
        }

        let scope = self.arena.alloc(Some(block.home), false, false);
        for (param, arg) in block.params.iter().zip(&request.parts()[0].args) {
            self.arena.get_mut(scope).add_field(param);
            self.arena.get_mut(scope).set_field(param, arg.clone());
        }
        self.register_body_fields(scope, &block.body);

        let mut last = Value::Done;
        for node in &block.body {
            last = self.eval_node(scope, node)?;
        }
        Ok(last)
    }

    fn number_request(&mut self, n: f64, request: &Request, span: Span) -> EvalResult {
        let selector = request.selector();
        match selector {
            "prefix-(0)" => return Ok(Value::Number(-n)),
            "asString(0)" => return Ok(Value::String(format_number(n))),
            "==(1)" | "!=(1)" => {
                let eq = matches!(request.arg(0, 0), Some(Value::Number(m)) if *m == n);
                return Ok(Value::Bool(if selector == "==(1)" { eq } else { !eq }));
            }
            _ => {}
        }

        let arg = match request.arg(0, 0) {
            Some(Value::Number(m)) => *m,
            Some(other) => {
                return Err(fault(
                    RuntimeError::TypeError(format!(
                        "`{}` on a Number needs a Number argument, got {}",
                        selector,
                        other.type_name()
                    )),
                    span,
                ))
            }
            None => {
                return Err(fault(
                    RuntimeError::NoSuchMethod {
                        selector: selector.to_string(),
                        receiver: "a Number".to_string(),
                    },
                    span,
                ))
            }
        };
        match selector {
            "+(1)" => Ok(Value::Number(n + arg)),
            "-(1)" => Ok(Value::Number(n - arg)),
            "*(1)" => Ok(Value::Number(n * arg)),
            "/(1)" => {
                if arg == 0.0 {
                    Err(fault(RuntimeError::DivisionByZero, span))
                } else {
                    Ok(Value::Number(n / arg))
                }
            }
            "%(1)" => {
                if arg == 0.0 {
                    Err(fault(RuntimeError::DivisionByZero, span))
                } else {
                    Ok(Value::Number(n % arg))
                }
            }
            "<(1)" => Ok(Value::Bool(n < arg)),
            ">(1)" => Ok(Value::Bool(n > arg)),
            "<=(1)" => Ok(Value::Bool(n <= arg)),
            ">=(1)" => Ok(Value::Bool(n >= arg)),
            _ => Err(fault(
                RuntimeError::NoSuchMethod {
                    selector: selector.to_string(),
                    receiver: "a Number".to_string(),
                },
                span,
            )),
        }
    }

    fn string_request(&mut self, s: &str, request: &Request, span: Span) -> EvalResult {
        match request.selector() {
            "asString(0)" => Ok(Value::String(s.to_string())),
            "size(0)" => Ok(Value::Number(s.chars().count() as f64)),
            "++(1)" => {
                let arg = request.arg(0, 0).cloned().unwrap_or(Value::Done);
                let suffix = self.stringify(&arg)?;
                Ok(Value::String(format!("{}{}", s, suffix)))
            }
            "==(1)" | "!=(1)" => {
                let eq = matches!(request.arg(0, 0), Some(Value::String(other)) if other == s);
                Ok(Value::Bool(if request.selector() == "==(1)" {
                    eq
                } else {
                    !eq
                }))
            }
            selector => Err(fault(
                RuntimeError::NoSuchMethod {
                    selector: selector.to_string(),
                    receiver: "a String".to_string(),
                },
                span,
            )),
        }
    }

    fn bool_request(&mut self, b: bool, request: &Request, span: Span) -> EvalResult {
        let selector = request.selector();
        match selector {
            "asString(0)" => Ok(Value::String(b.to_string())),
            "not(0)" | "prefix!(0)" => Ok(Value::Bool(!b)),
            "==(1)" | "!=(1)" => {
                let eq = matches!(request.arg(0, 0), Some(Value::Bool(other)) if *other == b);
                Ok(Value::Bool(if selector == "==(1)" { eq } else { !eq }))
            }
            "&&(1)" | "||(1)" => match request.arg(0, 0) {
                Some(Value::Bool(other)) => Ok(Value::Bool(if selector == "&&(1)" {
                    b && *other
                } else {
                    b || *other
                })),
                Some(other) => Err(fault(
                    RuntimeError::TypeError(format!(
                        "`{}` on a Boolean needs a Boolean argument, got {}",
                        selector,
                        other.type_name()
                    )),
                    span,
                )),
                None => Err(fault(
                    RuntimeError::NoSuchMethod {
                        selector: selector.to_string(),
                        receiver: "a Boolean".to_string(),
                    },
                    span,
                )),
            },
            _ => Err(fault(
                RuntimeError::NoSuchMethod {
                    selector: selector.to_string(),
                    receiver: "a Boolean".to_string(),
                },
                span,
            )),
        }
    }

    fn sentinel_request(&mut self, receiver: &Value, request: &Request, span: Span) -> EvalResult {
        match request.selector() {
            "asString(0)" => Ok(Value::String(receiver.to_string())),
            "==(1)" | "!=(1)" => {
                let eq = match (receiver, request.arg(0, 0)) {
                    (Value::Done, Some(Value::Done)) => true,
                    (Value::Uninitialised, Some(Value::Uninitialised)) => true,
                    _ => false,
                };
                Ok(Value::Bool(if request.selector() == "==(1)" {
                    eq
                } else {
                    !eq
                }))
            }
            selector => Err(fault(
                RuntimeError::NoSuchMethod {
                    selector: selector.to_string(),
                    receiver: receiver.type_name().to_string(),
                },
                span,
            )),
        }
    }

    /// Invoke a block (or any value) with a zero-argument `apply`.
    pub(super) fn apply_block(&mut self, value: &Value) -> EvalResult {
        let request = Request::single("apply", vec![]);
        self.dispatch(value.clone(), &request, Span::DUMMY)
    }

    /// The user-visible string form of a value. Objects answering
    /// `asString(0)` render through it; everything else uses `Display`.
    pub(crate) fn stringify(&mut self, value: &Value) -> Result<String, Interrupt> {
        if let Value::Object(id) = value {
            if self.arena.get(*id).methods.contains_key("asString(0)") {
                let request = Request::single("asString", vec![]);
                let rendered = self.object_request(*id, &request, Span::DUMMY)?;
                return Ok(rendered.to_string());
            }
        }
        Ok(value.to_string())
    }
}

fn identity_eq(receiver: ScopeId, request: &Request) -> bool {
    matches!(request.arg(0, 0), Some(Value::Object(other)) if *other == receiver)
}
