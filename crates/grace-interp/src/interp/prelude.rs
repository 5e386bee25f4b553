// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The prelude: the root scope every program and module hangs under.
//!
//! Supplies control flow (`if`/`then`/`elseif`/`else`, `while`/`do`) and
//! primitive I/O (`print`, `getFileContents`). Branch and condition
//! blocks are invoked via zero-argument `apply` requests; the leading
//! `if` condition arrives already evaluated as a Boolean.

use grace_ast::Span;

use crate::request::{Request, RequestPart};
use crate::scope::{Method, ScopeId};
use crate::value::Value;

use super::{fault, EvalResult, Interpreter, RuntimeError};

/// Selectors of the conditional family. One generic built-in serves all
/// of them: condition/branch clause pairs, optional trailing `else`.
const IF_SELECTORS: &[&str] = &[
    "if(1)then(1)",
    "if(1)then(1)else(1)",
    "if(1)then(1)elseif(1)then(1)",
    "if(1)then(1)elseif(1)then(1)else(1)",
    "if(1)then(1)elseif(1)then(1)elseif(1)then(1)",
    "if(1)then(1)elseif(1)then(1)elseif(1)then(1)else(1)",
    "if(1)then(1)elseif(1)then(1)elseif(1)then(1)elseif(1)then(1)else(1)",
];

/// Build the prelude scope in the interpreter's arena.
pub(super) fn install(interp: &mut Interpreter) -> ScopeId {
    let root = interp.arena.alloc(None, false, false);
    let scope = interp.arena.get_mut(root);
    scope.add_method("print(1)", Method::Builtin(print));
    scope.add_method("true(0)", Method::Builtin(true_constant));
    scope.add_method("false(0)", Method::Builtin(false_constant));
    scope.add_method("while(1)do(1)", Method::Builtin(while_do));
    scope.add_method("getFileContents(1)", Method::Builtin(get_file_contents));
    for selector in IF_SELECTORS {
        interp
            .arena
            .get_mut(root)
            .add_method(*selector, Method::Builtin(if_then));
    }
    root
}

fn print(interp: &mut Interpreter, request: &Request) -> EvalResult {
    let value = part_arg(request.parts(), 0)?.clone();
    let text = interp.stringify(&value)?;
    interp.write_output(&text);
    interp.write_output_ln();
    Ok(Value::Done)
}

fn true_constant(_: &mut Interpreter, _: &Request) -> EvalResult {
    Ok(Value::Bool(true))
}

fn false_constant(_: &mut Interpreter, _: &Request) -> EvalResult {
    Ok(Value::Bool(false))
}

/// Generic conditional: part 0 is the evaluated condition, part 1 the
/// `then` branch, then `elseif`/`then` pairs, then an optional `else`.
fn if_then(interp: &mut Interpreter, request: &Request) -> EvalResult {
    let parts = request.parts();
    if expect_bool(part_arg(parts, 0)?, "if condition")? {
        return interp.apply_block(part_arg(parts, 1)?);
    }
    let mut i = 2;
    while i < parts.len() {
        match parts[i].name.as_str() {
            "elseif" => {
                let condition = interp.apply_block(part_arg(parts, i)?)?;
                if expect_bool(&condition, "elseif condition")? {
                    return interp.apply_block(part_arg(parts, i + 1)?);
                }
                i += 2;
            }
            "else" => return interp.apply_block(part_arg(parts, i)?),
            other => {
                return Err(fault(
                    RuntimeError::TypeError(format!("unexpected request part `{}` in conditional", other)),
                    Span::DUMMY,
                ))
            }
        }
    }
    Ok(Value::Done)
}

/// `while(1)do(1)`: apply the condition block, and while it yields true,
/// apply the body block.
fn while_do(interp: &mut Interpreter, request: &Request) -> EvalResult {
    let condition = part_arg(request.parts(), 0)?.clone();
    let body = part_arg(request.parts(), 1)?.clone();
    loop {
        let value = interp.apply_block(&condition)?;
        if !expect_bool(&value, "while condition")? {
            return Ok(Value::Done);
        }
        interp.apply_block(&body)?;
    }
}

fn get_file_contents(interp: &mut Interpreter, request: &Request) -> EvalResult {
    let filename = match part_arg(request.parts(), 0)? {
        Value::String(s) => s.clone(),
        other => {
            return Err(fault(
                RuntimeError::TypeError(format!(
                    "getFileContents needs a String filename, got {}",
                    other.type_name()
                )),
                Span::DUMMY,
            ))
        }
    };
    match interp.loader.read_file(&filename) {
        Ok(text) => Ok(Value::String(text)),
        Err(_) => Err(fault(RuntimeError::FileRead(filename), Span::DUMMY)),
    }
}

fn part_arg<'a>(parts: &'a [RequestPart], index: usize) -> Result<&'a Value, super::Interrupt> {
    parts
        .get(index)
        .and_then(|part| part.args.first())
        .ok_or_else(|| {
            fault(
                RuntimeError::ArityMismatch {
                    expected: index + 1,
                    got: parts.len(),
                },
                Span::DUMMY,
            )
        })
}

fn expect_bool(value: &Value, what: &str) -> Result<bool, super::Interrupt> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(fault(
            RuntimeError::TypeError(format!("{} must be a Boolean, got {}", what, other.type_name())),
            Span::DUMMY,
        )),
    }
}
