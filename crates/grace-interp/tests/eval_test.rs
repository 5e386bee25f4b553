// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Evaluator semantics: declarations, requests, assignment, closures,
//! non-local return, and the prelude control-flow methods.

use grace_ast::build as b;
use grace_ast::Node;
use grace_interp::{Interpreter, Request, RequestPart, RuntimeError, Value};

fn run(program: Node) -> (Interpreter, Value) {
    let mut interp = Interpreter::new();
    let module = interp.run(&program).expect("program should evaluate");
    (interp, module)
}

fn read(interp: &mut Interpreter, object: &Value, name: &str) -> Value {
    interp
        .send(object.clone(), &Request::single(name, vec![]))
        .expect("field read should succeed")
}

fn as_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        other => panic!("expected Number, got {:?}", other),
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        other => panic!("expected Boolean, got {:?}", other),
    }
}

#[test]
fn def_field_and_method() {
    let program = b::object(vec![
        b::def("x", b::number(5.0)),
        b::method(vec![b::method_part("getX", vec![])], vec![b::name("x")]),
    ]);
    let (mut interp, module) = run(program);
    let result = interp
        .send(module, &Request::single("getX", vec![]))
        .unwrap();
    assert_eq!(as_number(&result), 5.0);
}

#[test]
fn var_assignment_shares_request_semantics() {
    // var y := 3; y := y + 1
    let program = b::object(vec![
        b::var("y", Some(b::number(3.0))),
        b::assign(
            b::name("y"),
            b::explicit_request(b::name("y"), vec![b::part("+", vec![b::number(1.0)])]),
        ),
    ]);
    let (mut interp, module) = run(program);
    assert_eq!(as_number(&read(&mut interp, &module, "y")), 4.0);
}

#[test]
fn field_read_before_first_write_fails() {
    let program = b::object(vec![b::var("q", None)]);
    let (mut interp, module) = run(program);
    let err = interp
        .send(module.clone(), &Request::single("q", vec![]))
        .unwrap_err();
    assert!(matches!(err.error, RuntimeError::UninitialisedField(ref n) if n == "q"));

    interp
        .send(
            module.clone(),
            &Request::single("q:=", vec![Value::Number(7.0)]),
        )
        .unwrap();
    assert_eq!(as_number(&read(&mut interp, &module, "q")), 7.0);
}

#[test]
fn sibling_initializer_runs_in_textual_order() {
    // def a = b; def b = 5: b is registered (forward reference resolves)
    // but still uninitialised when a's initializer runs.
    let program = b::object(vec![
        b::def("a", b::name("b")),
        b::def("b", b::number(5.0)),
    ]);
    let err = Interpreter::new().run(&program).unwrap_err();
    assert!(matches!(err.error, RuntimeError::UninitialisedField(ref n) if n == "b"));
}

#[test]
fn unknown_selector_reports_no_receiver() {
    let program = b::object(vec![b::def("a", b::name("missing"))]);
    let err = Interpreter::new().run(&program).unwrap_err();
    assert!(matches!(err.error, RuntimeError::NoSuchReceiver(ref s) if s == "missing(0)"));
}

#[test]
fn nested_if_picks_inner_then_branch() {
    // if (false) then { 1 } else { if (true) then { 2 } else { 3 } }
    let inner = b::lexical_request(vec![
        b::part("if", vec![b::name("true")]),
        b::part("then", vec![b::block(vec![], vec![b::number(2.0)])]),
        b::part("else", vec![b::block(vec![], vec![b::number(3.0)])]),
    ]);
    let program = b::object(vec![b::def(
        "r",
        b::lexical_request(vec![
            b::part("if", vec![b::name("false")]),
            b::part("then", vec![b::block(vec![], vec![b::number(1.0)])]),
            b::part("else", vec![b::block(vec![], vec![inner])]),
        ]),
    )]);
    let (mut interp, module) = run(program);
    assert_eq!(as_number(&read(&mut interp, &module, "r")), 2.0);
}

#[test]
fn if_without_else_yields_done() {
    let program = b::object(vec![b::def(
        "r",
        b::lexical_request(vec![
            b::part("if", vec![b::name("false")]),
            b::part("then", vec![b::block(vec![], vec![b::number(1.0)])]),
        ]),
    )]);
    let (mut interp, module) = run(program);
    assert!(matches!(read(&mut interp, &module, "r"), Value::Done));
}

#[test]
fn elseif_condition_blocks_are_applied_in_order() {
    // if (false) then {1} elseif {false} then {2} elseif {true} then {3}
    let program = b::object(vec![b::def(
        "r",
        b::lexical_request(vec![
            b::part("if", vec![b::name("false")]),
            b::part("then", vec![b::block(vec![], vec![b::number(1.0)])]),
            b::part("elseif", vec![b::block(vec![], vec![b::name("false")])]),
            b::part("then", vec![b::block(vec![], vec![b::number(2.0)])]),
            b::part("elseif", vec![b::block(vec![], vec![b::name("true")])]),
            b::part("then", vec![b::block(vec![], vec![b::number(3.0)])]),
        ]),
    )]);
    let (mut interp, module) = run(program);
    assert_eq!(as_number(&read(&mut interp, &module, "r")), 3.0);
}

#[test]
fn non_boolean_if_condition_is_a_type_error() {
    let program = b::object(vec![b::def(
        "r",
        b::lexical_request(vec![
            b::part("if", vec![b::number(1.0)]),
            b::part("then", vec![b::block(vec![], vec![b::number(1.0)])]),
        ]),
    )]);
    let err = Interpreter::new().run(&program).unwrap_err();
    assert!(matches!(err.error, RuntimeError::TypeError(_)));
}

#[test]
fn while_applies_body_once_per_true_condition() {
    // var n := 0; while { n < 3 } do { n := n + 1 }
    let condition = b::block(
        vec![],
        vec![b::explicit_request(
            b::name("n"),
            vec![b::part("<", vec![b::number(3.0)])],
        )],
    );
    let body = b::block(
        vec![],
        vec![b::assign(
            b::name("n"),
            b::explicit_request(b::name("n"), vec![b::part("+", vec![b::number(1.0)])]),
        )],
    );
    let program = b::object(vec![
        b::var("n", Some(b::number(0.0))),
        b::lexical_request(vec![
            b::part("while", vec![condition]),
            b::part("do", vec![body]),
        ]),
    ]);
    let (mut interp, module) = run(program);
    assert_eq!(as_number(&read(&mut interp, &module, "n")), 3.0);
}

#[test]
fn multi_part_method_binds_parameters_across_parts() {
    // method sum(a, b) with(c) { (a + b) + c }
    let body = b::explicit_request(
        b::explicit_request(b::name("a"), vec![b::part("+", vec![b::name("b")])]),
        vec![b::part("+", vec![b::name("c")])],
    );
    let program = b::object(vec![b::method(
        vec![
            b::method_part("sum", vec!["a", "b"]),
            b::method_part("with", vec!["c"]),
        ],
        vec![body],
    )]);
    let (mut interp, module) = run(program);
    let request = Request::new(vec![
        RequestPart::new("sum", vec![Value::Number(1.0), Value::Number(2.0)]),
        RequestPart::new("with", vec![Value::Number(3.0)]),
    ])
    .unwrap();
    let result = interp.send(module, &request).unwrap();
    assert_eq!(as_number(&result), 6.0);
}

#[test]
fn return_unwinds_through_intervening_blocks() {
    // method m { if (true) then { return 42 }; 0 }
    let program = b::object(vec![b::method(
        vec![b::method_part("m", vec![])],
        vec![
            b::lexical_request(vec![
                b::part("if", vec![b::name("true")]),
                b::part(
                    "then",
                    vec![b::block(vec![], vec![b::ret(b::number(42.0))])],
                ),
            ]),
            b::number(0.0),
        ],
    )]);
    let (mut interp, module) = run(program);
    let result = interp.send(module, &Request::single("m", vec![])).unwrap();
    assert_eq!(as_number(&result), 42.0);
}

#[test]
fn return_outside_any_method_is_invalid() {
    let program = b::object(vec![b::ret(b::number(1.0))]);
    let err = Interpreter::new().run(&program).unwrap_err();
    assert!(matches!(err.error, RuntimeError::InvalidContext(_)));
}

#[test]
fn return_from_completed_activation_escapes() {
    // method stash { saved := { return 99 }; 0 }; applying the saved
    // block later raises a return whose activation already finished.
    let program = b::object(vec![
        b::var("saved", None),
        b::method(
            vec![b::method_part("stash", vec![])],
            vec![
                b::assign(
                    b::name("saved"),
                    b::block(vec![], vec![b::ret(b::number(99.0))]),
                ),
                b::number(0.0),
            ],
        ),
    ]);
    let (mut interp, module) = run(program);
    interp
        .send(module.clone(), &Request::single("stash", vec![]))
        .unwrap();
    let block = read(&mut interp, &module, "saved");
    let err = interp
        .send(block, &Request::single("apply", vec![]))
        .unwrap_err();
    assert!(matches!(err.error, RuntimeError::EscapedReturn));
}

#[test]
fn block_reads_captured_scope_at_apply_time() {
    // var n := 1; def b = { n }; n := 9; applying b sees the current n.
    let program = b::object(vec![
        b::var("n", Some(b::number(1.0))),
        b::def("b", b::block(vec![], vec![b::name("n")])),
        b::assign(b::name("n"), b::number(9.0)),
    ]);
    let (mut interp, module) = run(program);
    let block = read(&mut interp, &module, "b");
    let result = interp.send(block, &Request::single("apply", vec![])).unwrap();
    assert_eq!(as_number(&result), 9.0);
}

#[test]
fn block_apply_arity_is_checked() {
    let program = b::object(vec![b::def("b", b::block(vec!["p"], vec![b::name("p")]))]);
    let (mut interp, module) = run(program);
    let block = read(&mut interp, &module, "b");

    let ok = interp
        .send(
            block.clone(),
            &Request::single("apply", vec![Value::Number(8.0)]),
        )
        .unwrap();
    assert_eq!(as_number(&ok), 8.0);

    let err = interp
        .send(block, &Request::single("apply", vec![]))
        .unwrap_err();
    assert!(matches!(
        err.error,
        RuntimeError::ArityMismatch { expected: 1, got: 0 }
    ));
}

#[test]
fn object_equality_is_identity() {
    let program = b::object(vec![
        b::def("o1", b::object(vec![])),
        b::def("o2", b::object(vec![])),
    ]);
    let (mut interp, module) = run(program);
    let o1 = read(&mut interp, &module, "o1");
    let o2 = read(&mut interp, &module, "o2");

    let same = interp
        .send(o1.clone(), &Request::single("==", vec![o1.clone()]))
        .unwrap();
    assert!(as_bool(&same));
    let different = interp
        .send(o1.clone(), &Request::single("==", vec![o2]))
        .unwrap();
    assert!(!as_bool(&different));
    let ne = interp
        .send(o1.clone(), &Request::single("!=", vec![o1]))
        .unwrap();
    assert!(!as_bool(&ne));
}

#[test]
fn self_is_the_enclosing_object() {
    let program = b::object(vec![b::method(
        vec![b::method_part("me", vec![])],
        vec![b::name("self")],
    )]);
    let (mut interp, module) = run(program);
    let me = interp
        .send(module.clone(), &Request::single("me", vec![]))
        .unwrap();
    let same = interp
        .send(me, &Request::single("==", vec![module]))
        .unwrap();
    assert!(as_bool(&same));
}

#[test]
fn implicit_setter_fallback_overwrites_def_fields() {
    // Relaxed field mutability: no writer is installed for a def field,
    // but the base request path synthesizes the assignment anyway.
    let program = b::object(vec![
        b::def("inner", b::object(vec![b::def("x", b::number(1.0))])),
        b::assign(
            b::explicit_request(b::name("inner"), vec![b::part("x", vec![])]),
            b::number(9.0),
        ),
    ]);
    let (mut interp, module) = run(program);
    let inner = read(&mut interp, &module, "inner");
    assert_eq!(as_number(&read(&mut interp, &inner, "x")), 9.0);
}

#[test]
fn interpolated_string_concatenates_segments() {
    // "a{x}b" with x = 5
    let program = b::object(vec![
        b::def("x", b::number(5.0)),
        b::def("s", b::interp_string("a", b::name("x"), b::string("b"))),
    ]);
    let (mut interp, module) = run(program);
    match read(&mut interp, &module, "s") {
        Value::String(s) => assert_eq!(s, "a5b"),
        other => panic!("expected String, got {:?}", other),
    }
}

#[test]
fn interpolated_string_must_end_in_literal() {
    let program = b::object(vec![b::def(
        "s",
        b::interp_string("a", b::number(1.0), b::number(2.0)),
    )]);
    let err = Interpreter::new().run(&program).unwrap_err();
    assert!(matches!(err.error, RuntimeError::MalformedNode(_)));
}

#[test]
fn comments_evaluate_to_done() {
    let program = b::object(vec![b::comment("nothing to see"), b::def("x", b::number(1.0))]);
    let (mut interp, module) = run(program);
    assert_eq!(as_number(&read(&mut interp, &module, "x")), 1.0);
}

#[test]
fn print_goes_to_the_captured_buffer() {
    let program = b::object(vec![
        b::def("x", b::number(5.0)),
        b::lexical_request(vec![b::part("print", vec![b::name("x")])]),
    ]);
    let (mut interp, buffer) = Interpreter::with_captured_output();
    interp.run(&program).unwrap();
    assert_eq!(*buffer.lock().unwrap(), "5\n");
}

#[test]
fn string_and_number_primitive_methods() {
    let mut interp = Interpreter::new();

    let concat = interp
        .send(
            Value::String("n: ".to_string()),
            &Request::single("++", vec![Value::Number(4.0)]),
        )
        .unwrap();
    assert!(matches!(concat, Value::String(ref s) if s == "n: 4"));

    let size = interp
        .send(Value::String("abc".to_string()), &Request::single("size", vec![]))
        .unwrap();
    assert_eq!(as_number(&size), 3.0);

    let negated = interp
        .send(Value::Number(2.0), &Request::single("prefix-", vec![]))
        .unwrap();
    assert_eq!(as_number(&negated), -2.0);

    let err = interp
        .send(
            Value::Number(1.0),
            &Request::single("/", vec![Value::Number(0.0)]),
        )
        .unwrap_err();
    assert!(matches!(err.error, RuntimeError::DivisionByZero));
}
