//! Whole-environment scenarios: building trees, running them as top-level
//! commands, and checking what survives cleanup afterwards.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use clp_eval::{
    buffer_router, init_tracing, silent_router, DataValue, Environment, ErrorCode, ExprId,
    Native, NativeFn, PrimitiveDescriptor, SharedRouter, TypeCode,
};
use pretty_assertions::assert_eq;

fn capturing() -> (Environment, SharedRouter) {
    init_tracing();
    let router = buffer_router();
    let env = Environment::builder().router(router.clone()).build();
    (env, router)
}

#[test]
fn literal_command_leaves_flags_clear() {
    let (mut env, router) = capturing();
    let expr = env.constant_integer(42);
    let value = env.run_command(expr).expect("literal");
    assert_eq!(value.code, TypeCode::INTEGER);
    assert_eq!(env.integer_of(&value), Some(42));
    assert!(!env.eval_error());
    assert!(!env.halt());
    assert!(router.diagnostics().is_empty());
}

#[test]
fn native_integer_result_is_the_interned_handle() {
    let mut env = Environment::new();
    env.define_function("seven", NativeFn::Integer(Native::plain(|| 7)), None)
        .expect("define");
    let expr = env.build_call("seven", Vec::new()).expect("build");
    let value = env.run_command(expr).expect("call");
    let id = env.atoms().lookup_integer(7).expect("interned");
    assert_eq!(value, DataValue::integer(id));
}

#[test]
fn unknown_functions_never_reach_the_evaluator() {
    let mut env = Environment::new();
    assert!(env.build_call("undefined-thing", Vec::new()).is_err());
    assert_eq!(env.call_depth(), 0);
}

#[test]
fn nonexistent_argument_halts_the_command() {
    let (mut env, router) = capturing();
    env.define_function(
        "fifth",
        NativeFn::Generic(Native::contextual(|env| {
            env.get_arg_at(5).unwrap_or_else(|| env.boolean(false))
        })),
        None,
    )
    .expect("define");
    let args: Vec<ExprId> = (1..=3).map(|n| env.constant_integer(n)).collect();
    let expr = env.build_call("fifth", args).expect("build");

    let failure = env.run_command(expr).expect_err("missing argument");
    assert_eq!(failure.placeholder, env.boolean(false));
    assert!(env.halt());
    assert!(env.eval_error());
    let diagnostics = router.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, ErrorCode::NonexistentArgument);
    assert_eq!(
        diagnostics[0].message,
        "Function fifth received a request for argument 5 which is non-existent"
    );

    // The next command starts with clear flags.
    let again = env.constant_integer(1);
    assert!(env.run_command(again).is_ok());
    assert!(!env.halt());
}

#[test]
fn nested_calls_see_their_own_arguments() {
    let mut env = Environment::new();
    env.define_function(
        "plus",
        NativeFn::Integer(Native::contextual(|env| {
            env.get_integer_arg(1).unwrap_or(0) + env.get_integer_arg(2).unwrap_or(0)
        })),
        Some("22n"),
    )
    .expect("define");
    env.define_function(
        "twice",
        NativeFn::Integer(Native::contextual(|env| 2 * env.get_integer_arg(1).unwrap_or(0))),
        Some("11n"),
    )
    .expect("define");

    let one = env.constant_integer(1);
    let two = env.constant_integer(2);
    let inner = env.build_call("plus", vec![one, two]).expect("build");
    let outer = env.build_call("twice", vec![inner]).expect("build");
    let ten = env.constant_integer(10);
    let top = env.build_call("plus", vec![outer, ten]).expect("build");

    let value = env.run_command(top).expect("eval");
    assert_eq!(env.integer_of(&value), Some(16));
    assert_eq!(env.call_depth(), 0);
    assert_eq!(env.eval_depth(), 0);
}

#[test]
fn results_survive_cleanup_but_temporaries_do_not() {
    let mut env = Environment::new();
    env.define_function(
        "pair",
        NativeFn::Generic(Native::contextual(|env| {
            let _scratch = env.create_string("scratch");
            let a = env.create_symbol("left");
            let b = env.create_float(2.5);
            env.create_list(vec![a, b])
        })),
        Some("00"),
    )
    .expect("define");
    let expr = env.build_call("pair", Vec::new()).expect("build");
    let value = env.run_command(expr).expect("eval");

    env.periodic_cleanup(false);
    assert_eq!(env.format_value(&value), "(left 2.5)");
    assert!(env.atoms().lookup_symbol("scratch").is_none());
    assert!(env.atoms().lookup_symbol("left").is_some());
}

#[test]
fn earlier_command_results_are_reclaimed_by_later_commands() {
    let mut env = Environment::new();
    let counter = Arc::new(AtomicI64::new(0));
    let next = Arc::clone(&counter);
    env.define_function(
        "tick",
        NativeFn::Integer(Native::plain(move || next.fetch_add(1, Ordering::Relaxed) + 1)),
        None,
    )
    .expect("define");
    let expr = env.build_call("tick", Vec::new()).expect("build");

    let mut last = DataValue::VOID;
    for _ in 0..500 {
        last = env.run_command(expr).expect("eval");
    }
    env.periodic_cleanup(false);

    assert_eq!(env.last_result(), Some(last));
    assert_eq!(env.integer_of(&last), Some(500));
    assert!((1..500).all(|n| env.atoms().lookup_integer(n).is_none()));
    assert_eq!(counter.load(Ordering::Relaxed), 500);
}

#[test]
fn installed_values_outlive_full_cleanup() {
    let mut env = Environment::new();
    let kept = env.create_string("kept");
    let _ = env.create_string("dropped");
    env.value_install(&kept);
    env.full_cleanup();
    assert!(env.atoms().lookup_symbol("kept").is_some());
    assert!(env.atoms().lookup_symbol("dropped").is_none());

    env.value_deinstall(&kept);
    env.full_cleanup();
    assert!(env.atoms().lookup_symbol("kept").is_none());
}

#[test]
#[should_panic(expected = "[SYMBOL3]")]
fn deinstalling_an_unclaimed_value_is_fatal() {
    let mut env = Environment::builder().router(silent_router()).build();
    let value = env.create_symbol("fresh");
    env.value_deinstall(&value);
}

#[test]
fn globals_resolve_inside_commands() {
    let mut env = Environment::new();
    let limit = env.create_integer(99);
    env.bind_global("limit", limit);
    let reference = env.global_variable("limit");
    let value = env.run_command(reference).expect("bound");
    assert_eq!(env.integer_of(&value), Some(99));

    let (mut env, router) = capturing();
    let reference = env.variable("x");
    let failure = env.run_command(reference).expect_err("unbound");
    assert_eq!(failure.placeholder, env.boolean(false));
    assert_eq!(router.diagnostics()[0].code, ErrorCode::UnboundVariable);
}

#[test]
fn procedural_calls_dispatch_through_primitives() {
    let mut env = Environment::new();
    env.install_primitive(
        TypeCode::PCALL,
        PrimitiveDescriptor::new("deffunction").evaluator(|env, _expr| {
            let count = env.get_arg_count();
            let last = env.get_arg_at(count);
            last.unwrap_or(DataValue::VOID)
        }),
    );
    let a = env.constant_symbol("first");
    let b = env.constant_symbol("last");
    let call = env.build_primitive_call(TypeCode::PCALL, 0, &[a, b]);
    let value = env.run_command(call).expect("eval");
    assert_eq!(env.lexeme_of(&value), Some("last"));
}

#[test]
fn printed_results_reach_the_router() {
    let (mut env, router) = capturing();
    env.define_function(
        "greet",
        NativeFn::Void(Native::contextual(|env| {
            let name = env.get_arg_at(1).unwrap_or(DataValue::VOID);
            let text = format!("hello {}\n", env.display_value(&name));
            env.print_router("t", &text);
        })),
        Some("11k"),
    )
    .expect("define");
    let who = env.constant_string("world");
    let expr = env.build_call("greet", vec![who]).expect("build");
    assert_eq!(env.run_command(expr), Ok(DataValue::VOID));
    assert_eq!(router.output("stdout"), "hello world\n");
}
