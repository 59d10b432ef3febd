#![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

use pretty_assertions::assert_eq;

use super::*;
use crate::functions::{Native, NativeFn};

fn define_sum(env: &mut Environment) {
    env.define_function(
        "sum",
        NativeFn::Integer(Native::contextual(|env| {
            (1..=env.get_arg_count())
                .filter_map(|pos| env.get_integer_arg(pos))
                .sum()
        })),
        Some("2*n"),
    )
    .expect("define");
}

#[test]
fn unknown_function_is_rejected() {
    let mut env = Environment::new();
    let arg = env.constant_integer(1);
    let before = env.exprs().live();
    let err = env.build_call("nosuch", vec![arg]).expect_err("unknown");
    assert_eq!(err, BuildError::UnknownFunction("nosuch".to_string()));
    assert_eq!(err.to_string(), "missing function declaration for nosuch");
    // The argument tree was freed.
    assert_eq!(env.exprs().live(), before - 1);
}

#[test]
fn arity_is_checked() {
    let mut env = Environment::new();
    define_sum(&mut env);
    env.define_function("pair", NativeFn::Void(Native::plain(|| ())), Some("22"))
        .expect("define");
    env.define_function("few", NativeFn::Void(Native::plain(|| ())), Some("02"))
        .expect("define");

    let one = env.constant_integer(1);
    let err = env.build_call("sum", vec![one]).expect_err("too few");
    assert!(matches!(
        err,
        BuildError::ArgCount { relation: ArgRelation::AtLeast, expected: 2, actual: 1, .. }
    ));

    let err = env.build_call("pair", Vec::new()).expect_err("exact");
    assert!(matches!(
        err,
        BuildError::ArgCount { relation: ArgRelation::Exactly, expected: 2, actual: 0, .. }
    ));

    let args = (1..=3).map(|n| env.constant_integer(n)).collect();
    let err = env.build_call("few", args).expect_err("too many");
    assert!(matches!(
        err,
        BuildError::ArgCount { relation: ArgRelation::NoMoreThan, expected: 2, actual: 3, .. }
    ));
}

#[test]
fn constant_arguments_are_type_checked() {
    let mut env = Environment::new();
    define_sum(&mut env);
    let a = env.constant_integer(1);
    let b = env.constant_symbol("two");
    let err = env.build_call("sum", vec![a, b]).expect_err("symbol arg");
    assert_eq!(
        err,
        BuildError::ArgType {
            function: "sum".to_string(),
            position: 2,
            expected: "integer or float".to_string(),
        }
    );
}

#[test]
fn variables_are_checked_at_run_time() {
    let mut env = Environment::new();
    define_sum(&mut env);
    let a = env.constant_integer(1);
    let x = env.variable("x");
    assert!(env.build_call("sum", vec![a, x]).is_ok());
}

#[test]
fn built_calls_evaluate() {
    let mut env = Environment::new();
    define_sum(&mut env);
    let args: Vec<ExprId> = [3, 4, 5].iter().map(|&n| env.constant_integer(n)).collect();
    let call = env.build_call("sum", args).expect("build");
    assert_eq!(env.exprs().get(call).expect("live").code, TypeCode::FCALL);
    let value = env.eval_expression(call).expect("eval");
    assert_eq!(env.integer_of(&value), Some(12));
}

#[test]
fn call_function_releases_its_tree() {
    let mut env = Environment::new();
    define_sum(&mut env);
    let a = env.create_integer(20);
    let b = env.create_integer(22);
    let before = env.exprs().live();
    let value = env.call_function("sum", &[a, b]).expect("call");
    assert_eq!(env.integer_of(&value), Some(42));
    assert_eq!(env.exprs().live(), before);
    assert_eq!(env.eval_depth(), 0);
}

#[test]
fn call_function_reports_build_errors() {
    let mut env = Environment::new();
    let err = env.call_function("nosuch", &[]).expect_err("unknown");
    assert_eq!(
        err,
        CallError::Build(BuildError::UnknownFunction("nosuch".to_string()))
    );
}

#[test]
fn call_function_surfaces_eval_failures() {
    let mut env = Environment::builder()
        .router(clp_diagnostic::silent_router())
        .build();
    env.define_function(
        "fails",
        NativeFn::Boolean(Native::contextual(|env| {
            env.set_eval_error(true);
            false
        })),
        None,
    )
    .expect("define");
    let err = env.call_function("fails", &[]).expect_err("failure");
    let CallError::Eval { function, failure } = err else {
        panic!("expected an evaluation failure");
    };
    assert_eq!(function, "fails");
    assert_eq!(failure.placeholder, env.boolean(false));
}
