#![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

use clp_ir::TypeCode;
use pretty_assertions::assert_eq;

use super::*;
use crate::errors::RestrictionError;

fn seven() -> NativeFn {
    NativeFn::Integer(Native::plain(|| 7))
}

#[test]
fn define_and_find() {
    let mut env = Environment::new();
    let id = env.define_function("seven", seven(), Some("00")).expect("define");
    assert_eq!(env.find_function("seven"), Some(id));
    let descriptor = env.function(id).expect("registered");
    assert_eq!(descriptor.name(), "seven");
    assert_eq!(descriptor.return_tag, ReturnTag::Long);
    assert_eq!(descriptor.restriction_text(), Some("00"));
    assert!(!descriptor.native.is_contextual());
    assert_eq!(env.functions().len(), 1);
}

#[test]
fn name_symbol_is_pinned_while_registered() {
    let mut env = Environment::new();
    env.define_function("seven", seven(), None).expect("define");
    let symbol = env.atoms().lookup_symbol("seven").expect("interned");
    assert_eq!(env.atoms().count(AtomRef::Symbol(symbol)).expect("live"), 1);

    env.undefine_function("seven").expect("undefine");
    assert_eq!(env.atoms().count(AtomRef::Symbol(symbol)).expect("live"), 0);
    assert_eq!(env.find_function("seven"), None);
}

#[test]
fn redefinition_keeps_the_handle() {
    let mut env = Environment::new();
    let first = env.define_function("f", seven(), None).expect("define");
    let second = env
        .define_function("f", NativeFn::Float(Native::plain(|| 1.5)), Some("11"))
        .expect("redefine");
    assert_eq!(first, second);
    let descriptor = env.function(first).expect("registered");
    assert_eq!(descriptor.return_tag, ReturnTag::Double);
    assert_eq!(descriptor.native.shape(), "float");
}

#[test]
fn explicit_tags_must_fit_the_shape() {
    let mut env = Environment::new();
    env.define_function_with_tag("small", 'i', seven(), None)
        .expect("integer tag on integer body");
    assert_eq!(
        env.define_function_with_tag("bad", 'd', seven(), None),
        Err(DefineError::TagShapeMismatch {
            name: "bad".to_string(),
            tag: 'd',
            shape: "integer",
        })
    );
    assert_eq!(
        env.define_function_with_tag("bad", 'z', seven(), None),
        Err(DefineError::UnknownReturnTag('z'))
    );
    assert_eq!(env.find_function("bad"), None);
}

#[test]
fn malformed_restrictions_are_rejected() {
    let mut env = Environment::new();
    assert_eq!(
        env.define_function("f", seven(), Some("1")),
        Err(DefineError::Restriction(RestrictionError::MissingCounts(
            "1".to_string()
        )))
    );
    assert_eq!(
        env.define_function("f", seven(), Some("21")),
        Err(DefineError::Restriction(RestrictionError::MinExceedsMax(
            "21".to_string()
        )))
    );
    assert_eq!(
        env.define_function("f", seven(), Some("11z")),
        Err(DefineError::Restriction(RestrictionError::UnknownType {
            text: "11z".to_string(),
            found: 'z',
        }))
    );
}

#[test]
fn restriction_types_by_position() {
    let restriction = Restriction::parse("1*nk").expect("valid");
    assert_eq!(restriction.min, Some(1));
    assert_eq!(restriction.max, None);
    assert_eq!(restriction.types_for(1), TypeSet::LEXEME);
    assert_eq!(restriction.types_for(2), TypeSet::NUMBER);
    assert_eq!(restriction.types_for(7), TypeSet::NUMBER);
    assert!(restriction.types_for(1).accepts(TypeCode::STRING));
    assert!(!restriction.types_for(2).accepts(TypeCode::SYMBOL));
}

#[test]
fn type_sets_describe_themselves() {
    assert_eq!(TypeSet::NUMBER.describe(), "integer or float");
    assert_eq!(
        TypeSet::from_char('j').map(TypeSet::describe),
        Some("symbol, string or instance name".to_string())
    );
    assert_eq!(TypeSet::ANY.describe(), "any value");
    assert!(TypeSet::from_char('u').is_some_and(|set| set.accepts(TypeCode::new(50))));
}

#[test]
fn functions_in_use_cannot_be_removed() {
    let mut env = Environment::new();
    let id = env.define_function("seven", seven(), None).expect("define");
    let call = env.build_call("seven", Vec::new()).expect("build");
    env.increment_expression(Some(call));
    assert_eq!(
        env.undefine_function("seven"),
        Err(DefineError::InUse {
            name: "seven".to_string(),
            uses: 1,
        })
    );
    env.decrement_expression(Some(call));
    env.return_expression(Some(call));
    env.undefine_function("seven").expect("unused now");
    assert!(env.function(id).is_none());
    assert_eq!(
        env.undefine_function("seven"),
        Err(DefineError::NotFound("seven".to_string()))
    );
}

#[test]
fn parser_hooks_attach_to_functions() {
    let mut env = Environment::new();
    let id = env.define_function("seven", seven(), None).expect("define");
    env.set_function_parser("seven", Arc::new(|_, expr| Some(expr)))
        .expect("registered");
    assert!(env.function(id).is_some_and(|d| d.parser.is_some()));
    assert!(env
        .set_function_parser("missing", Arc::new(|_, _| None))
        .is_err());
}
