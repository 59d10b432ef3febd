#![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

use super::*;
use crate::ids::IntegerId;
use pretty_assertions::assert_eq;

fn int(arena: &mut ExprArena, n: u32) -> ExprId {
    arena.generate_constant(DataValue::integer(IntegerId::new(n)))
}

fn call(arena: &mut ExprArena, function: u32, args: &[ExprId]) -> ExprId {
    arena
        .call_node(TypeCode::FCALL, ExprValue::Function(FunctionId::new(function)), args)
        .expect("live args")
}

#[test]
fn constant_is_a_leaf() {
    let mut arena = ExprArena::new();
    let id = int(&mut arena, 4);
    let node = arena.get(id).expect("live");
    assert_eq!(node.args, None);
    assert_eq!(node.next_arg, None);
    assert_eq!(node.constant(), Some(DataValue::integer(IntegerId::new(4))));
}

#[test]
fn count_and_index_arguments() {
    let mut arena = ExprArena::new();
    let args: Vec<_> = (0..3).map(|n| int(&mut arena, n)).collect();
    let root = call(&mut arena, 0, &args);
    let first = arena.get(root).expect("live").args;
    assert_eq!(arena.count_args(first), 3);
    assert_eq!(arena.nth_sibling(first, 2), Some(args[1]));
    assert_eq!(arena.nth_sibling(first, 4), None);
    assert_eq!(arena.nth_sibling(first, 0), None);
    assert_eq!(arena.args(root).expect("live").collect::<Vec<_>>(), args);
}

#[test]
fn return_expression_frees_whole_tree() {
    let mut arena = ExprArena::new();
    let a = int(&mut arena, 1);
    let b = int(&mut arena, 2);
    let inner = call(&mut arena, 1, &[a, b]);
    let c = int(&mut arena, 3);
    let root = call(&mut arena, 0, &[inner, c]);
    assert_eq!(arena.expression_size(Some(root)).expect("live"), 5);

    arena.return_expression(Some(root)).expect("live");
    assert_eq!(arena.live(), 0);
    assert!(arena.get(a).is_err());

    // The pool hands the slots out again.
    let reused = int(&mut arena, 9);
    assert!(reused.index() < 5);
}

#[test]
fn return_tree_keeps_siblings() {
    let mut arena = ExprArena::new();
    let a = int(&mut arena, 1);
    let b = int(&mut arena, 2);
    arena.link_siblings(&[a, b]).expect("live");
    arena.return_tree(a).expect("live");
    assert!(arena.get(b).is_ok());
}

#[test]
fn copy_is_identical_but_disjoint() {
    let mut arena = ExprArena::new();
    let a = int(&mut arena, 1);
    let inner = call(&mut arena, 1, &[a]);
    let root = call(&mut arena, 0, &[inner]);
    let copy = arena.copy_expression(Some(root)).expect("live");
    assert!(arena.identical_expression(Some(root), copy).expect("live"));
    assert_ne!(copy, Some(root));
    assert_eq!(arena.live(), 6);

    let other = int(&mut arena, 2);
    let different = call(&mut arena, 0, &[other]);
    assert!(!arena
        .identical_expression(Some(root), Some(different))
        .expect("live"));
}

#[test]
fn append_links_chains() {
    let mut arena = ExprArena::new();
    let a = int(&mut arena, 1);
    let b = int(&mut arena, 2);
    let c = int(&mut arena, 3);
    let head = arena.link_siblings(&[a, b]).expect("live");
    let joined = arena.append_expressions(head, Some(c)).expect("live");
    assert_eq!(arena.count_args(joined), 3);
    assert_eq!(arena.append_expressions(None, Some(c)).expect("live"), Some(c));
}

#[test]
fn detects_variables() {
    let mut arena = ExprArena::new();
    let var = arena.alloc(ExprNode::leaf(
        TypeCode::SF_VARIABLE,
        ExprValue::Variable(SymbolId::new(0)),
    ));
    let root = call(&mut arena, 0, &[var]);
    assert!(arena.contains_variables(Some(root)).expect("live"));
    let plain = int(&mut arena, 1);
    assert!(!arena.contains_variables(Some(plain)).expect("live"));
}

#[test]
fn walk_visits_parents_before_children() {
    let mut arena = ExprArena::new();
    let a = int(&mut arena, 1);
    let b = int(&mut arena, 2);
    let root = call(&mut arena, 0, &[a, b]);
    let mut order = Vec::new();
    arena
        .try_walk(Some(root), |id, _| {
            order.push(id);
            Ok::<(), InternalError>(())
        })
        .expect("live");
    assert_eq!(order, vec![root, a, b]);
}
