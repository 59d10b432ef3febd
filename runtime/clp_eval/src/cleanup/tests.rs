#![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

use std::sync::{Arc, Mutex};

use clp_ir::AtomRef;

use crate::ExternalAddressType;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn periodic_functions_run_by_priority() {
    let mut env = Environment::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    for (name, priority) in [("low", -5), ("high", 10), ("mid", 0)] {
        let log = Arc::clone(&log);
        env.add_periodic_function(name, priority, move |_| {
            log.lock().expect("lock").push(name);
        })
        .expect("unique name");
    }
    env.periodic_cleanup(true);
    assert_eq!(*log.lock().expect("lock"), vec!["high", "mid", "low"]);
}

#[test]
fn duplicate_and_removal() {
    let mut env = Environment::new();
    env.add_periodic_function("gc", 0, |_| {}).expect("unique name");
    assert_eq!(
        env.add_periodic_function("gc", 1, |_| {}),
        Err(CleanupError::Duplicate("gc".to_string()))
    );
    assert!(env.remove_periodic_function("gc"));
    assert!(!env.remove_periodic_function("gc"));
}

#[test]
fn heuristics_wait_for_thresholds() {
    let config = crate::EnvConfig {
        max_ephemeral_count: 3,
        ..crate::EnvConfig::default()
    };
    let mut env = Environment::builder().config(config).build();
    // Drops the pinned well-known symbols from the pending list.
    env.periodic_cleanup(false);
    assert_eq!(env.atoms().ephemeral_len(), 0);

    env.with_nested_depth(|env| {
        let _ = env.create_integer(1);
        let _ = env.create_integer(2);
    });
    assert_eq!(env.periodic_cleanup(true), 0);
    assert!(env.atoms().lookup_integer(1).is_some());

    env.with_nested_depth(|env| {
        let _ = env.create_integer(3);
    });
    assert_eq!(env.periodic_cleanup(true), 3);
    assert_eq!(env.atoms().lookup_integer(1), None);
}

#[test]
fn cleanup_respects_depth() {
    let mut env = Environment::new();
    let shallow = env.create_integer(10);
    env.with_nested_depth(|env| {
        let _ = env.create_integer(20);
    });
    env.periodic_cleanup(false);
    assert_eq!(env.integer_of(&shallow), Some(10));
    assert_eq!(env.atoms().lookup_integer(20), None);

    env.full_cleanup();
    assert_eq!(env.atoms().lookup_integer(10), None);
}

#[test]
fn claimed_values_survive_full_cleanup() {
    let mut env = Environment::new();
    let kept = env.create_string("kept");
    env.value_install(&kept);
    env.full_cleanup();
    let atom = kept.atom().expect("atom");
    assert_eq!(env.atoms().count(atom).expect("live"), 1);
    assert!(!env.atoms().is_ephemeral(atom).expect("live"));
    assert!(env
        .atoms()
        .is_ephemeral(AtomRef::Symbol(env.true_symbol()))
        .is_ok_and(|ephemeral| !ephemeral));
}

#[test]
fn idle_lists_are_flushed() {
    let mut env = Environment::new();
    let busy = env.with_nested_depth(|env| {
        let busy = env.create_list(Vec::new());
        let _ = env.create_list(Vec::new());
        busy
    });
    env.value_install(&busy);
    let reclaimed = env.periodic_cleanup(false);
    assert_eq!(reclaimed, 1);
    assert_eq!(env.lists().live(), 1);
}

#[test]
fn discard_hook_runs_once_per_reclaimed_address() {
    let mut env = Environment::new();
    let discarded = Arc::new(Mutex::new(Vec::new()));
    let kind = {
        let discarded = Arc::clone(&discarded);
        ExternalAddressType::new("handle").on_discard(move |raw| {
            discarded.lock().expect("lock").push(raw);
        })
    };
    let index = env.install_ext_address_type(kind);

    let kept = env.create_external_address(0xa0, index);
    env.value_install(&kept);
    env.with_nested_depth(|env| {
        let _ = env.create_external_address(0xb0, index);
    });
    env.periodic_cleanup(false);
    assert_eq!(*discarded.lock().expect("lock"), vec![0xb0]);

    let _ = env.create_external_address(0xc0, index);
    env.full_cleanup();
    env.full_cleanup();
    assert_eq!(*discarded.lock().expect("lock"), vec![0xb0, 0xc0]);
    assert_eq!(env.display_value(&kept), "<Pointer-handle-0xa0>");
}
