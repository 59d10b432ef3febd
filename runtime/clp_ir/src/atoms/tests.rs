#![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

use super::*;
use pretty_assertions::assert_eq;

fn store() -> (AtomStore, MemoryManager) {
    let sizes = TableSizes {
        symbols: 7,
        integers: 7,
        floats: 7,
        bitmaps: 7,
        external_addresses: 7,
    };
    (AtomStore::new(&sizes), MemoryManager::default())
}

#[test]
fn interning_equal_text_returns_same_handle() {
    let (mut atoms, mut memory) = store();
    let a = atoms.store_symbol("hello", 0, &mut memory).expect("intern");
    let b = atoms.store_symbol("hello", 3, &mut memory).expect("intern");
    assert_eq!(a, b);
    assert_eq!(atoms.symbols().len(), 1);
    // The second request does not move the creation depth.
    assert_eq!(atoms.depth(AtomRef::Symbol(a)).expect("live"), 0);
    assert_eq!(atoms.symbol_text(a).expect("live"), "hello");
}

#[test]
fn new_entries_start_unclaimed_and_ephemeral() {
    let (mut atoms, mut memory) = store();
    let id = atoms.store_integer(42, 2, &mut memory).expect("intern");
    let atom = AtomRef::Integer(id);
    assert_eq!(atoms.count(atom).expect("live"), 0);
    assert!(atoms.is_ephemeral(atom).expect("live"));
    assert_eq!(atoms.depth(atom).expect("live"), 2);
    assert_eq!(atoms.ephemeral_len(), 1);
}

#[test]
fn colliding_keys_share_a_bucket_chain() {
    let (mut atoms, mut memory) = store();
    // 7 buckets: 3, 10 and -17 all land in bucket 3.
    let ids: Vec<_> = [3, 10, -17]
        .into_iter()
        .map(|n| atoms.store_integer(n, 0, &mut memory).expect("intern"))
        .collect();
    for (&id, n) in ids.iter().zip([3i64, 10, -17]) {
        assert_eq!(atoms.integers().bucket_of(id).expect("live"), 3);
        assert_eq!(atoms.integer_value(id).expect("live"), n);
        assert_eq!(atoms.lookup_integer(n), Some(id));
    }
}

#[test]
fn decrement_at_zero_is_an_error() {
    let (mut atoms, mut memory) = store();
    let id = atoms.store_symbol("x", 0, &mut memory).expect("intern");
    let err = atoms.decrement(AtomRef::Symbol(id)).expect_err("underflow");
    assert_eq!(
        err,
        InternalError::CountUnderflow {
            kind: AtomKind::Symbol
        }
    );
}

#[test]
fn sweep_reclaims_only_deeper_unclaimed_entries() {
    let (mut atoms, mut memory) = store();
    let shallow = atoms.store_symbol("shallow", 1, &mut memory).expect("intern");
    let deep = atoms.store_symbol("deep", 3, &mut memory).expect("intern");
    let claimed = atoms.store_symbol("claimed", 3, &mut memory).expect("intern");
    atoms.increment(AtomRef::Symbol(claimed)).expect("live");

    let counts = atoms.remove_ephemeral(Some(1), &mut memory, |_| {});
    assert_eq!(counts.symbols, 1);
    assert_eq!(atoms.lookup_symbol("deep"), None);
    assert!(atoms.symbol_text(deep).is_err());

    // Kept: count zero but not deeper than the threshold.
    assert!(atoms.is_ephemeral(AtomRef::Symbol(shallow)).expect("live"));
    // Claimed: stays live, no longer tracked.
    assert!(!atoms.is_ephemeral(AtomRef::Symbol(claimed)).expect("live"));
    assert_eq!(atoms.ephemeral_len(), 1);
}

#[test]
fn released_entry_returns_to_ephemeral_list() {
    let (mut atoms, mut memory) = store();
    let id = atoms.store_float(1.5, 2, &mut memory).expect("intern");
    let atom = AtomRef::Float(id);
    atoms.increment(atom).expect("live");
    atoms.remove_ephemeral(Some(0), &mut memory, |_| {});
    assert!(!atoms.is_ephemeral(atom).expect("live"));

    atoms.decrement(atom).expect("live");
    assert!(atoms.is_ephemeral(atom).expect("live"));
    let counts = atoms.remove_ephemeral(Some(0), &mut memory, |_| {});
    assert_eq!(counts.floats, 1);
}

#[test]
fn lowered_depth_survives_sweep() {
    let (mut atoms, mut memory) = store();
    let id = atoms.store_integer(7, 2, &mut memory).expect("intern");
    atoms.lower_depth(AtomRef::Integer(id), 1).expect("live");
    let counts = atoms.remove_ephemeral(Some(1), &mut memory, |_| {});
    assert_eq!(counts.total(), 0);
    assert_eq!(atoms.integer_value(id).expect("live"), 7);

    // Never raised.
    atoms.lower_depth(AtomRef::Integer(id), 5).expect("live");
    assert_eq!(atoms.depth(AtomRef::Integer(id)).expect("live"), 1);
}

#[test]
fn full_sweep_ignores_depth() {
    let (mut atoms, mut memory) = store();
    atoms.store_symbol("a", 0, &mut memory).expect("intern");
    atoms.store_bitmap(&[1, 2, 3], 0, &mut memory).expect("intern");
    let counts = atoms.remove_ephemeral(None, &mut memory, |_| {});
    assert_eq!(counts.symbols, 1);
    assert_eq!(counts.bitmaps, 1);
    assert_eq!(atoms.ephemeral_size(), 0);
    assert_eq!(memory.mem_requests(), 0);
}

#[test]
fn reclaimed_slot_is_reused_without_breaking_chain() {
    let (mut atoms, mut memory) = store();
    let first = atoms.store_integer(0, 5, &mut memory).expect("intern");
    let second = atoms.store_integer(7, 0, &mut memory).expect("intern");
    atoms.increment(AtomRef::Integer(second)).expect("live");
    atoms.remove_ephemeral(Some(0), &mut memory, |_| {});

    // 0 and 7 share bucket 0; the survivor is still found.
    assert_eq!(atoms.lookup_integer(7), Some(second));
    let again = atoms.store_integer(14, 0, &mut memory).expect("intern");
    assert_eq!(again.raw(), first.raw());
    assert_eq!(atoms.integer_value(again).expect("live"), 14);
}

#[test]
fn floats_compare_bitwise() {
    let (mut atoms, mut memory) = store();
    let zero = atoms.store_float(0.0, 0, &mut memory).expect("intern");
    let negative = atoms.store_float(-0.0, 0, &mut memory).expect("intern");
    assert_ne!(zero, negative);
    let nan = atoms.store_float(f64::NAN, 0, &mut memory).expect("intern");
    assert_eq!(atoms.lookup_float(f64::NAN), Some(nan));
}

#[test]
fn discard_hook_sees_reclaimed_addresses() {
    let (mut atoms, mut memory) = store();
    let address = ExternalAddress {
        address: 0x1000,
        type_index: 0,
    };
    atoms
        .store_external_address(address, 1, &mut memory)
        .expect("intern");
    let mut discarded = Vec::new();
    atoms.remove_ephemeral(Some(0), &mut memory, |payload| discarded.push(*payload));
    assert_eq!(discarded, vec![address]);
}

#[test]
fn symbol_text_is_returned_to_the_pool() {
    let (mut atoms, mut memory) = store();
    atoms.store_symbol("pooled", 1, &mut memory).expect("intern");
    assert_eq!(memory.mem_requests(), 1);
    atoms.remove_ephemeral(Some(0), &mut memory, |_| {});
    assert_eq!(memory.mem_requests(), 0);
}
