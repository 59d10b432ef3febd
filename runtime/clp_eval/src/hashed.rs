//! Shared installed expressions.
//!
//! Constructs that install many structurally identical trees (test
//! conditions, slot defaults) share one pinned copy per shape. Entries are
//! keyed by a structural hash and compared with `identical_expression`.

use std::hash::{Hash, Hasher};

use clp_ir::{ExprId, InternalError};
use rustc_hash::{FxHashMap, FxHasher};
use tracing::trace;

use crate::environment::OrFatal;
use crate::Environment;

#[derive(Debug)]
struct HashedEntry {
    expr: ExprId,
    shares: u32,
}

#[derive(Debug, Default)]
pub struct HashedExpressions {
    buckets: FxHashMap<u64, Vec<HashedEntry>>,
}

impl HashedExpressions {
    /// Distinct shared trees.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Environment {
    /// Share an installed copy of `first`.
    ///
    /// The first request for a shape copies and pins it; later requests for
    /// an identical tree return the same copy. The caller keeps ownership of
    /// `first`.
    pub fn add_hashed_expression(&mut self, first: Option<ExprId>) -> Option<ExprId> {
        let first = first?;
        let key = self.expression_hash(first);
        let found = self.hashed.buckets.get(&key).and_then(|bucket| {
            bucket.iter().position(|entry| {
                self.exprs
                    .identical_expression(Some(entry.expr), Some(first))
                    .or_fatal(self)
            })
        });
        if let Some(entry) = found.and_then(|index| {
            self.hashed
                .buckets
                .get_mut(&key)
                .and_then(|bucket| bucket.get_mut(index))
        }) {
            entry.shares += 1;
            return Some(entry.expr);
        }
        let copy = self.exprs.copy_expression(Some(first)).or_fatal(self)?;
        self.increment_expression(Some(copy));
        self.hashed
            .buckets
            .entry(key)
            .or_default()
            .push(HashedEntry {
                expr: copy,
                shares: 1,
            });
        trace!(key, expr = ?copy, "hashed new expression");
        Some(copy)
    }

    /// Release one share of a tree returned by
    /// [`Environment::add_hashed_expression`]. The last release unpins and
    /// frees it.
    pub fn remove_hashed_expression(&mut self, shared: Option<ExprId>) {
        let Some(shared) = shared else {
            return;
        };
        let key = self.expression_hash(shared);
        let Some(bucket) = self.hashed.buckets.get_mut(&key) else {
            self.system_error(&InternalError::MissingHashedExpression(shared.raw()));
        };
        let Some(index) = bucket.iter().position(|entry| entry.expr == shared) else {
            self.system_error(&InternalError::MissingHashedExpression(shared.raw()));
        };
        bucket[index].shares -= 1;
        if bucket[index].shares > 0 {
            return;
        }
        bucket.swap_remove(index);
        if bucket.is_empty() {
            self.hashed.buckets.remove(&key);
        }
        self.decrement_expression(Some(shared));
        self.return_expression(Some(shared));
    }

    pub fn hashed_expressions(&self) -> &HashedExpressions {
        &self.hashed
    }

    /// Structural hash of the tree rooted at `root` (its siblings excluded).
    fn expression_hash(&self, root: ExprId) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash_tree(root, &mut hasher);
        hasher.finish()
    }

    fn hash_tree(&self, id: ExprId, hasher: &mut FxHasher) {
        let node = self.exprs.get(id).or_fatal(self);
        node.code.hash(hasher);
        node.value.hash(hasher);
        let mut arity = 0usize;
        for arg in self.exprs.siblings(node.args) {
            self.hash_tree(arg, hasher);
            arity += 1;
        }
        arity.hash(hasher);
    }
}
