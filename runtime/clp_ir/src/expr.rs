//! Expression trees in a flat arena.
//!
//! Nodes are addressed by [`ExprId`]. A call node's arguments hang off
//! `args` and are chained through `next_arg`; no node has two parents.
//! Freed slots form the node pool reused by later allocations.

use smallvec::SmallVec;

use crate::errors::InternalError;
use crate::ids::{ExprId, FunctionId, SymbolId};
use crate::type_code::TypeCode;
use crate::value::{DataValue, Payload};

/// What a node's value slot holds, depending on its type code.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprValue {
    /// Literal payload of a constant node.
    Constant(Payload),
    /// Function descriptor of an FCALL node.
    Function(FunctionId),
    /// Variable name of a variable reference.
    Variable(SymbolId),
    /// Host-defined value for PCALL/GCALL and extension primitives.
    Extension(u32),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ExprNode {
    pub code: TypeCode,
    pub value: ExprValue,
    pub args: Option<ExprId>,
    pub next_arg: Option<ExprId>,
}

impl ExprNode {
    pub const fn leaf(code: TypeCode, value: ExprValue) -> Self {
        ExprNode {
            code,
            value,
            args: None,
            next_arg: None,
        }
    }

    /// The constant as a tagged value, for constant nodes.
    pub fn constant(&self) -> Option<DataValue> {
        match self.value {
            ExprValue::Constant(payload) => Some(DataValue::new(self.code, payload)),
            _ => None,
        }
    }
}

/// Arena of expression nodes.
#[derive(Default)]
pub struct ExprArena {
    nodes: Vec<Option<ExprNode>>,
    free: Vec<u32>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a node in the arena.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "node handles are u32; memory runs out before the arena holds u32::MAX nodes"
    )]
    pub fn alloc(&mut self, node: ExprNode) -> ExprId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                ExprId::new(slot)
            }
            None => {
                self.nodes.push(Some(node));
                ExprId::new((self.nodes.len() - 1) as u32)
            }
        }
    }

    /// Allocate a leaf holding `value`.
    pub fn generate_constant(&mut self, value: DataValue) -> ExprId {
        self.alloc(ExprNode::leaf(value.code, ExprValue::Constant(value.payload)))
    }

    /// Allocate a call-shaped node whose arguments are `args`, linked in order.
    pub fn call_node(
        &mut self,
        code: TypeCode,
        value: ExprValue,
        args: &[ExprId],
    ) -> Result<ExprId, InternalError> {
        let first = self.link_siblings(args)?;
        Ok(self.alloc(ExprNode {
            code,
            value,
            args: first,
            next_arg: None,
        }))
    }

    /// Chain `items` through `next_arg`, returning the head.
    pub fn link_siblings(&mut self, items: &[ExprId]) -> Result<Option<ExprId>, InternalError> {
        for pair in items.windows(2) {
            self.get_mut(pair[0])?.next_arg = Some(pair[1]);
        }
        if let Some(&last) = items.last() {
            self.get_mut(last)?.next_arg = None;
        }
        Ok(items.first().copied())
    }

    pub fn get(&self, id: ExprId) -> Result<&ExprNode, InternalError> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(InternalError::DeadExpression(id.raw()))
    }

    pub fn get_mut(&mut self, id: ExprId) -> Result<&mut ExprNode, InternalError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(InternalError::DeadExpression(id.raw()))
    }

    /// Iterate a sibling chain starting at `first`.
    pub fn siblings(&self, first: Option<ExprId>) -> Siblings<'_> {
        Siblings {
            arena: self,
            cursor: first,
        }
    }

    /// Iterate the arguments of `id`.
    pub fn args(&self, id: ExprId) -> Result<Siblings<'_>, InternalError> {
        Ok(self.siblings(self.get(id)?.args))
    }

    /// Number of nodes in a sibling chain.
    pub fn count_args(&self, first: Option<ExprId>) -> usize {
        self.siblings(first).count()
    }

    /// The `position`-th (1-based) entry of a sibling chain.
    pub fn nth_sibling(&self, first: Option<ExprId>, position: usize) -> Option<ExprId> {
        if position == 0 {
            return None;
        }
        self.siblings(first).nth(position - 1)
    }

    /// Visit every node reachable from a chain, parents before children.
    pub fn try_walk<E>(
        &self,
        first: Option<ExprId>,
        mut visit: impl FnMut(ExprId, &ExprNode) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<InternalError>,
    {
        let mut stack: SmallVec<[ExprId; 16]> = SmallVec::new();
        stack.extend(first);
        while let Some(id) = stack.pop() {
            let node = self.get(id)?;
            visit(id, node)?;
            // Sibling first so the child is popped (visited) next.
            stack.extend(node.next_arg);
            stack.extend(node.args);
        }
        Ok(())
    }

    /// Free a chain and everything below it back to the pool.
    pub fn return_expression(&mut self, first: Option<ExprId>) -> Result<(), InternalError> {
        let mut reachable = Vec::new();
        self.try_walk(first, |id, _| {
            reachable.push(id);
            Ok::<(), InternalError>(())
        })?;
        for id in reachable {
            self.nodes[id.index()] = None;
            self.free.push(id.raw());
        }
        Ok(())
    }

    /// Free one node and its arguments, leaving its siblings alone.
    pub fn return_tree(&mut self, id: ExprId) -> Result<(), InternalError> {
        self.get_mut(id)?.next_arg = None;
        self.return_expression(Some(id))
    }

    /// Deep-copy a chain.
    pub fn copy_expression(&mut self, first: Option<ExprId>) -> Result<Option<ExprId>, InternalError> {
        let Some(head) = first else {
            return Ok(None);
        };
        let mut copies: SmallVec<[ExprId; 8]> = SmallVec::new();
        let mut cursor = Some(head);
        while let Some(id) = cursor {
            let node = *self.get(id)?;
            let args = self.copy_expression(node.args)?;
            copies.push(self.alloc(ExprNode {
                args,
                next_arg: None,
                ..node
            }));
            cursor = node.next_arg;
        }
        self.link_siblings(&copies)
    }

    /// Structural equality of two chains.
    pub fn identical_expression(
        &self,
        left: Option<ExprId>,
        right: Option<ExprId>,
    ) -> Result<bool, InternalError> {
        let (mut left, mut right) = (left, right);
        loop {
            match (left, right) {
                (None, None) => return Ok(true),
                (Some(a), Some(b)) => {
                    let a = self.get(a)?;
                    let b = self.get(b)?;
                    if a.code != b.code
                        || a.value != b.value
                        || !self.identical_expression(a.args, b.args)?
                    {
                        return Ok(false);
                    }
                    left = a.next_arg;
                    right = b.next_arg;
                }
                _ => return Ok(false),
            }
        }
    }

    /// Number of nodes reachable from a chain.
    pub fn expression_size(&self, first: Option<ExprId>) -> Result<usize, InternalError> {
        let mut size = 0usize;
        self.try_walk(first, |_, _| {
            size += 1;
            Ok::<(), InternalError>(())
        })?;
        Ok(size)
    }

    /// Append chain `tail` after chain `head`, returning the combined head.
    pub fn append_expressions(
        &mut self,
        head: Option<ExprId>,
        tail: Option<ExprId>,
    ) -> Result<Option<ExprId>, InternalError> {
        let Some(first) = head else {
            return Ok(tail);
        };
        let last = self.siblings(Some(first)).last().unwrap_or(first);
        self.get_mut(last)?.next_arg = tail;
        Ok(Some(first))
    }

    /// Whether any node reachable from a chain is a variable reference.
    pub fn contains_variables(&self, first: Option<ExprId>) -> Result<bool, InternalError> {
        let mut found = false;
        self.try_walk(first, |_, node| {
            found |= node.code.is_variable();
            Ok::<(), InternalError>(())
        })?;
        Ok(found)
    }

    /// Nodes currently allocated.
    pub fn live(&self) -> usize {
        self.nodes.len() - self.free.len()
    }
}

/// Iterator over a sibling chain. Stops at the first dead link.
pub struct Siblings<'a> {
    arena: &'a ExprArena,
    cursor: Option<ExprId>,
}

impl Iterator for Siblings<'_> {
    type Item = ExprId;

    fn next(&mut self) -> Option<ExprId> {
        let id = self.cursor?;
        self.cursor = self.arena.get(id).ok().and_then(|node| node.next_arg);
        Some(id)
    }
}

#[cfg(test)]
mod tests;
