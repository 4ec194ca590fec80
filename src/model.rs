//! Differential models checking the tree against the standard library.
//!
//! Shared by the property tests and the fuzz targets.

use std::{boxed::Box, collections::BTreeMap, prelude::v1::*, ptr::NonNull};

use arbitrary::Arbitrary;
use cordyceps::Linked;
use proptest::{
    arbitrary::any,
    strategy::{Just, Strategy},
};

use crate::{AvlMap, AvlTree, Links, TreeNode};

#[derive(Debug)]
#[repr(C)]
pub struct TestNode {
    pub links: Links<TestNode>,
    pub key: u32,
    pub value: u32,
}

impl TestNode {
    pub fn new(key: u32) -> Box<TestNode> {
        TestNode::with_value(key, 0)
    }

    pub fn with_value(key: u32, value: u32) -> Box<TestNode> {
        Box::new(TestNode {
            links: Links::new(),
            key,
            value,
        })
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

/// How an operation picks its key.
#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum KeyChoice {
    /// The `n`th key currently in the map, wrapping around. Used to hit existing entries.
    Present(usize),
    /// Any key at all, usually an absent one.
    Any(u32),
}

impl KeyChoice {
    fn resolve(self, keys: &[u32]) -> u32 {
        match self {
            KeyChoice::Present(n) if !keys.is_empty() => keys[n % keys.len()],
            KeyChoice::Present(n) => n as u32,
            KeyChoice::Any(key) => key,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Arbitrary)]
pub enum End {
    Front,
    Back,
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(KeyChoice, u32),
    Get(KeyChoice),
    Remove(KeyChoice),
    Peek(End),
    Pop(End),
}

fn key_strategy() -> impl Strategy<Value = KeyChoice> {
    proptest::prop_oneof![
        (0usize..1000).prop_map(KeyChoice::Present),
        (0u32..1000).prop_map(KeyChoice::Any),
    ]
}

fn end_strategy() -> impl Strategy<Value = End> {
    proptest::prop_oneof![Just(End::Front), Just(End::Back)]
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| Op::Insert(key, value)),
        key_strategy().prop_map(Op::Get),
        key_strategy().prop_map(Op::Remove),
        end_strategy().prop_map(Op::Peek),
        end_strategy().prop_map(Op::Pop),
    ]
}

/// Applies `ops` to an [`AvlMap`] and a [`BTreeMap`] side by side, checking that every result
/// matches and that the tree stays valid after each step.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut btree: BTreeMap<u32, u32> = BTreeMap::new();
    let mut avl: AvlMap<u32, u32> = AvlMap::new();

    // Sorted keys of both maps, for resolving `KeyChoice::Present`.
    let mut keys: Vec<u32> = Vec::new();

    for (step, op) in ops.into_iter().enumerate() {
        match op {
            Op::Insert(choice, value) => {
                let key = choice.resolve(&keys);
                assert_eq!(
                    btree.insert(key, value),
                    avl.insert(key, value),
                    "step {step}: insert {key}"
                );
            }

            Op::Get(choice) => {
                let key = choice.resolve(&keys);
                assert_eq!(btree.get(&key), avl.get(&key), "step {step}: get {key}");
            }

            Op::Remove(choice) => {
                let key = choice.resolve(&keys);
                assert_eq!(btree.remove(&key), avl.remove(&key), "step {step}: remove {key}");
            }

            Op::Peek(End::Front) => {
                assert_eq!(btree.first_key_value(), avl.first_key_value(), "step {step}: {op:?}");
            }

            Op::Peek(End::Back) => {
                assert_eq!(btree.last_key_value(), avl.last_key_value(), "step {step}: {op:?}");
            }

            Op::Pop(End::Front) => {
                assert_eq!(btree.pop_first(), avl.pop_first(), "step {step}: {op:?}");
            }

            Op::Pop(End::Back) => {
                assert_eq!(btree.pop_last(), avl.pop_last(), "step {step}: {op:?}");
            }
        }

        if matches!(op, Op::Insert(..) | Op::Remove(_) | Op::Pop(_)) {
            keys.clear();
            keys.extend(btree.keys().copied());
        }

        avl.assert_invariants();
        assert_eq!(btree.len(), avl.len());
        assert!(btree.iter().eq(avl.iter()), "step {step}: contents differ");
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum CursorOp {
    MoveNext,
    MovePrev,
    PeekNext,
    PeekPrev,
    Remove,
    RemoveAndMovePrev,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MoveNext),
        Just(CursorOp::MovePrev),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
        Just(CursorOp::Remove),
        Just(CursorOp::RemoveAndMovePrev),
    ]
}

#[derive(Clone, Debug, Arbitrary)]
pub struct CursorEquivalenceInput {
    pub values: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

// Cursor over a sorted `Vec`. `None` is the ghost position.
struct VecCursor {
    items: Vec<u32>,
    index: Option<usize>,
}

impl VecCursor {
    fn next_index(&self) -> Option<usize> {
        match self.index {
            Some(i) => Some(i + 1).filter(|&i| i < self.items.len()),
            None => (!self.items.is_empty()).then_some(0),
        }
    }

    fn prev_index(&self) -> Option<usize> {
        match self.index {
            Some(i) => i.checked_sub(1),
            None => self.items.len().checked_sub(1),
        }
    }

    fn get(&self) -> Option<&u32> {
        self.index.map(|i| &self.items[i])
    }

    fn peek_next(&self) -> Option<&u32> {
        self.next_index().map(|i| &self.items[i])
    }

    fn peek_prev(&self) -> Option<&u32> {
        self.prev_index().map(|i| &self.items[i])
    }

    fn move_next(&mut self) {
        self.index = self.next_index();
    }

    fn move_prev(&mut self) {
        self.index = self.prev_index();
    }

    fn remove(&mut self) -> Option<u32> {
        let i = self.index?;
        let removed = self.items.remove(i);

        // The successor, if any, has slid into slot `i`.
        if i == self.items.len() {
            self.index = None;
        }

        Some(removed)
    }

    fn remove_and_move_prev(&mut self) -> Option<u32> {
        let i = self.index?;
        self.index = i.checked_sub(1);
        Some(self.items.remove(i))
    }
}

/// Drives a [`CursorMut`](crate::CursorMut) over a tree of `values` and a cursor over a sorted
/// `Vec` through `ops`, checking that both always point at the same key.
pub fn run_cursor_equivalence(mut values: Vec<u32>, ops: Vec<CursorOp>) {
    values.sort_unstable();
    values.dedup();

    let mut avl: AvlTree<TestNode> = AvlTree::new();
    for &value in &values {
        avl.insert(TestNode::new(value));
    }

    let mut model = VecCursor {
        items: values,
        index: None,
    };
    model.move_next();

    let mut cursor = avl.cursor_first_mut();

    for (step, op) in ops.into_iter().enumerate() {
        assert_eq!(model.get(), cursor.get().map(TestNode::key), "step {step}");

        match op {
            CursorOp::MoveNext => {
                model.move_next();
                cursor.move_next();
            }

            CursorOp::MovePrev => {
                model.move_prev();
                cursor.move_prev();
            }

            CursorOp::PeekNext => assert_eq!(
                model.peek_next(),
                cursor.peek_next().map(TestNode::key),
                "step {step}: {op:?}"
            ),

            CursorOp::PeekPrev => assert_eq!(
                model.peek_prev(),
                cursor.peek_prev().map(TestNode::key),
                "step {step}: {op:?}"
            ),

            CursorOp::Remove => assert_eq!(
                model.remove(),
                cursor.remove_current().map(|node| node.key),
                "step {step}: {op:?}"
            ),

            CursorOp::RemoveAndMovePrev => assert_eq!(
                model.remove_and_move_prev(),
                cursor.remove_current_and_move_prev().map(|node| node.key),
                "step {step}: {op:?}"
            ),
        }
    }

    assert_eq!(model.get(), cursor.get().map(TestNode::key));
    drop(cursor);

    avl.assert_invariants();
    assert!(model.items.iter().eq(avl.iter().map(TestNode::key)));
}
