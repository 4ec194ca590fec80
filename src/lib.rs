//! An intrusive AVL tree.
//!
//! Every node embeds a [`Links`] value holding its parent and child pointers together with its
//! balance factor, the height of its right subtree minus the height of its left subtree. The
//! tree maintains the AVL property: at rest, every balance factor is -1, 0 or 1, which bounds the
//! height of a tree of `n` nodes by roughly `1.44 * log2(n + 2)`.
//!
//! [`AvlTree`] links caller-provided handles. [`AvlMap`] is an owning ordered map built on top of
//! it, and [`equal_paths`] is a small, unrelated check over plain binary trees.
#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

use core::{borrow::Borrow, cmp::Ordering, fmt, pin::Pin, ptr::NonNull};

use cordyceps::Linked;

mod cursor;
mod error;
mod iter;
mod links;
mod rebalance;
mod trace;

#[cfg(feature = "alloc")]
mod debug;
#[cfg(feature = "alloc")]
pub mod equal_paths;
#[cfg(feature = "alloc")]
mod map;

#[cfg(all(feature = "std", any(test, feature = "model")))]
pub mod model;


pub use cursor::{Cursor, CursorMut};
pub use error::KeyError;
pub use iter::Iter;
pub use links::Links;

#[cfg(feature = "alloc")]
pub use equal_paths::{equal_paths, BinaryNode};
#[cfg(feature = "alloc")]
pub use map::AvlMap;

use links::{Dir, Link};
use trace::trace_log;

/// A node that can be linked into an [`AvlTree`].
pub trait TreeNode<L>: Linked<L> {
    type Key: Ord;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Nodes are ordered by [`TreeNode::key`], and keys are unique within a tree. The tree owns the
/// handles of its linked nodes and drops them when it is cleared or dropped.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree.
    ///
    /// An empty tree has height 0 and a lone root has height 1.
    pub fn height(&self) -> usize {
        unsafe { self.height_at(self.root) }
    }

    /// Returns `true` if the heights of the two subtrees of every node differ by at most one.
    ///
    /// Heights are recomputed from the structure, not read from the stored balance factors.
    pub fn is_balanced(&self) -> bool {
        unsafe { self.balanced_height_at(self.root).is_some() }
    }

    unsafe fn height_at(&self, node: Link<T>) -> usize {
        let Some(node) = node else {
            return 0;
        };

        unsafe {
            let links = self.links(node);
            1 + self.height_at(links.left()).max(self.height_at(links.right()))
        }
    }

    unsafe fn balanced_height_at(&self, node: Link<T>) -> Option<usize> {
        let Some(node) = node else {
            return Some(0);
        };

        unsafe {
            let left = self.balanced_height_at(self.links(node).left())?;
            let right = self.balanced_height_at(self.links(node).right())?;

            (left.abs_diff(right) <= 1).then(|| 1 + left.max(right))
        }
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let mut count = 0;

        if let Some(root) = self.root {
            unsafe {
                assert_eq!(self.links(root).parent(), None, "root must not have a parent");
                self.assert_invariants_at(root, &mut count);
            }
        }

        assert_eq!(count, self.len, "length does not match the number of linked nodes");

        let mut keys = self.iter().map(|node| node.key());
        if let Some(mut prev) = keys.next() {
            for key in keys {
                assert!(prev < key, "keys out of order");
                prev = key;
            }
        }
    }

    // Returns the height of the subtree rooted at `node`.
    unsafe fn assert_invariants_at(&self, node: NonNull<T>, count: &mut usize) -> usize {
        *count += 1;

        unsafe {
            let mut heights = [0; 2];

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = self.links(node).child(dir) {
                    // Ensure child's parent link points to this node.
                    let parent = self
                        .links(child)
                        .parent()
                        .expect("child parent pointer not set");
                    assert_eq!(node, parent);

                    heights[dir as usize] = self.assert_invariants_at(child, count);
                }
            }

            let balance = self.links(node).balance();
            let [left, right] = heights;

            assert!((-1..=1).contains(&balance), "balance {balance} out of range");
            assert_eq!(
                right as isize - left as isize,
                balance as isize,
                "balance does not match subtree heights"
            );

            1 + left.max(right)
        }
    }

    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the node corresponding to `key`.
    ///
    /// The key of the node must not be changed in a way that alters its ordering.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Returns `true` if the tree contains a node corresponding to `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    pub(crate) fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => opt_cur = self.links(cur).left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = self.links(cur).right(),
                }
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        self.first_raw()
            .map(|first| unsafe { Pin::new_unchecked(first.as_ref()) })
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        self.last_raw()
            .map(|last| unsafe { Pin::new_unchecked(last.as_ref()) })
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first_raw()?;
        Some(unsafe { self.remove_at(first) })
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last_raw()?;
        Some(unsafe { self.remove_at(last) })
    }

    /// Returns an in-order iterator over the elements of the tree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Returns a cursor pointing to the first element of the tree.
    pub fn cursor_first(&self) -> Cursor<'_, T> {
        Cursor::first(self)
    }

    /// Returns a cursor pointing to the last element of the tree.
    pub fn cursor_last(&self) -> Cursor<'_, T> {
        Cursor::last(self)
    }

    /// Returns a mutable cursor pointing to the first element of the tree.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::first(self)
    }

    /// Returns a mutable cursor pointing to the last element of the tree.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::last(self)
    }

    /// Returns a mutable cursor pointing to the element corresponding to `key`, if any.
    pub fn find_cursor_mut<Q>(&mut self, key: &Q) -> Option<CursorMut<'_, T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        Some(CursorMut::at(self, ptr))
    }

    pub(crate) fn first_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Left) })
    }

    pub(crate) fn last_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Right) })
    }

    /// Inserts an item into the tree.
    ///
    /// If the tree already holds an element with an equal key, `item` takes its place, inheriting
    /// its position and balance factor, and the displaced element is returned. The shape of the
    /// tree does not change in that case.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        unsafe { self.links_mut(ptr).clear() };

        let Some(mut cur) = self.root else {
            // Tree is empty. Set `item` as the root and return.
            self.root = Some(ptr);
            self.len += 1;
            return None;
        };

        // Descend the tree, looking for an empty slot.
        loop {
            let ordering = unsafe { ptr.as_ref().key().cmp(cur.as_ref().key()) };

            let dir = match ordering {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Some(unsafe { self.replace_in_place(cur, ptr) }),
                Ordering::Greater => Dir::Right,
            };

            match unsafe { self.links(cur).child(dir) } {
                Some(child) => cur = child,
                None => {
                    unsafe { self.insert_as_child(cur, dir, ptr) };
                    return None;
                }
            }
        }
    }

    unsafe fn insert_as_child(&mut self, parent: NonNull<T>, dir: Dir, ptr: NonNull<T>) {
        unsafe {
            self.links_mut(parent).set_child(dir, Some(ptr));
            self.links_mut(ptr).set_parent(Some(parent));
            self.len += 1;

            let parent_links = self.links_mut(parent);
            if parent_links.balance() != 0 {
                // The new leaf filled the shorter side; the subtree height is unchanged.
                parent_links.set_balance(0);
            } else {
                parent_links.set_balance(dir.sign());
                self.insert_fix(parent);
            }
        }
    }

    // Links `new` into the position of `old` and returns `old`'s handle.
    unsafe fn replace_in_place(&mut self, old: NonNull<T>, new: NonNull<T>) -> T::Handle {
        unsafe {
            trace_log!("replacing element with an equal key");

            let old_links = self.links(old);
            let balance = old_links.balance();
            let parent = old_links.parent();
            let left = old_links.left();
            let right = old_links.right();

            self.replace_child_or_set_root(parent, old, Some(new));
            self.maybe_set_parent(left, Some(new));
            self.maybe_set_parent(right, Some(new));

            let new_links = self.links_mut(new);
            new_links.set_parent(parent);
            new_links.set_left(left);
            new_links.set_right(right);
            new_links.set_balance(balance);

            self.links_mut(old).clear();

            T::from_ptr(old)
        }
    }

    /// Removes the element corresponding to `key` from the tree.
    ///
    /// Returns `None`, leaving the tree untouched, if no element has that key.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        Some(unsafe { self.remove_at(node) })
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// A node with two children first trades places with its in-order predecessor, so the node
    /// that is unlinked always has at most one child. Both nodes keep their identity; only their
    /// positions and balance factors are exchanged.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        unsafe {
            if let (Some(left), Some(_)) = (self.links(node).left(), self.links(node).right()) {
                let predecessor = self.extreme_in_subtree(left, Dir::Right);
                self.node_swap(node, predecessor);
            }

            let links = self.links(node);
            let parent = links.parent();
            let child = links.left().or(links.right());

            // The side of `parent` that lost a level.
            let diff = parent.map_or(0, |p| -self.which_child(p, node).sign());

            self.replace_child_or_set_root(parent, node, child);
            self.maybe_set_parent(child, parent);
            self.links_mut(node).clear();
            self.len -= 1;

            trace_log!(diff, had_child = child.is_some(), "unlinked element");

            if let Some(parent) = parent {
                self.remove_fix(parent, diff);
            }

            T::from_ptr(node)
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let cur = self.extreme_in_subtree(cur, Dir::Left);
                let parent = self.links(cur).parent();
                let right = self.links(cur).right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                self.links_mut(cur).clear();
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Structural support ======================================================

    #[inline]
    pub(crate) unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    pub(crate) unsafe fn links_mut<'a>(&mut self, node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    // Returns the last node reached by repeatedly following `dir` from `root`.
    #[inline]
    unsafe fn extreme_in_subtree(&self, root: NonNull<T>, dir: Dir) -> NonNull<T> {
        let mut cur = root;

        while let Some(next) = unsafe { self.links(cur).child(dir) } {
            cur = next;
        }

        cur
    }

    // Returns the in-order neighbor of `node` in direction `dir`.
    unsafe fn neighbor_raw(&self, node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe {
            if let Some(child) = self.links(node).child(dir) {
                return Some(self.extreme_in_subtree(child, !dir));
            }

            // Climb until `cur` is a `!dir` child; its parent is the neighbor.
            let mut cur = node;
            while let Some(parent) = self.links(cur).parent() {
                if self.links(parent).child(!dir) == Some(cur) {
                    return Some(parent);
                }

                cur = parent;
            }

            None
        }
    }

    pub(crate) unsafe fn predecessor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.neighbor_raw(node, Dir::Left) }
    }

    pub(crate) unsafe fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.neighbor_raw(node, Dir::Right) }
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { self.links_mut(node).set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that `old_child` is a child node of `parent`.
    #[inline]
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        unsafe {
            let dir = self.which_child(parent, old_child);
            debug_assert_eq!(
                self.links(parent).child(dir),
                Some(old_child),
                "`old_child` must be a child of `parent`"
            );

            self.links_mut(parent).set_child(dir, new_child);
        }
    }

    #[inline]
    pub(crate) unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        if unsafe { self.links(parent).left() } == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    // Exchanges the positions of two linked nodes, along with their balance factors.
    //
    // The balance factor describes a position rather than a node, so it moves with the position.
    // Either node may be the parent of the other.
    unsafe fn node_swap(&mut self, a: NonNull<T>, b: NonNull<T>) {
        if a == b {
            return;
        }

        trace_log!("swapping node positions");

        // Any link to one of the pair must point at the other after the swap.
        let swapped = |link: Link<T>| match link {
            Some(n) if n == a => Some(b),
            Some(n) if n == b => Some(a),
            other => other,
        };

        unsafe {
            let a_links = self.links(a);
            let (a_parent, a_left, a_right, a_balance) = (
                a_links.parent(),
                a_links.left(),
                a_links.right(),
                a_links.balance(),
            );
            let b_links = self.links(b);
            let (b_parent, b_left, b_right, b_balance) = (
                b_links.parent(),
                b_links.left(),
                b_links.right(),
                b_links.balance(),
            );

            // Read both slots before writing either: `a` and `b` may be siblings.
            let a_slot = a_parent.map(|p| (p, self.which_child(p, a)));
            let b_slot = b_parent.map(|p| (p, self.which_child(p, b)));

            let a_links = self.links_mut(a);
            a_links.set_parent(swapped(b_parent));
            a_links.set_left(swapped(b_left));
            a_links.set_right(swapped(b_right));
            a_links.set_balance(b_balance);

            let b_links = self.links_mut(b);
            b_links.set_parent(swapped(a_parent));
            b_links.set_left(swapped(a_left));
            b_links.set_right(swapped(a_right));
            b_links.set_balance(a_balance);

            match a_slot {
                Some((parent, dir)) if parent != b => {
                    self.links_mut(parent).set_child(dir, Some(b));
                }
                Some(_) => {}
                None => self.root = Some(b),
            }

            match b_slot {
                Some((parent, dir)) if parent != a => {
                    self.links_mut(parent).set_child(dir, Some(a));
                }
                Some(_) => {}
                None => self.root = Some(a),
            }

            for node in [a, b] {
                let left = self.links(node).left();
                let right = self.links(node).right();
                self.maybe_set_parent(left, Some(node));
                self.maybe_set_parent(right, Some(node));
            }
        }
    }
}

impl<T> Default for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> fmt::Debug for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
    T::Key: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(|node| node.key()))
            .finish()
    }
}

impl<'tree, T> IntoIterator for &'tree AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
