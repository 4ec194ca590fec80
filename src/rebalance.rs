//! Rotations and the bottom-up fix-up walks that restore the AVL property after a mutation.
//!
//! Balance factors are `height(right) - height(left)`. Both fix-ups walk upward through parent
//! links, so their cost is bounded by the height of the tree.

use core::ptr::NonNull;

use crate::{
    links::Dir,
    trace::{debug_log, trace_log},
    AvlTree, Links, TreeNode,
};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    // Propagates the growth of `parent`'s subtree toward the root.
    //
    // Invariants:
    // - `parent` just went from balance 0 to -1 or 1, so its subtree is one level taller.
    pub(crate) unsafe fn insert_fix(&mut self, mut parent: NonNull<T>) {
        unsafe {
            while let Some(grand) = self.links(parent).parent() {
                let dir = self.which_child(grand, parent);
                let balance = self.links_mut(grand).update_balance(dir.sign());

                match balance {
                    // The shorter side caught up; the height of `grand` is unchanged.
                    0 => return,

                    // `grand` grew taller as well. Ascend.
                    -1 | 1 => parent = grand,

                    // A single or double rotation restores the height `grand` had before the
                    // insertion, so nothing above it changes.
                    _ => {
                        self.rotate(grand, parent);
                        return;
                    }
                }
            }
        }
    }

    // Propagates the shrinking of one of `node`'s subtrees toward the root.
    //
    // `diff` is +1 if the left subtree of `node` lost a level and -1 if the right one did.
    pub(crate) unsafe fn remove_fix(&mut self, node: NonNull<T>, diff: i8) {
        let mut opt_node = Some(node);
        let mut diff = diff;

        unsafe {
            while let Some(node) = opt_node {
                let parent = self.links(node).parent();

                // Computed before any rotation moves `node` away from `parent`.
                let parent_diff = parent.map_or(0, |p| -self.which_child(p, node).sign());

                let balance = self.links_mut(node).update_balance(diff);

                match balance {
                    -2 | 2 => {
                        let heavy = if balance < 0 { Dir::Left } else { Dir::Right };
                        let pivot = self
                            .links(node)
                            .child(heavy)
                            .expect("the heavy side of a doubly unbalanced node is not empty");
                        let pivot_balance = self.links(pivot).balance();

                        self.rotate(node, pivot);

                        // With an even pivot the rotated subtree keeps its height.
                        if pivot_balance == 0 {
                            debug_log!("remove fix-up ends at an even pivot");
                            return;
                        }
                    }

                    // The subtree absorbed the loss without changing height.
                    -1 | 1 => return,

                    _ => {}
                }

                opt_node = parent;
                diff = parent_diff;
            }
        }
    }

    // Rebalances `grand`, whose balance factor is -2 or 2, with `parent` its child on the heavy
    // side.
    //
    // Covers the four classic cases (left-left, left-right, right-right, right-left), plus the
    // even-child case that only arises during removal.
    pub(crate) unsafe fn rotate(&mut self, grand: NonNull<T>, parent: NonNull<T>) {
        unsafe {
            let dir = self.which_child(grand, parent);
            let sign = dir.sign();
            let parent_balance = self.links(parent).balance();

            // Single rotations that move a node away from the heavy side.
            let (rotate_grand, rotate_parent): (
                unsafe fn(&mut Self, NonNull<T>),
                unsafe fn(&mut Self, NonNull<T>),
            ) = match dir {
                Dir::Left => (Self::rotate_right, Self::rotate_left),
                Dir::Right => (Self::rotate_left, Self::rotate_right),
            };

            trace_log!(
                grand_balance = self.links(grand).balance(),
                parent_balance,
                "rotating"
            );

            if parent_balance == sign {
                // Outer grandchild is taller: single rotation.
                rotate_grand(self, grand);
                self.links_mut(grand).set_balance(0);
                self.links_mut(parent).set_balance(0);
            } else if parent_balance == 0 {
                // Only reachable from removal.
                rotate_grand(self, grand);
                self.links_mut(grand).set_balance(sign);
                self.links_mut(parent).set_balance(-sign);
            } else {
                // Inner grandchild is taller: double rotation.
                let node = self
                    .links(parent)
                    .child(!dir)
                    .expect("the inner child of an inner-heavy node is not empty");
                let node_balance = self.links(node).balance();

                rotate_parent(self, parent);
                rotate_grand(self, grand);

                self.links_mut(node).set_balance(0);
                self.links_mut(grand).set_balance(0);
                self.links_mut(parent).set_balance(0);

                if node_balance == sign {
                    self.links_mut(grand).set_balance(-sign);
                } else if node_balance == -sign {
                    self.links_mut(parent).set_balance(sign);
                }
            }
        }
    }

    /// Rotates left at `pivot`, promoting its right child into its place.
    ///
    /// Balance factors are not updated. Does nothing if `pivot` has no right child.
    pub(crate) unsafe fn rotate_left(&mut self, pivot: NonNull<T>) {
        unsafe { self.rotate_at(pivot, Dir::Left) }
    }

    /// Rotates right at `pivot`, promoting its left child into its place.
    ///
    /// Balance factors are not updated. Does nothing if `pivot` has no left child.
    pub(crate) unsafe fn rotate_right(&mut self, pivot: NonNull<T>) {
        unsafe { self.rotate_at(pivot, Dir::Right) }
    }

    // Moves `down` one level down in direction `dir`, promoting its `!dir` child `up`.
    //
    // - `down` becomes the `dir` child of `up`.
    // - `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
    unsafe fn rotate_at(&mut self, down: NonNull<T>, dir: Dir) {
        unsafe {
            let Some(up) = self.links(down).child(!dir) else {
                return;
            };

            let across = self.links(up).child(dir);
            self.links_mut(down).set_child(!dir, across);
            self.maybe_set_parent(across, Some(down));

            self.links_mut(up).set_child(dir, Some(down));
            let parent = self.links_mut(down).set_parent(Some(up));
            self.links_mut(up).set_parent(parent);

            self.replace_child_or_set_root(parent, down, Some(up));
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use std::{boxed::Box, vec::Vec};

    use super::*;
    use crate::model::TestNode;

    // Builds a degenerate right spine 1 -> 2 -> 3 without rebalancing.
    fn spine(tree: &mut AvlTree<TestNode>) -> [NonNull<TestNode>; 3] {
        let nodes = [1, 2, 3].map(|key| TestNode::into_raw(TestNode::new(key)));

        unsafe {
            tree.root = Some(nodes[0]);
            tree.links_mut(nodes[0]).set_right(Some(nodes[1]));
            tree.links_mut(nodes[1]).set_parent(Some(nodes[0]));
            tree.links_mut(nodes[1]).set_right(Some(nodes[2]));
            tree.links_mut(nodes[2]).set_parent(Some(nodes[1]));
        }
        tree.len = 3;

        nodes
    }

    fn keys(tree: &AvlTree<TestNode>) -> Vec<u32> {
        tree.iter().map(|node| node.key).collect()
    }

    #[test]
    fn rotate_left_promotes_right_child() {
        let mut tree = AvlTree::new();
        let [one, two, three] = spine(&mut tree);

        unsafe {
            tree.rotate_left(one);

            assert_eq!(tree.root, Some(two));
            assert_eq!(tree.links(two).parent(), None);
            assert_eq!(tree.links(two).left(), Some(one));
            assert_eq!(tree.links(two).right(), Some(three));
            assert_eq!(tree.links(one).parent(), Some(two));
            assert_eq!(tree.links(one).right(), None);
        }

        assert_eq!(keys(&tree), [1, 2, 3]);
    }

    #[test]
    fn rotate_right_undoes_rotate_left() {
        let mut tree = AvlTree::new();
        let [one, two, _] = spine(&mut tree);

        unsafe {
            tree.rotate_left(one);
            tree.rotate_right(two);

            assert_eq!(tree.root, Some(one));
            assert_eq!(tree.links(one).left(), None);
            assert_eq!(tree.links(one).right(), Some(two));
            assert_eq!(tree.links(two).parent(), Some(one));
        }

        assert_eq!(keys(&tree), [1, 2, 3]);
    }

    #[test]
    fn rotation_without_promotable_child_is_noop() {
        let mut tree = AvlTree::new();
        let [one, two, three] = spine(&mut tree);

        unsafe {
            tree.rotate_right(one);
            tree.rotate_left(three);

            assert_eq!(tree.root, Some(one));
            assert_eq!(tree.links(one).right(), Some(two));
            assert_eq!(tree.links(two).right(), Some(three));
        }
    }

    #[test]
    fn rotate_rebalances_right_right() {
        let mut tree = AvlTree::new();
        let [one, two, three] = spine(&mut tree);

        unsafe {
            tree.links_mut(one).set_balance(2);
            tree.links_mut(two).set_balance(1);

            tree.rotate(one, two);

            assert_eq!(tree.root, Some(two));
            for node in [one, two, three] {
                assert_eq!(tree.links(node).balance(), 0);
            }
        }

        tree.assert_invariants();
    }

    #[test]
    fn rotate_rebalances_left_right() {
        let mut tree: AvlTree<TestNode> = AvlTree::new();
        let nodes = [3, 1, 2].map(|key| TestNode::into_raw(TestNode::new(key)));
        let [three, one, two] = nodes;

        unsafe {
            tree.root = Some(three);
            tree.links_mut(three).set_left(Some(one));
            tree.links_mut(one).set_parent(Some(three));
            tree.links_mut(one).set_right(Some(two));
            tree.links_mut(two).set_parent(Some(one));
            tree.len = 3;

            tree.links_mut(three).set_balance(-2);
            tree.links_mut(one).set_balance(1);

            tree.rotate(three, one);

            assert_eq!(tree.root, Some(two));
            assert_eq!(tree.links(two).left(), Some(one));
            assert_eq!(tree.links(two).right(), Some(three));
        }

        tree.assert_invariants();
    }

    impl TestNode {
        fn into_raw(node: Box<TestNode>) -> NonNull<TestNode> {
            NonNull::from(Box::leak(node))
        }
    }
}
