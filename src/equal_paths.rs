//! Leaf-depth check for plain binary trees.
//!
//! This works on any binary tree built from [`BinaryNode`], balanced or not, and is independent
//! of [`AvlTree`](crate::AvlTree).

use alloc::boxed::Box;

/// A node of a plain, owned binary tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryNode<T> {
    pub key: T,
    pub left: Option<Box<BinaryNode<T>>>,
    pub right: Option<Box<BinaryNode<T>>>,
}

impl<T> BinaryNode<T> {
    /// Returns a node with no children.
    pub fn leaf(key: T) -> Self {
        BinaryNode {
            key,
            left: None,
            right: None,
        }
    }

    /// Returns a node with the given children.
    pub fn new(key: T, left: Option<BinaryNode<T>>, right: Option<BinaryNode<T>>) -> Self {
        BinaryNode {
            key,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Returns `true` if every leaf of the tree rooted at `root` is at the same depth.
///
/// An empty tree has no leaves and trivially passes. A node with a single child is not a leaf,
/// so only the leaves below that child count.
pub fn equal_paths<T>(root: Option<&BinaryNode<T>>) -> bool {
    root.map_or(true, |root| leaf_height(root).is_some())
}

// Returns the distance from `node` to its leaves, counting `node`, or `None` if the leaves below
// `node` are not all at the same depth.
fn leaf_height<T>(node: &BinaryNode<T>) -> Option<usize> {
    let below = match (node.left.as_deref(), node.right.as_deref()) {
        (None, None) => 0,
        (Some(only), None) | (None, Some(only)) => leaf_height(only)?,
        (Some(left), Some(right)) => {
            let left = leaf_height(left)?;
            let right = leaf_height(right)?;

            if left != right {
                return None;
            }

            left
        }
    };

    Some(below + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perfect(depth: u32, next: &mut u32) -> BinaryNode<u32> {
        *next += 1;
        let key = *next;

        if depth == 0 {
            return BinaryNode::leaf(key);
        }

        let left = perfect(depth - 1, next);
        let right = perfect(depth - 1, next);
        BinaryNode::new(key, Some(left), Some(right))
    }

    #[test]
    fn empty_tree_has_equal_paths() {
        assert!(equal_paths::<u32>(None));
    }

    #[test]
    fn single_node_has_equal_paths() {
        assert!(equal_paths(Some(&BinaryNode::leaf(1))));
    }

    #[test]
    fn unequal_leaf_depths() {
        // 1 has a leaf on the left at depth 1 and a leaf on the right at depth 2.
        let root = BinaryNode::new(
            1,
            Some(BinaryNode::leaf(2)),
            Some(BinaryNode::new(3, Some(BinaryNode::leaf(4)), None)),
        );

        assert!(!equal_paths(Some(&root)));
    }

    #[test]
    fn perfect_trees_have_equal_paths() {
        for depth in 0..6 {
            let root = perfect(depth, &mut 0);
            assert!(equal_paths(Some(&root)), "depth {depth}");
        }
    }

    #[test]
    fn unary_chain_has_equal_paths() {
        // A path has exactly one leaf.
        let root = BinaryNode::new(
            1,
            None,
            Some(BinaryNode::new(2, Some(BinaryNode::leaf(3)), None)),
        );

        assert!(equal_paths(Some(&root)));
    }

    #[test]
    fn unary_nodes_take_depth_from_their_child() {
        //     1
        //    / \
        //   2   3
        //  /     \
        // 4       5
        let root = BinaryNode::new(
            1,
            Some(BinaryNode::new(2, Some(BinaryNode::leaf(4)), None)),
            Some(BinaryNode::new(3, None, Some(BinaryNode::leaf(5)))),
        );
        assert!(equal_paths(Some(&root)));

        let mut root = root;
        root.right = Some(Box::new(BinaryNode::leaf(3)));
        assert!(!equal_paths(Some(&root)));
    }

    #[test]
    fn mismatch_deep_in_a_subtree() {
        let mut root = perfect(3, &mut 0);
        // Turn a node at depth 2 into a leaf; every other leaf is at depth 3.
        if let Some(grandchild) = root.left.as_mut().and_then(|left| left.left.as_mut()) {
            grandchild.left = None;
            grandchild.right = None;
        }

        assert!(!equal_paths(Some(&root)));
    }
}
