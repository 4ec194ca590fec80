use core::{cell::UnsafeCell, fmt, marker::PhantomPinned, mem, ops::Not, ptr::NonNull};

pub(crate) type Link<T> = Option<NonNull<T>>;

/// Links embedded in every node of an [`AvlTree`](crate::AvlTree).
///
/// Besides the parent and child pointers, the links carry the node's balance factor, defined as
/// the height of its right subtree minus the height of its left subtree. Outside of a rebalance
/// in progress the balance factor of a linked node is always -1, 0 or 1.
///
/// The parent pointer is a plain back-reference. It never owns the parent and is only followed
/// when walking upward; the tree keeps it consistent across every rotation, splice and swap.
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    balance: i8,
    _unpin: PhantomPinned,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The balance change caused by the subtree on this side growing one level taller.
    #[inline]
    pub(crate) fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

impl<T: ?Sized> Links<T> {
    /// Returns new, unlinked links with a balance factor of 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                balance: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    // `true` if any parent or child pointer is set. A lone root has none.
    #[inline]
    pub(crate) fn is_linked(&self) -> bool {
        self.parent().is_some() || !self.is_leaf()
    }

    /// Returns the balance factor of the node.
    #[inline]
    pub fn balance(&self) -> i8 {
        unsafe { (*self.inner.get()).balance }
    }

    /// Returns the parent of the node, if any.
    #[inline]
    pub fn parent(&self) -> Option<NonNull<T>> {
        unsafe { (*self.inner.get()).parent }
    }

    /// Returns the left child of the node, if any.
    #[inline]
    pub fn left(&self) -> Option<NonNull<T>> {
        self.child(Dir::Left)
    }

    /// Returns the right child of the node, if any.
    #[inline]
    pub fn right(&self) -> Option<NonNull<T>> {
        self.child(Dir::Right)
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    pub(crate) fn set_balance(&mut self, balance: i8) {
        self.inner.get_mut().balance = balance;
    }

    /// Adds `diff` to the balance factor and returns the result.
    #[inline]
    pub(crate) fn update_balance(&mut self, diff: i8) -> i8 {
        let inner = self.inner.get_mut();
        inner.balance += diff;
        debug_assert!((-2..=2).contains(&inner.balance));
        inner.balance
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    pub(crate) fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    pub(crate) fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    /// Unlinks the node and resets its balance factor.
    #[inline]
    pub(crate) fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.balance = 0;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent().map(NonNull::as_ptr))
            .field("left", &self.left().map(NonNull::as_ptr))
            .field("right", &self.right().map(NonNull::as_ptr))
            .field("balance", &self.balance())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_links_are_unlinked() {
        let links: Links<u32> = Links::new();
        assert!(!links.is_linked());
        assert!(links.is_leaf());
        assert_eq!(links.balance(), 0);
    }

    #[test]
    fn update_balance_accumulates() {
        let mut links: Links<u32> = Links::new();
        assert_eq!(links.update_balance(-1), -1);
        assert_eq!(links.update_balance(-1), -2);
        assert_eq!(links.update_balance(2), 0);

        links.set_balance(1);
        assert_eq!(links.balance(), 1);

        links.clear();
        assert_eq!(links.balance(), 0);
    }

    #[test]
    fn setters_return_previous_link() {
        let mut links: Links<u32> = Links::new();
        let a: NonNull<u32> = NonNull::dangling();

        assert_eq!(links.set_left(Some(a)), None);
        assert_eq!(links.left(), Some(a));
        assert!(links.is_linked());

        assert_eq!(links.set_child(Dir::Left, None), Some(a));
        assert_eq!(links.set_right(Some(a)), None);
        assert_eq!(links.child(Dir::Right), Some(a));
        assert_eq!(links.set_parent(Some(a)), None);
        assert_eq!(links.parent(), Some(a));
    }

    #[test]
    fn dir_sign_and_not() {
        assert_eq!(Dir::Left.sign(), -1);
        assert_eq!(Dir::Right.sign(), 1);
        assert_eq!(!Dir::Left, Dir::Right);
        assert_eq!(!Dir::Right, Dir::Left);
    }
}
