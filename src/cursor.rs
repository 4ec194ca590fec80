use core::{marker::PhantomData, pin::Pin, ptr::NonNull};

use crate::{links::Link, AvlTree, Links, TreeNode};

/// A read-only cursor over an [`AvlTree`].
///
/// Besides the elements in key order, a cursor can rest on a ghost position that sits past the
/// last element and before the first one, so walking in either direction wraps around through it.
pub struct Cursor<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    curs: CursorRaw<T>,
    phantom: PhantomData<&'tree AvlTree<T>>,
}

impl<'tree, T> Cursor<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn first(tree: &'tree AvlTree<T>) -> Cursor<'tree, T> {
        Cursor {
            curs: CursorRaw::new(tree.into(), tree.first_raw()),
            phantom: PhantomData,
        }
    }

    pub(crate) fn last(tree: &'tree AvlTree<T>) -> Cursor<'tree, T> {
        Cursor {
            curs: CursorRaw::new(tree.into(), tree.last_raw()),
            phantom: PhantomData,
        }
    }

    /// Advances to the in-order successor.
    ///
    /// From the last element this lands on the ghost position, and from the ghost position on
    /// the first element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Steps back to the in-order predecessor.
    ///
    /// From the first element this lands on the ghost position, and from the ghost position on
    /// the last element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns the current element, or `None` on the ghost position.
    pub fn get(&self) -> Option<&'tree T> {
        unsafe { self.curs.get() }
    }

    /// Returns the element [`move_next`](Cursor::move_next) would land on, without moving.
    pub fn peek_next(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_next() }
    }

    /// Returns the element [`move_prev`](Cursor::move_prev) would land on, without moving.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek_prev() }
    }
}

/// A cursor over an [`AvlTree`] that can also unlink elements.
///
/// Movement follows the same rules as [`Cursor`]. Elements never move in memory when the tree
/// rebalances, so the cursor stays valid across removals.
pub struct CursorMut<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    curs: CursorRaw<T>,
    phantom: PhantomData<&'tree mut AvlTree<T>>,
}

impl<'tree, T> CursorMut<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn first(tree: &'tree mut AvlTree<T>) -> CursorMut<'tree, T> {
        let ptr = tree.first_raw();
        CursorMut::at_link(tree, ptr)
    }

    pub(crate) fn last(tree: &'tree mut AvlTree<T>) -> CursorMut<'tree, T> {
        let ptr = tree.last_raw();
        CursorMut::at_link(tree, ptr)
    }

    pub(crate) fn at(tree: &'tree mut AvlTree<T>, ptr: NonNull<T>) -> CursorMut<'tree, T> {
        CursorMut::at_link(tree, Some(ptr))
    }

    fn at_link(tree: &'tree mut AvlTree<T>, ptr: Link<T>) -> CursorMut<'tree, T> {
        CursorMut {
            curs: CursorRaw::new(tree.into(), ptr),
            phantom: PhantomData,
        }
    }

    /// Borrows this cursor as a read-only [`Cursor`] at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor {
            curs: CursorRaw::new(self.curs.tree, self.curs.ptr),
            phantom: PhantomData,
        }
    }

    /// See [`Cursor::move_next`].
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// See [`Cursor::move_prev`].
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns the current element, or `None` on the ghost position.
    pub fn get(&self) -> Option<&T> {
        unsafe { self.curs.get() }
    }

    /// Returns the current element pinned and mutable, or `None` on the ghost position.
    ///
    /// # Safety
    ///
    /// The element's key must keep comparing the same way against every other key in the tree.
    pub unsafe fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        unsafe { self.curs.get_mut() }
    }

    /// See [`Cursor::peek_next`].
    pub fn peek_next(&self) -> Option<&T> {
        unsafe { self.curs.peek_next() }
    }

    /// See [`Cursor::peek_prev`].
    pub fn peek_prev(&self) -> Option<&T> {
        unsafe { self.curs.peek_prev() }
    }

    /// Unlinks the current element and moves to its successor.
    ///
    /// Returns the unlinked handle, or `None` without touching anything if the cursor is on the
    /// ghost position.
    pub fn remove_current(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current() }
    }

    /// Unlinks the current element and moves to its predecessor.
    ///
    /// Returns `None` on the ghost position, like [`remove_current`](CursorMut::remove_current).
    pub fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_current_and_move_prev() }
    }
}

struct CursorRaw<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: NonNull<AvlTree<T>>,
    // `None` is the ghost position.
    ptr: Link<T>,
}

impl<T> CursorRaw<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn new(tree: NonNull<AvlTree<T>>, ptr: Link<T>) -> CursorRaw<T> {
        CursorRaw { tree, ptr }
    }

    unsafe fn next_raw(&self) -> Link<T> {
        let tree = unsafe { self.tree.as_ref() };

        match self.ptr {
            Some(p) => unsafe { tree.successor_raw(p) },
            None => tree.first_raw(),
        }
    }

    unsafe fn prev_raw(&self) -> Link<T> {
        let tree = unsafe { self.tree.as_ref() };

        match self.ptr {
            Some(p) => unsafe { tree.predecessor_raw(p) },
            None => tree.last_raw(),
        }
    }

    unsafe fn move_next(&mut self) {
        self.ptr = unsafe { self.next_raw() };
    }

    unsafe fn move_prev(&mut self) {
        self.ptr = unsafe { self.prev_raw() };
    }

    unsafe fn get<'a>(&self) -> Option<&'a T> {
        self.ptr.map(|p| unsafe { p.as_ref() })
    }

    unsafe fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        self.ptr
            .map(|mut p| unsafe { Pin::new_unchecked(p.as_mut()) })
    }

    unsafe fn peek_next<'a>(&self) -> Option<&'a T> {
        unsafe { self.next_raw().map(|p| p.as_ref()) }
    }

    unsafe fn peek_prev<'a>(&self) -> Option<&'a T> {
        unsafe { self.prev_raw().map(|p| p.as_ref()) }
    }

    unsafe fn remove_current(&mut self) -> Option<T::Handle> {
        let remove = self.ptr?;

        unsafe {
            // Neighbours keep their identity across removal, so step off first.
            self.move_next();
            Some(self.tree.as_mut().remove_at(remove))
        }
    }

    unsafe fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        let remove = self.ptr?;

        unsafe {
            self.move_prev();
            Some(self.tree.as_mut().remove_at(remove))
        }
    }
}
