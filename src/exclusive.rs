//! Exclusive ownership with explicit transfer.

use std::fmt;
use std::mem;
use std::ops::{Index, IndexMut};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::platform::{try_box, try_boxed_slice, ResourceId};
use crate::release::{DefaultRelease, Release};

/// A resource together with the function that releases it.
struct Owned<T: ?Sized, D> {
    id: ResourceId,
    releaser: D,
    resource: Box<T>,
}

impl<T: ?Sized, D: Release<Box<T>>> Owned<T, D> {
    fn new(resource: Box<T>, releaser: D) -> Self {
        let id = ResourceId::next();
        trace!(%id, "exclusive resource acquired");
        Self {
            id,
            releaser,
            resource,
        }
    }

    fn release(self) {
        let Owned {
            id,
            mut releaser,
            resource,
        } = self;
        trace!(%id, "exclusive resource released");
        releaser.release(resource);
    }
}

/// Sole owner of a heap resource.
///
/// At most one `ExclusiveHandle` refers to a given resource. Ownership can
/// be moved to another handle with [`transfer`](Self::transfer) or
/// [`assign_from`](Self::assign_from), which leave the source empty. The
/// release function runs exactly once: on drop, on [`reset`](Self::reset),
/// or when a transfer overwrites a held resource.
///
/// Handles cannot be copied:
///
/// ```compile_fail
/// let a = lifecycle::ExclusiveHandle::new(1u8).unwrap();
/// let b = a.clone();
/// ```
///
/// # Example
///
/// ```
/// use lifecycle::ExclusiveHandle;
///
/// let mut squares = ExclusiveHandle::<[i32]>::with_len(5)?;
/// for i in 0..5 {
///     squares[i] = (i * i) as i32;
/// }
///
/// let moved = squares.transfer();
/// assert!(squares.is_empty());
/// assert_eq!(moved.as_slice()?, &[0, 1, 4, 9, 16]);
/// # Ok::<(), lifecycle::Error>(())
/// ```
pub struct ExclusiveHandle<T: ?Sized, D: Release<Box<T>> = DefaultRelease> {
    slot: Option<Owned<T, D>>,
}

impl<T> ExclusiveHandle<T> {
    /// Allocate `value` on the heap and own it.
    pub fn new(value: T) -> Result<Self> {
        Self::with_release(value, DefaultRelease)
    }
}

impl<T, D: Release<Box<T>>> ExclusiveHandle<T, D> {
    /// Allocate `value` on the heap, releasing it with `releaser`.
    pub fn with_release(value: T, releaser: D) -> Result<Self> {
        let resource = try_box(value)?;
        Ok(Self::from_box(resource, releaser))
    }
}

impl<T: ?Sized, D: Release<Box<T>>> ExclusiveHandle<T, D> {
    /// Take ownership of an existing allocation.
    pub fn from_box(resource: Box<T>, releaser: D) -> Self {
        Self {
            slot: Some(Owned::new(resource, releaser)),
        }
    }

    /// Create a handle that owns nothing.
    pub fn empty() -> Self {
        Self { slot: None }
    }

    /// Check if the handle owns nothing.
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Identity of the owned resource, invalid when empty.
    pub fn id(&self) -> ResourceId {
        self.slot
            .as_ref()
            .map(|owned| owned.id)
            .unwrap_or_default()
    }

    /// Borrow the resource.
    ///
    /// Returns [`Error::EmptyHandle`] if the resource was transferred away
    /// or released.
    pub fn get(&self) -> Result<&T> {
        match &self.slot {
            Some(owned) => Ok(&*owned.resource),
            None => Err(Error::EmptyHandle),
        }
    }

    /// Mutably borrow the resource.
    pub fn get_mut(&mut self) -> Result<&mut T> {
        match &mut self.slot {
            Some(owned) => Ok(&mut *owned.resource),
            None => Err(Error::EmptyHandle),
        }
    }

    /// Move ownership into a new handle, leaving `self` empty.
    pub fn transfer(&mut self) -> Self {
        let slot = self.slot.take();
        if let Some(owned) = &slot {
            debug!(id = %owned.id, "exclusive resource transferred");
        }
        Self { slot }
    }

    /// Move ownership from `src` into `self`, leaving `src` empty.
    ///
    /// A resource already held by `self` is released first. If `src` is
    /// empty, `self` ends up empty too.
    pub fn assign_from(&mut self, src: &mut Self) {
        let incoming = src.slot.take();
        if let Some(owned) = &incoming {
            debug!(id = %owned.id, "exclusive resource transferred");
        }
        if let Some(previous) = mem::replace(&mut self.slot, incoming) {
            previous.release();
        }
    }

    /// Release the resource now. Does nothing if the handle is empty.
    pub fn reset(&mut self) {
        if let Some(owned) = self.slot.take() {
            owned.release();
        }
    }

    /// Give up ownership without running the release function.
    pub fn into_box(mut self) -> Option<Box<T>> {
        self.slot.take().map(|owned| owned.resource)
    }
}

impl<T> ExclusiveHandle<[T]> {
    /// Allocate `len` elements initialised with `init(index)`.
    pub fn from_fn<F>(len: usize, init: F) -> Result<Self>
    where
        F: FnMut(usize) -> T,
    {
        Self::slice_with_release(len, init, DefaultRelease)
    }
}

impl<T: Default> ExclusiveHandle<[T]> {
    /// Allocate `len` default-initialised elements.
    pub fn with_len(len: usize) -> Result<Self> {
        Self::from_fn(len, |_| T::default())
    }
}

impl<T, D: Release<Box<[T]>>> ExclusiveHandle<[T], D> {
    /// Allocate `len` elements, releasing them with `releaser`.
    pub fn slice_with_release<F>(len: usize, init: F, releaser: D) -> Result<Self>
    where
        F: FnMut(usize) -> T,
    {
        let resource = try_boxed_slice(len, init)?;
        Ok(Self::from_box(resource, releaser))
    }

    /// Number of owned elements, zero when empty.
    pub fn len(&self) -> usize {
        self.slot
            .as_ref()
            .map(|owned| owned.resource.len())
            .unwrap_or(0)
    }

    /// Borrow the elements.
    pub fn as_slice(&self) -> Result<&[T]> {
        self.get()
    }

    /// Mutably borrow the elements.
    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        self.get_mut()
    }

    /// First element, `None` when empty or zero-length.
    pub fn first(&self) -> Option<&T> {
        self.slot.as_ref().and_then(|owned| owned.resource.first())
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) -> Result<()>
    where
        T: Clone,
    {
        self.as_mut_slice()?.fill(value);
        Ok(())
    }

    /// Allocate a second resource holding a copy of the elements.
    ///
    /// This is the only way to duplicate an exclusive resource; the copy
    /// gets its own identity and a clone of the release function.
    pub fn try_clone_deep(&self) -> Result<Self>
    where
        T: Clone,
        D: Clone,
    {
        let owned = self.slot.as_ref().ok_or(Error::EmptyHandle)?;
        let items = &owned.resource;
        let copy = try_boxed_slice(items.len(), |i| items[i].clone())?;
        debug!(from = %owned.id, len = items.len(), "exclusive resource deep-copied");
        Ok(Self::from_box(copy, owned.releaser.clone()))
    }
}

/// Indexes the owned elements.
///
/// # Panics
///
/// Panics if the handle is empty or `index` is out of bounds.
impl<T, D: Release<Box<[T]>>> Index<usize> for ExclusiveHandle<[T], D> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match &self.slot {
            Some(owned) => &owned.resource[index],
            None => panic!("indexed an empty ExclusiveHandle"),
        }
    }
}

impl<T, D: Release<Box<[T]>>> IndexMut<usize> for ExclusiveHandle<[T], D> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match &mut self.slot {
            Some(owned) => &mut owned.resource[index],
            None => panic!("indexed an empty ExclusiveHandle"),
        }
    }
}

impl<T: ?Sized, D: Release<Box<T>>> Default for ExclusiveHandle<T, D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized + fmt::Debug, D: Release<Box<T>>> fmt::Debug for ExclusiveHandle<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Some(owned) => f
                .debug_struct("ExclusiveHandle")
                .field("id", &owned.id)
                .field("resource", &&*owned.resource)
                .finish(),
            None => f.write_str("ExclusiveHandle(<empty>)"),
        }
    }
}

impl<T: ?Sized, D: Release<Box<T>>> Drop for ExclusiveHandle<T, D> {
    fn drop(&mut self) {
        if let Some(owned) = self.slot.take() {
            owned.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::CountingRelease;

    #[test]
    fn test_new_and_get() {
        let mut h = ExclusiveHandle::new(10).unwrap();
        assert!(!h.is_empty());
        assert!(h.id().is_valid());
        *h.get_mut().unwrap() += 1;
        assert_eq!(*h.get().unwrap(), 11);
    }

    #[test]
    fn test_empty_access_is_reported() {
        let mut h: ExclusiveHandle<u32> = ExclusiveHandle::empty();
        assert!(h.is_empty());
        assert!(!h.id().is_valid());
        assert!(matches!(h.get(), Err(Error::EmptyHandle)));
        assert!(matches!(h.get_mut(), Err(Error::EmptyHandle)));
    }

    #[test]
    fn test_transfer_keeps_identity() {
        let mut a = ExclusiveHandle::new("payload").unwrap();
        let id = a.id();

        let b = a.transfer();
        assert!(a.is_empty());
        assert_eq!(b.id(), id);
        assert_eq!(*b.get().unwrap(), "payload");
    }

    #[test]
    fn test_assign_from_releases_previous() {
        let counter = CountingRelease::new();
        let mut dst = ExclusiveHandle::with_release(1, counter.clone()).unwrap();
        let mut src = ExclusiveHandle::with_release(2, counter.clone()).unwrap();

        dst.assign_from(&mut src);
        assert_eq!(counter.count(), 1);
        assert!(src.is_empty());
        assert_eq!(*dst.get().unwrap(), 2);

        drop(src);
        assert_eq!(counter.count(), 1);
        drop(dst);
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn test_assign_from_empty_source_empties_destination() {
        let counter = CountingRelease::new();
        let mut dst = ExclusiveHandle::with_release(1, counter.clone()).unwrap();
        let mut src = ExclusiveHandle::empty();

        dst.assign_from(&mut src);
        assert!(dst.is_empty());
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let counter = CountingRelease::new();
        let mut h = ExclusiveHandle::with_release(5u8, counter.clone()).unwrap();

        h.reset();
        h.reset();
        drop(h);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_into_box_skips_release() {
        let counter = CountingRelease::new();
        let h = ExclusiveHandle::with_release(9u8, counter.clone()).unwrap();

        let b = h.into_box().unwrap();
        assert_eq!(*b, 9);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_slice_accessors() {
        let mut h = ExclusiveHandle::<[i32]>::with_len(3).unwrap();
        assert_eq!(h.len(), 3);
        h.fill(42).unwrap();
        assert_eq!(h.first(), Some(&42));
        h[1] = 7;
        assert_eq!(h.as_slice().unwrap(), &[42, 7, 42]);

        let moved = h.transfer();
        assert_eq!(h.len(), 0);
        assert_eq!(h.first(), None);
        assert!(h.fill(1).is_err());
        assert_eq!(moved.len(), 3);
    }

    #[test]
    #[should_panic(expected = "indexed an empty ExclusiveHandle")]
    fn test_index_after_transfer_panics() {
        let mut h = ExclusiveHandle::<[u8]>::with_len(2).unwrap();
        let _moved = h.transfer();
        let value = h[0];
        assert_eq!(value, 0);
    }

    #[test]
    fn test_try_clone_deep_is_independent() {
        let counter = CountingRelease::new();
        let mut a =
            ExclusiveHandle::slice_with_release(4, |i| i as u16, counter.clone()).unwrap();
        let b = a.try_clone_deep().unwrap();

        assert_ne!(a.id(), b.id());
        a[0] = 100;
        assert_eq!(b.as_slice().unwrap(), &[0, 1, 2, 3]);

        drop(a);
        drop(b);
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn test_unsized_from_box() {
        let h = ExclusiveHandle::from_box(Box::<str>::from("text"), DefaultRelease);
        assert_eq!(h.get().unwrap(), "text");
        assert!(format!("{h:?}").contains("\"text\""));
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let err = ExclusiveHandle::<[u64]>::with_len(usize::MAX).unwrap_err();
        assert!(err.is_allocation_failure());
    }
}
