//! Reference-counted shared ownership.
//!
//! [`SharedHandle`] counts owners atomically and may cross threads.
//! [`LocalSharedHandle`] uses a plain counter and stays on one thread.
//! Both are aliases of [`CountedHandle`], which is generic over the
//! counter strategy.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::process;
use std::ptr::NonNull;
use std::sync::atomic::{self, AtomicUsize, Ordering};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::platform::{try_box, ResourceId};
use crate::release::{DefaultRelease, Release};

/// Counts beyond this abort the process instead of wrapping.
const MAX_REFCOUNT: usize = isize::MAX as usize;

mod sealed {
    pub trait Sealed {}
}

/// Owner counter stored in a shared control block.
///
/// Implemented by [`AtomicCount`] and [`LocalCount`] only.
pub trait RefCount: sealed::Sealed {
    #[doc(hidden)]
    fn one() -> Self;

    /// Current number of owners.
    fn get(&self) -> usize;

    #[doc(hidden)]
    fn increment(&self);

    /// Returns `true` when the count reached zero.
    #[doc(hidden)]
    fn decrement(&self) -> bool;
}

/// Thread-safe owner counter.
#[derive(Debug)]
pub struct AtomicCount(AtomicUsize);

impl sealed::Sealed for AtomicCount {}

impl RefCount for AtomicCount {
    fn one() -> Self {
        AtomicCount(AtomicUsize::new(1))
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn increment(&self) {
        // A new owner is always created from an existing one, so no
        // synchronisation is needed on the way up.
        let old = self.0.fetch_add(1, Ordering::Relaxed);
        if old > MAX_REFCOUNT {
            process::abort();
        }
    }

    fn decrement(&self) -> bool {
        if self.0.fetch_sub(1, Ordering::Release) != 1 {
            return false;
        }
        // Every other owner's last use happens-before the release.
        atomic::fence(Ordering::Acquire);
        true
    }
}

/// Single-threaded owner counter.
#[derive(Debug)]
pub struct LocalCount(Cell<usize>);

impl sealed::Sealed for LocalCount {}

impl RefCount for LocalCount {
    fn one() -> Self {
        LocalCount(Cell::new(1))
    }

    fn get(&self) -> usize {
        self.0.get()
    }

    fn increment(&self) {
        match self.0.get().checked_add(1) {
            Some(n) if n <= MAX_REFCOUNT => self.0.set(n),
            _ => process::abort(),
        }
    }

    fn decrement(&self) -> bool {
        let n = self.0.get() - 1;
        self.0.set(n);
        n == 0
    }
}

struct Block<T: ?Sized, C, D> {
    count: C,
    id: ResourceId,
    releaser: D,
    resource: Box<T>,
}

/// One owner of a reference-counted resource.
///
/// Cloning adds an owner; dropping or [`reset`](Self::reset) removes one.
/// The release function runs exactly once, when the last owner goes away.
pub struct CountedHandle<T: ?Sized, C: RefCount = AtomicCount, D: Release<Box<T>> = DefaultRelease>
{
    block: Option<NonNull<Block<T, C, D>>>,
    _owns: PhantomData<Block<T, C, D>>,
}

/// Shared owner with an atomic count.
///
/// # Example
///
/// ```
/// use lifecycle::SharedHandle;
///
/// let first = SharedHandle::new(String::from("config"))?;
/// {
///     let second = first.clone();
///     assert_eq!(first.use_count(), 2);
///     assert_eq!(second.get()?, "config");
/// }
/// assert_eq!(first.use_count(), 1);
/// # Ok::<(), lifecycle::Error>(())
/// ```
pub type SharedHandle<T, D = DefaultRelease> = CountedHandle<T, AtomicCount, D>;

/// Shared owner with a single-threaded count.
///
/// Local handles cannot leave their thread:
///
/// ```compile_fail
/// let local = lifecycle::LocalSharedHandle::new(1u8).unwrap();
/// std::thread::spawn(move || drop(local));
/// ```
pub type LocalSharedHandle<T, D = DefaultRelease> = CountedHandle<T, LocalCount, D>;

impl<T, C: RefCount> CountedHandle<T, C> {
    /// Allocate `value` with a count of one.
    pub fn new(value: T) -> Result<Self> {
        Self::with_release(value, DefaultRelease)
    }
}

impl<T, C: RefCount, D: Release<Box<T>>> CountedHandle<T, C, D> {
    /// Allocate `value` with a count of one, releasing it with `releaser`.
    pub fn with_release(value: T, releaser: D) -> Result<Self> {
        let resource = try_box(value)?;
        Self::from_box(resource, releaser)
    }
}

impl<T: ?Sized, C: RefCount, D: Release<Box<T>>> CountedHandle<T, C, D> {
    /// Start sharing an existing allocation.
    ///
    /// Fails only if the control block cannot be allocated, in which case
    /// `resource` is dropped.
    pub fn from_box(resource: Box<T>, releaser: D) -> Result<Self> {
        let block = try_box(Block {
            count: C::one(),
            id: ResourceId::next(),
            releaser,
            resource,
        })?;
        trace!(id = %block.id, "shared resource acquired");

        Ok(Self {
            block: Some(NonNull::from(Box::leak(block))),
            _owns: PhantomData,
        })
    }

    fn block(&self) -> Option<&Block<T, C, D>> {
        // SAFETY: the block stays allocated while this handle holds a count.
        self.block.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    /// Check if this handle has been reset.
    pub fn is_empty(&self) -> bool {
        self.block.is_none()
    }

    /// Identity of the shared resource, invalid after reset.
    pub fn id(&self) -> ResourceId {
        self.block().map(|b| b.id).unwrap_or_default()
    }

    /// Number of live handles sharing the resource, zero after reset.
    pub fn use_count(&self) -> usize {
        self.block().map(|b| b.count.get()).unwrap_or(0)
    }

    /// Borrow the resource.
    ///
    /// Returns [`Error::EmptyHandle`] after [`reset`](Self::reset).
    pub fn get(&self) -> Result<&T> {
        match self.block() {
            Some(b) => Ok(&*b.resource),
            None => Err(Error::EmptyHandle),
        }
    }

    /// Add an owner. Equivalent to `clone`.
    pub fn share(&self) -> Self {
        self.clone()
    }

    /// Check if two handles share the same resource.
    ///
    /// Two reset handles are not considered equal.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        match (a.block, b.block) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Give up this handle's ownership now.
    ///
    /// Releases the resource if this was the last owner. Calling `reset`
    /// again, or dropping the handle afterwards, does nothing.
    pub fn reset(&mut self) {
        let Some(ptr) = self.block.take() else {
            return;
        };

        // SAFETY: this handle held one count, so the block is live.
        let last = unsafe { ptr.as_ref() }.count.decrement();
        if !last {
            return;
        }

        // SAFETY: the count reached zero, so no other handle can reach the
        // block and it was allocated by `try_box`.
        let block = unsafe { Box::from_raw(ptr.as_ptr()) };
        let Block {
            id,
            mut releaser,
            resource,
            ..
        } = *block;
        trace!(%id, "shared resource released");
        releaser.release(resource);
    }
}

impl<T: ?Sized, C: RefCount, D: Release<Box<T>>> Clone for CountedHandle<T, C, D> {
    fn clone(&self) -> Self {
        if let Some(b) = self.block() {
            b.count.increment();
            debug!(id = %b.id, count = b.count.get(), "shared resource cloned");
        }
        Self {
            block: self.block,
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized, C: RefCount, D: Release<Box<T>>> Drop for CountedHandle<T, C, D> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized + fmt::Debug, C: RefCount, D: Release<Box<T>>> fmt::Debug
    for CountedHandle<T, C, D>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block() {
            Some(b) => f
                .debug_struct("SharedHandle")
                .field("id", &b.id)
                .field("count", &b.count.get())
                .field("resource", &&*b.resource)
                .finish(),
            None => f.write_str("SharedHandle(<empty>)"),
        }
    }
}

// The count is atomic and the payload is only reachable through `&T`, so
// the atomic flavour is as thread-safe as `T` is. The releaser runs on
// whichever thread drops the last owner.
unsafe impl<T, D> Send for CountedHandle<T, AtomicCount, D>
where
    T: ?Sized + Send + Sync,
    D: Release<Box<T>> + Send,
{
}

unsafe impl<T, D> Sync for CountedHandle<T, AtomicCount, D>
where
    T: ?Sized + Send + Sync,
    D: Release<Box<T>> + Send,
{
}
