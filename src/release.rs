//! Release functions.
//!
//! Every ownership wrapper in this crate is parametrised over a [`Release`]
//! implementation. The wrapper decides *when* a resource is released; the
//! releaser decides *how*.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Gives a resource back to whoever provided it.
///
/// Wrappers call `release` at most once per resource instance.
pub trait Release<R> {
    /// Release `resource`.
    fn release(&mut self, resource: R);
}

/// Releases a resource by dropping it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultRelease;

impl<R> Release<R> for DefaultRelease {
    #[inline]
    fn release(&mut self, resource: R) {
        drop(resource);
    }
}

/// Adapts a closure into a [`Release`].
///
/// # Example
///
/// ```
/// use lifecycle::{ExclusiveHandle, ReleaseFn};
///
/// let handle = ExclusiveHandle::with_release(
///     7u32,
///     ReleaseFn(|v: Box<u32>| println!("releasing {v}")),
/// )?;
/// drop(handle);
/// # Ok::<(), lifecycle::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ReleaseFn<F>(pub F);

impl<R, F> Release<R> for ReleaseFn<F>
where
    F: FnMut(R),
{
    #[inline]
    fn release(&mut self, resource: R) {
        (self.0)(resource)
    }
}

/// Drops the resource and counts how many releases happened.
///
/// Clones share one counter, so a test can keep a clone and observe the
/// releases performed through the wrappers it handed the others to.
#[derive(Debug, Clone, Default)]
pub struct CountingRelease {
    released: Arc<AtomicUsize>,
}

impl CountingRelease {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of releases performed so far.
    pub fn count(&self) -> usize {
        self.released.load(Ordering::Acquire)
    }
}

impl<R> Release<R> for CountingRelease {
    fn release(&mut self, resource: R) {
        drop(resource);
        self.released.fetch_add(1, Ordering::AcqRel);
    }
}
