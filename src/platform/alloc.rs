//! Fallible heap allocation.
//!
//! `Box::new` and `vec!` abort the process when the allocator refuses a
//! request. Resource construction must report `AllocationFailure` instead,
//! so every payload goes through these two functions.

use std::alloc::{self, Layout};
use std::mem;

use tracing::trace;

use crate::error::{Error, Result};

/// Move `value` into a freshly allocated box.
pub fn try_box<T>(value: T) -> Result<Box<T>> {
    let layout = Layout::new::<T>();
    if layout.size() == 0 {
        // Zero-sized values never touch the allocator.
        return Ok(Box::new(value));
    }

    unsafe {
        let ptr = alloc::alloc(layout) as *mut T;
        if ptr.is_null() {
            return Err(Error::AllocationFailure {
                bytes: layout.size(),
            });
        }
        trace!(bytes = layout.size(), "allocated object");
        ptr.write(value);
        // Memory came from the global allocator with `Layout::new::<T>()`,
        // which is exactly what `Box<T>` frees with.
        Ok(Box::from_raw(ptr))
    }
}

/// Allocate `len` elements, initialising element `i` with `init(i)`.
pub fn try_boxed_slice<T, F>(len: usize, init: F) -> Result<Box<[T]>>
where
    F: FnMut(usize) -> T,
{
    let bytes = len.saturating_mul(mem::size_of::<T>());

    let mut items = Vec::new();
    items
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailure { bytes })?;
    items.extend((0..len).map(init));

    trace!(len, bytes, "allocated array");
    Ok(items.into_boxed_slice())
}
