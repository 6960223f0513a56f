//! Ownership wrappers with deterministic release.
//!
//! This crate provides three ownership disciplines over a heap-allocated or
//! externally-managed resource:
//!
//! - [`ExclusiveHandle`]: one owner at a time; ownership moves explicitly
//!   and leaves the source empty. Copying is rejected at compile time.
//! - [`SharedHandle`] / [`LocalSharedHandle`]: any number of owners tracked
//!   by a reference count; the resource is released when the count drops
//!   to zero.
//! - [`ScopedGuard`] / [`FileGuard`]: a resource bound to a scope and
//!   released exactly once on every exit path.
//!
//! Each wrapper is parametrised over a [`Release`] function, and every
//! resource is released at most once.
//!
//! # Example
//!
//! ```
//! use lifecycle::{CountingRelease, ExclusiveHandle, SharedHandle};
//!
//! fn main() -> lifecycle::Result<()> {
//!     // Exclusive ownership moves.
//!     let mut buffer = ExclusiveHandle::<[i32]>::from_fn(5, |i| (i * i) as i32)?;
//!     let owner = buffer.transfer();
//!     assert!(buffer.is_empty());
//!     assert_eq!(owner.as_slice()?, &[0, 1, 4, 9, 16]);
//!
//!     // Shared ownership counts.
//!     let released = CountingRelease::new();
//!     let first = SharedHandle::with_release(20, released.clone())?;
//!     {
//!         let second = first.clone();
//!         assert_eq!(second.use_count(), 2);
//!     }
//!     assert_eq!(first.use_count(), 1);
//!     drop(first);
//!     assert_eq!(released.count(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Misuse
//!
//! Accessing an emptied [`ExclusiveHandle`] or a reset [`SharedHandle`]
//! through `get` reports [`Error::EmptyHandle`]. Indexing an empty slice
//! handle panics, as does indexing out of bounds. Acting on a
//! [`ScopedGuard`] that failed to open reports [`Error::NotOpen`] and has
//! no other effect.
//!
//! # Logging
//!
//! Lifecycle events are emitted through `tracing` at `trace` and `debug`
//! level; ignored operations and close failures are emitted at `warn`. The
//! crate never installs a subscriber.

pub mod error;
pub mod exclusive;
pub mod guard;
mod platform;
pub mod release;
pub mod shared;
pub mod types;

// Re-export main types at the crate root
pub use error::{Error, Result};
pub use exclusive::ExclusiveHandle;
pub use guard::{CloseFile, FileGuard, ScopedGuard};
pub use platform::ResourceId;
pub use release::{CountingRelease, DefaultRelease, Release, ReleaseFn};
pub use shared::{AtomicCount, CountedHandle, LocalCount, LocalSharedHandle, RefCount, SharedHandle};
pub use types::{FileOptions, GuardStatus, OpenMode, DEFAULT_BUFFER_CAPACITY};
