//! Host platform collaborators.
//!
//! This module wraps the memory allocator and file system. The ownership
//! wrappers in the parent modules are the only callers.

pub mod alloc;
pub mod fs;
pub mod ids;

pub use self::alloc::{try_box, try_boxed_slice};
pub use ids::ResourceId;
