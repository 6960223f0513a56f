//! Process-unique identities for acquired resources.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of one acquired resource.
///
/// Ids travel with the resource on transfer and are shared by every
/// handle aliasing it, so two owners compare equal iff they own the
/// same resource instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    id: u64,
}

impl ResourceId {
    /// Create an invalid (null) id.
    #[inline]
    pub const fn invalid() -> Self {
        Self { id: 0 }
    }

    /// Check if this id is valid (non-zero).
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// Raw numeric value, zero when invalid.
    #[inline]
    pub const fn get(&self) -> u64 {
        self.id
    }

    pub(crate) fn next() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.id)
        } else {
            f.write_str("#-")
        }
    }
}
