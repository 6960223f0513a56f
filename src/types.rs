//! Configuration types.

/// How a file guard opens its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Create the file if missing and truncate it.
    #[default]
    Write,
    /// Create the file if missing and append to it.
    Append,
}

/// Default write buffer size for file guards.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Options for opening a file guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOptions {
    /// Open mode.
    pub mode: OpenMode,
    /// Call `sync_all` before closing.
    pub sync_on_close: bool,
    /// Write buffer capacity in bytes.
    pub buffer_capacity: usize,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            mode: OpenMode::Write,
            sync_on_close: false,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Lifecycle state of a scoped guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
    /// The resource is held and will be released on scope exit.
    Open,
    /// Acquisition failed; operations are ignored.
    Failed,
    /// The resource was released early or handed back to the caller.
    Released,
}

impl GuardStatus {
    /// Check if the guard holds its resource.
    pub fn is_open(self) -> bool {
        self == GuardStatus::Open
    }
}
