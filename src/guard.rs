//! Scope-bound resources with guaranteed release.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::platform::{self, ResourceId};
use crate::release::{DefaultRelease, Release};
use crate::types::{FileOptions, GuardStatus};

enum State<R> {
    Open(R),
    Failed(Error),
    Released,
}

/// Binds a resource to a lexical scope.
///
/// The release function runs exactly once when the guard goes out of
/// scope, whichever way the scope is left: normal exit, early return, `?`
/// propagation, or unwinding. A guard whose acquisition failed records the
/// error instead of returning it; every later operation on it is a no-op
/// that reports [`Error::NotOpen`].
///
/// # Example
///
/// ```
/// use lifecycle::{CountingRelease, ScopedGuard};
///
/// let closed = CountingRelease::new();
/// {
///     let mut guard = ScopedGuard::new(Vec::<u8>::new(), closed.clone());
///     guard.act(|buf| buf.extend_from_slice(b"data"))?;
/// }
/// assert_eq!(closed.count(), 1);
/// # Ok::<(), lifecycle::Error>(())
/// ```
pub struct ScopedGuard<R, D: Release<R> = DefaultRelease> {
    id: ResourceId,
    state: State<R>,
    releaser: D,
}

impl<R, D: Release<R>> ScopedGuard<R, D> {
    /// Guard an already-acquired resource.
    pub fn new(resource: R, releaser: D) -> Self {
        let id = ResourceId::next();
        trace!(%id, "scoped resource bound");
        Self {
            id,
            state: State::Open(resource),
            releaser,
        }
    }

    /// Guard the outcome of an acquisition attempt.
    ///
    /// A failed attempt does not fail construction; it is observable
    /// through [`status`](Self::status) and [`error`](Self::error).
    pub fn acquire(outcome: Result<R>, releaser: D) -> Self {
        match outcome {
            Ok(resource) => Self::new(resource, releaser),
            Err(err) => {
                warn!(error = %err, "scoped resource not acquired");
                Self {
                    id: ResourceId::invalid(),
                    state: State::Failed(err),
                    releaser,
                }
            }
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> GuardStatus {
        match self.state {
            State::Open(_) => GuardStatus::Open,
            State::Failed(_) => GuardStatus::Failed,
            State::Released => GuardStatus::Released,
        }
    }

    /// Check if the resource is held.
    pub fn is_open(&self) -> bool {
        self.status().is_open()
    }

    /// The acquisition error, if acquisition failed.
    pub fn error(&self) -> Option<&Error> {
        match &self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Identity of the guarded resource, invalid if acquisition failed.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Borrow the resource while it is held.
    pub fn get(&self) -> Option<&R> {
        match &self.state {
            State::Open(resource) => Some(resource),
            _ => None,
        }
    }

    /// Mutably borrow the resource while it is held.
    pub fn get_mut(&mut self) -> Option<&mut R> {
        match &mut self.state {
            State::Open(resource) => Some(resource),
            _ => None,
        }
    }

    /// Run `f` on the resource.
    ///
    /// Returns [`Error::NotOpen`] without calling `f` if the guard failed
    /// to acquire its resource or has released it.
    pub fn act<U, F>(&mut self, f: F) -> Result<U>
    where
        F: FnOnce(&mut R) -> U,
    {
        if let State::Open(resource) = &mut self.state {
            return Ok(f(resource));
        }
        warn!(id = %self.id, status = ?self.status(), "operation on unopened resource ignored");
        Err(Error::NotOpen)
    }

    /// Release the resource before the end of the scope.
    ///
    /// Does nothing if the resource is not held.
    pub fn release(&mut self) {
        if let State::Open(resource) = self.take_open() {
            trace!(id = %self.id, "scoped resource released");
            self.releaser.release(resource);
        }
    }

    /// Hand the resource back without running the release function.
    pub fn into_inner(mut self) -> Option<R> {
        match self.take_open() {
            State::Open(resource) => Some(resource),
            _ => None,
        }
    }

    /// Move an open resource out, leaving `Released`. Other states are left
    /// untouched and `Released` is returned.
    fn take_open(&mut self) -> State<R> {
        match self.state {
            State::Open(_) => mem::replace(&mut self.state, State::Released),
            _ => State::Released,
        }
    }
}

impl<R, D: Release<R>> Drop for ScopedGuard<R, D> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<R, D: Release<R>> fmt::Debug for ScopedGuard<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedGuard")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("error", &self.error())
            .finish()
    }
}

/// Closes a file guard's writer.
#[derive(Debug, Clone)]
pub struct CloseFile {
    path: PathBuf,
    sync: bool,
}

impl Release<BufWriter<File>> for CloseFile {
    fn release(&mut self, writer: BufWriter<File>) {
        // Errors cannot be reported from a scope exit.
        match platform::fs::close(writer, self.sync) {
            Ok(()) => debug!(path = %self.path.display(), "file closed"),
            Err(err) => warn!(path = %self.path.display(), error = %err, "file close failed"),
        }
    }
}

/// A file opened for writing and closed when the guard leaves scope.
///
/// # Example
///
/// ```no_run
/// use lifecycle::FileGuard;
///
/// {
///     let mut out = FileGuard::create("example.txt");
///     out.write_line("Hello, guarded file!")?;
/// } // closed here
/// # Ok::<(), lifecycle::Error>(())
/// ```
pub type FileGuard = ScopedGuard<BufWriter<File>, CloseFile>;

impl ScopedGuard<BufWriter<File>, CloseFile> {
    /// Open `path` for writing, truncating any existing contents.
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self::open_with(path, FileOptions::default())
    }

    /// Open `path` according to `options`.
    ///
    /// Never fails: an open failure leaves the guard in
    /// [`GuardStatus::Failed`] with an [`Error::OpenFailure`].
    pub fn open_with(path: impl AsRef<Path>, options: FileOptions) -> Self {
        let path = path.as_ref();
        let releaser = CloseFile {
            path: path.to_path_buf(),
            sync: options.sync_on_close,
        };
        Self::acquire(platform::fs::open(path, &options), releaser)
    }

    /// Path the guard was opened with.
    pub fn path(&self) -> &Path {
        &self.releaser.path
    }

    /// Write `text` followed by a newline.
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        self.act(|w| writeln!(w, "{text}"))??;
        Ok(())
    }

    /// Write raw bytes.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.act(|w| w.write_all(bytes))??;
        Ok(())
    }

    /// Close the file now, reporting flush and sync errors.
    ///
    /// This is called automatically on drop, where errors are logged and
    /// ignored. Does nothing if the file is not open.
    pub fn close(&mut self) -> Result<()> {
        match self.take_open() {
            State::Open(writer) => {
                platform::fs::close(writer, self.releaser.sync)?;
                debug!(path = %self.releaser.path.display(), "file closed");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
