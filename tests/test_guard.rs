//! Scoped guard tests.

mod common;

use std::fs;
use std::panic::{self, AssertUnwindSafe};

use lifecycle::{
    CountingRelease, Error, ExclusiveHandle, FileGuard, FileOptions, GuardStatus, OpenMode,
    ScopedGuard,
};

fn use_guard(released: &CountingRelease, exit_early: bool) -> usize {
    let mut guard = ScopedGuard::new(vec![1u8, 2, 3], released.clone());
    if exit_early {
        return 0;
    }
    guard.act(|v| v.push(4)).expect("guard should be open");
    guard.get().map(Vec::len).unwrap_or(0)
}

fn fail_inside_scope(released: &CountingRelease) -> lifecycle::Result<()> {
    let mut guard = ScopedGuard::new(String::new(), released.clone());
    guard.act(|s| s.push_str("partial"))?;
    let _huge = ExclusiveHandle::<[u64]>::with_len(usize::MAX)?;
    guard.act(|s| s.push_str("unreachable"))?;
    Ok(())
}

#[test]
fn test_release_on_normal_exit() {
    let released = CountingRelease::new();
    assert_eq!(use_guard(&released, false), 4);
    assert_eq!(released.count(), 1);
}

#[test]
fn test_release_on_early_return() {
    let released = CountingRelease::new();
    assert_eq!(use_guard(&released, true), 0);
    assert_eq!(released.count(), 1);
}

#[test]
fn test_release_on_propagated_error() {
    let released = CountingRelease::new();
    let err = fail_inside_scope(&released).unwrap_err();
    assert!(err.is_allocation_failure());
    assert_eq!(released.count(), 1);
}

#[test]
fn test_release_on_panic() {
    let released = CountingRelease::new();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _guard = ScopedGuard::new(0u64, released.clone());
        panic!("boom");
    }));
    assert!(result.is_err());
    assert_eq!(released.count(), 1, "unwinding should release the guard");
}

#[test]
fn test_file_guard_round_trip() {
    common::init_logging();
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("example.txt");

    {
        let mut file = FileGuard::create(&path);
        assert_eq!(file.status(), GuardStatus::Open);
        file.write_line("Hello, RAII!").expect("write should succeed");
    }

    let contents = fs::read_to_string(&path).expect("file should exist");
    assert_eq!(contents, "Hello, RAII!\n");
}

#[test]
fn test_file_guard_append_and_sync() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("journal.txt");
    let opts = FileOptions {
        mode: OpenMode::Append,
        sync_on_close: true,
        ..Default::default()
    };

    for line in ["one", "two"] {
        let mut file = FileGuard::open_with(&path, opts);
        file.write_line(line).expect("write should succeed");
        file.close().expect("close should succeed");
    }

    let contents = fs::read_to_string(&path).expect("file should exist");
    assert_eq!(contents, "one\ntwo\n");
}

#[test]
fn test_unwritable_path_is_reported_not_fatal() {
    common::init_logging();
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("no-such-dir").join("out.txt");

    let mut file = FileGuard::create(&path);

    assert_eq!(file.status(), GuardStatus::Failed);
    assert!(!file.is_open());
    let open_err = file.error().expect("failure should be recorded");
    assert!(open_err.is_open_failure(), "unexpected error: {}", open_err);

    let write_err = file.write_line("ignored").unwrap_err();
    assert!(matches!(write_err, Error::NotOpen));
    assert!(file.close().is_ok());
    assert_eq!(file.status(), GuardStatus::Failed);
    drop(file);

    assert!(!path.exists(), "nothing should have been created");
}

#[cfg(target_os = "linux")]
#[test]
fn test_close_reports_flush_failure() {
    let mut file = FileGuard::create("/dev/full");
    assert!(file.is_open(), "/dev/full should open for writing");
    file.write_line("x").expect("write should be buffered");

    let err = file.close().unwrap_err();
    assert!(matches!(err, Error::Io(_)), "unexpected error: {}", err);
    assert_eq!(file.status(), GuardStatus::Released);
}

#[cfg(target_os = "linux")]
#[test]
fn test_drop_ignores_flush_failure() {
    common::init_logging();
    let result = panic::catch_unwind(|| {
        let mut file = FileGuard::create("/dev/full");
        file.write_line("x").expect("write should be buffered");
    });
    assert!(result.is_ok(), "dropping a guard must not panic on close failure");
}
