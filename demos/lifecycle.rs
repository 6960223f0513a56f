//! Walk through the three ownership disciplines.
//!
//! Run with: RUST_LOG=lifecycle=trace cargo run --example lifecycle

use lifecycle::{CountingRelease, ExclusiveHandle, FileGuard, SharedHandle};
use tracing_subscriber::EnvFilter;

fn main() -> lifecycle::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lifecycle=debug")),
        )
        .init();

    println!("--- Scoped file ---");
    {
        let mut file = FileGuard::create("example.txt");
        println!("Status: {:?}", file.status());
        file.write_line("Hello, RAII!")?;
    } // closed here

    println!("\n--- Exclusive array ---");
    let mut squares = ExclusiveHandle::<[i32]>::with_len(5)?;
    for i in 0..5 {
        squares[i] = (i * i) as i32;
    }
    for (i, v) in squares.as_slice()?.iter().enumerate() {
        println!("arr[{}] = {}", i, v);
    }

    let owner = squares.transfer();
    println!("Source empty after transfer: {}", squares.is_empty());
    println!("Destination holds: {:?}", owner.as_slice()?);

    println!("\n--- Shared value ---");
    let released = CountingRelease::new();
    let first = SharedHandle::with_release(20, released.clone())?;
    {
        let second = first.clone();
        println!("Use count: {}", first.use_count());
        println!("Value: {}", second.get()?);
    }
    println!("Use count after inner block: {}", first.use_count());
    drop(first);
    println!("Releases: {}", released.count());

    println!("\n--- Unwritable path ---");
    let mut missing = FileGuard::create("/nonexistent-dir/out.txt");
    println!("Status: {:?}", missing.status());
    if let Some(err) = missing.error() {
        println!("Open error: {}", err);
    }
    if let Err(err) = missing.write_line("dropped") {
        println!("Write ignored: {}", err);
    }

    Ok(())
}
