//! Main binary entry point for the `leaksweep` secret scanner.
//!
//! Delegates to the shared `entry_point::run_with_args()` function so
//! the CLI and integration tests exercise the same code path.

use std::process::ExitCode;

fn main() -> ExitCode {
    match leaksweep::entry_point::run_with_args(std::env::args().skip(1).collect()) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
