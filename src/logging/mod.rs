//! Logging setup for binaries and tests that want to see the crate's logs.
//!
//! - Bracketed event formatting
//! - Stdout output plus an optional timestamped log file

mod formatter;
mod setup;

pub use formatter::BracketedFormatter;
pub use setup::{setup_logging, DEFAULT_FILTER};
