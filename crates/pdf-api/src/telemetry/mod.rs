//! Structured logging setup.
//!
//! # Telemetry invariants
//!
//! - **No document bytes or passwords** may appear in any span attribute or
//!   log field. Sizes, page counts and error codes are fine.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::init_telemetry;
