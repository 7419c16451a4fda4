//! Common types, protocol definitions, and errors shared across `pdf-unlock-svc` crates.

pub mod error;
pub mod protocol;

pub use error::{ErrorCode, ServiceError};
