//! Request normalisation and the two document operations.
//!
//! Everything here is synchronous and free of HTTP types. Handlers call
//! [`normalize::normalize`] on the raw body, then run [`unlock`] or
//! [`render`] on a blocking thread.

pub mod normalize;
pub mod render;
pub mod unlock;

pub use normalize::{normalize, DocumentEnvelope, Operation};
