//! Core shared library for the hivealert workspace.
//!
//! Holds the pieces every other crate reaches for: the common error type and
//! the tracing subscriber setup used by the binary.

pub mod errors;
pub mod logging;

pub use errors::{CoreError, Result as CoreResult};
pub use logging::init_tracing;
