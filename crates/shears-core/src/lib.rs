//! # shears-core
//!
//! Shared plumbing for the shears linter: the async [`Runtime`] seam over the
//! filesystem and the [`Diagnostics`] channel that collects non-fatal
//! warnings during a run.
//!
//! Every other crate reads the project through [`Runtime`] instead of
//! touching `std::fs` directly. This keeps the analysis pipeline testable
//! against in-memory trees and guarantees the linter never mutates user
//! files: the trait has no write surface at all.

pub mod diagnostics;
pub mod runtime;

pub use diagnostics::{Diagnostics, Warning};
pub use runtime::{FileMetadata, NativeRuntime, Runtime, RuntimeError};
