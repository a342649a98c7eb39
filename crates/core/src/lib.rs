//! replay-core
//!
//! Core library for capturing the class files a managed runtime loads during one
//! execution ("play-out") and substituting them back into a later, equivalent
//! execution ("play-in").
//!
//! Classes the runtime synthesizes carry per-run names, so they are stored under
//! content-derived identifiers and renamed on the way in and out. This crate
//! holds the class-file model, the generated-name classifier, the namer and
//! rewriter, session state, artifact storage, and both event pipelines, so that
//! all of it is testable and reusable from any frontend.

pub mod classfile;
pub mod config;
pub mod diagnostics;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod session;
pub mod store;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
