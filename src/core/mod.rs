// ddlog - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: platform, app, or any transport crate directly.

pub mod filter;
pub mod format;
pub mod model;
pub mod pattern;
pub mod query;
pub mod source;
pub mod stats;
