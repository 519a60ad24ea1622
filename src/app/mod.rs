// ddlog - app/mod.rs
//
// Application layer: orchestration of searches, the tail loop and pattern
// mining.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod oneshot;
pub mod patterns;
pub mod search;
pub mod tail;
