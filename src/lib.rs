// ddlog - lib.rs
//
// Library entry point, exposing every module for integration testing.
// Argument parsing and process exit codes live in `main.rs`.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
