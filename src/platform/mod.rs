// ddlog - platform/mod.rs
//
// Platform layer: config files on disk and the HTTP transport.
// Dependencies: core model types, directories, reqwest.
// Must NOT depend on: app.

pub mod config;
pub mod datadog;
