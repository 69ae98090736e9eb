//! Todo service operator CLI library.
//!
//! Rendering helpers shared by the `todoapi-cli` binary and its tests.

pub mod output;
