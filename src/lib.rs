//! Workspace root package.
//!
//! Holds workspace-level tooling only (the `rusty-hook` pre-commit hook). The
//! service code lives in the `crates/` members.
