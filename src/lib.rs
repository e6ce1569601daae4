//! Workspace root package. It exists to install the rusty-hook pre-commit
//! hooks; the library lives in `crates/searoute-lib`.
