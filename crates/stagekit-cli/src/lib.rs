//! StageKit CLI library.
//!
//! Command implementations for the `stagekit` binary: asset inspection,
//! scene validation, composition and restore.

pub mod commands;
pub mod logging;
