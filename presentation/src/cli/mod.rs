//! Command-line definitions for the `conductor` and `conductor-license` binaries

pub mod commands;
pub mod license;
