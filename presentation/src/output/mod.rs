//! Output formatting for operator commands

pub mod console;
pub mod formatter;
pub mod json;
