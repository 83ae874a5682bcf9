//! Core domain concepts shared across all subdomains.
//!
//! - [`error`]: error kinds and field validation errors
//! - [`meta`]: object metadata, owner references, work-queue keys
//! - [`condition`]: status conditions merged by type
//! - [`confidence`]: two-decimal confidence values
//! - [`string`]: status message truncation

pub mod condition;
pub mod confidence;
pub mod error;
pub mod meta;
pub mod string;
