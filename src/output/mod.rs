//! Result reporting
//!
//! - [`text`]: human-readable summary on stdout
//! - [`json`]: machine-readable report (stdout or file)

pub mod json;
pub mod text;
