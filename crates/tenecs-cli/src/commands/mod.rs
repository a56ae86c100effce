//! CLI command implementations

pub mod check;
pub mod files;
pub mod tests;
