//! Row types and DTOs for the catalog tables.

pub mod prompt;
pub mod template;
pub mod theme;
