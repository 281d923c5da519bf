//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod prompt_repo;
pub mod template_repo;

pub use prompt_repo::PromptRepo;
pub use template_repo::TemplateRepo;
