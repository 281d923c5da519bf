//! Pawtrait domain logic.
//!
//! Pure, I/O-free building blocks shared by the persistence, storage and
//! HTTP crates: the derivative encoder, the template image-path model,
//! catalog pagination rules and the admin access policy.

pub mod access;
pub mod catalog;
pub mod derivatives;
pub mod error;
pub mod images;
pub mod types;
