//! # Member records and CRUD glue
//!
//! Thin business layer behind the gates: a directory seam for member
//! records and the request handlers routed to it.

pub mod directory;
pub mod handlers;

pub use directory::{DirectoryError, InMemoryDirectory, MemberDirectory, MemberRecord};
