//! # Members API
//!
//! Backend for a member management application. The interesting part of the
//! crate is the session/authorization layer: RS256-signed tokens issued at
//! login and three route-guard policies that verify them on every protected
//! request. Everything else is routing and CRUD glue around that core.

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod members;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
