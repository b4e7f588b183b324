//! # Authentication and authorization
//!
//! The security core of the service: RSA key material loaded at startup,
//! the token codec that signs and verifies session tokens, and the route
//! gate middleware built on top of it.

pub mod keys;
pub mod middleware;
pub mod token;

pub use keys::KeyMaterial;
pub use middleware::{AuthContext, Gate, GatePolicy};
pub use token::{InvalidToken, TokenCodec, TokenPayload};
