//! # Token codec
//!
//! Signs session payloads into RS256 tokens at login and verifies them on
//! every protected request. Verification collapses all failure modes into a
//! single opaque rejection so the gate cannot leak which check failed.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::auth::keys::KeyMaterial;
use crate::error::{ApiError, Result};

/// Fixed token lifetime: one hour.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Claims carried by a session token.
///
/// Only non-sensitive profile data belongs here; the payload is readable by
/// anyone holding the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Member identifier.
    pub member_id: i32,
    /// Display name of the member.
    pub username: String,
    /// Permission identifiers granted at issuance time.
    pub permissions: Vec<i32>,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiration, seconds since the epoch.
    pub exp: i64,
}

impl TokenPayload {
    /// True when every identifier in `required` is present in this payload's
    /// permission set.
    #[must_use]
    pub fn has_permissions(&self, required: &[i32]) -> bool {
        required.iter().all(|p| self.permissions.contains(p))
    }
}

/// Opaque verification rejection.
///
/// Deliberately carries no reason: malformed structure, bad signature, wrong
/// algorithm and expiration all look identical to callers. The specific
/// cause is logged at debug level inside [`TokenCodec::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidToken;

/// Signs and verifies session tokens with a fixed RS256 key pair.
#[derive(Debug)]
pub struct TokenCodec {
    keys: Arc<KeyMaterial>,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec bound to the given key material.
    #[must_use]
    pub fn new(keys: Arc<KeyMaterial>) -> Self {
        // Pinning the algorithm list defends against tokens re-signed with a
        // substituted scheme (e.g. HS256 keyed on the public key).
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self { keys, validation }
    }

    /// Issue a signed token for a freshly authenticated member.
    ///
    /// Stamps issued-at with the current time and expiration one hour later.
    /// Failure means broken key material and surfaces as an internal error
    /// rather than being swallowed.
    pub fn issue(&self, member_id: i32, username: &str, permissions: Vec<i32>) -> Result<String> {
        let iat = Utc::now().timestamp();
        let payload = TokenPayload {
            member_id,
            username: username.to_owned(),
            permissions,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        self.sign(&payload)
    }

    fn sign(&self, payload: &TokenPayload) -> Result<String> {
        encode(
            &Header::new(Algorithm::RS256),
            payload,
            self.keys.encoding_key(),
        )
        .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify an opaque token string against the public key.
    ///
    /// Checks signature, algorithm and expiration; the expiration boundary is
    /// strict (a token is invalid from the exact second it expires). Pure
    /// CPU work, safe to call from any number of concurrent requests.
    pub fn verify(&self, token: &str) -> std::result::Result<TokenPayload, InvalidToken> {
        let data: TokenData<TokenPayload> =
            decode(token, self.keys.decoding_key(), &self.validation).map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                InvalidToken
            })?;

        let payload = data.claims;
        // The library treats exp == now as still valid; the contract here is
        // that expiration is inclusive.
        if Utc::now().timestamp() >= payload.exp {
            tracing::debug!("token rejected: expired");
            return Err(InvalidToken);
        }

        Ok(payload)
    }
}
