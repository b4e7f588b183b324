//! # Route gates
//!
//! Axum middleware enforcing the three authorization policies. A [`Gate`] is
//! plain configuration attached at route registration: the codec handle plus
//! a [`GatePolicy`] value, no per-route closures carrying policy state.
//!
//! A request that fails the gate never reaches the handler behind it.

use axum::extract::{FromRequestParts, RawPathParams, Request, State};
use axum::http::{HeaderMap, header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::token::TokenCodec;
use crate::error::ApiError;

/// Identity and rights extracted from a verified token, available to
/// handlers behind a gate for the lifetime of one request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// Authenticated member identifier.
    pub member_id: i32,
    /// Permission identifiers carried by the token.
    pub permissions: Vec<i32>,
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present once a gate has approved the request; a handler using
        // this extractor on an unguarded route rejects instead of panicking.
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}

/// Authorization policy for a group of routes, fixed at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatePolicy {
    /// Any verified token passes.
    AuthOnly,
    /// The token must carry every listed permission.
    PermissionRestricted(Vec<i32>),
    /// The `{id}` path parameter must equal the authenticated member, or
    /// the token must carry every listed permission. Self access is always
    /// sufficient regardless of permissions.
    SelfOrPermission(Vec<i32>),
}

/// Gate configuration handed to [`gate`] via middleware state.
#[derive(Debug, Clone)]
pub struct Gate {
    codec: Arc<TokenCodec>,
    policy: GatePolicy,
}

impl Gate {
    /// Gate that only authenticates.
    #[must_use]
    pub fn auth_only(codec: Arc<TokenCodec>) -> Self {
        Self {
            codec,
            policy: GatePolicy::AuthOnly,
        }
    }

    /// Gate that requires every permission in `required`.
    #[must_use]
    pub fn permissions(codec: Arc<TokenCodec>, required: Vec<i32>) -> Self {
        Self {
            codec,
            policy: GatePolicy::PermissionRestricted(required),
        }
    }

    /// Gate that grants self access on the `{id}` path parameter or falls
    /// back to a permission check.
    #[must_use]
    pub fn self_or_permissions(codec: Arc<TokenCodec>, required: Vec<i32>) -> Self {
        Self {
            codec,
            policy: GatePolicy::SelfOrPermission(required),
        }
    }

    /// Build a gate from an explicit policy value.
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>, policy: GatePolicy) -> Self {
        Self { codec, policy }
    }
}

/// Middleware function enforcing the configured [`GatePolicy`].
///
/// Register with `axum::middleware::from_fn_with_state(gate_config, gate)`.
/// Authentication failures (missing header, unverifiable token) yield 401;
/// policy failures on a verified token yield 403.
pub async fn gate(
    State(config): State<Gate>,
    params: RawPathParams,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or(ApiError::Unauthenticated)?;
    let payload = config
        .codec
        .verify(&token)
        .map_err(|_| ApiError::Unauthenticated)?;

    match &config.policy {
        GatePolicy::AuthOnly => {}
        GatePolicy::PermissionRestricted(required) => {
            if !payload.has_permissions(required) {
                tracing::debug!(member_id = payload.member_id, "permission check failed");
                return Err(ApiError::Forbidden);
            }
        }
        GatePolicy::SelfOrPermission(required) => {
            let is_self = resource_id(&params).is_some_and(|id| id == payload.member_id);
            if !is_self && !payload.has_permissions(required) {
                tracing::debug!(member_id = payload.member_id, "self-or-permission check failed");
                return Err(ApiError::Forbidden);
            }
        }
    }

    request.extensions_mut().insert(AuthContext {
        member_id: payload.member_id,
        permissions: payload.permissions,
    });
    Ok(next.run(request).await)
}

/// Pull the bearer token out of the `Authorization` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() {
        return None;
    }
    Some(token.to_owned())
}

/// Resource owner identifier from the `{id}` path parameter. `None` when the
/// route has no such parameter or it is not an integer; self access is then
/// simply not available and the permission arm decides.
fn resource_id(params: &RawPathParams) -> Option<i32> {
    params
        .iter()
        .find(|(name, _)| *name == "id")
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = auth {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(
            bearer_token(&headers(Some("Bearer abc.def.ghi"))),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(bearer_token(&headers(None)), None);
        assert_eq!(bearer_token(&headers(Some("Basic dXNlcjpwdw=="))), None);
        assert_eq!(bearer_token(&headers(Some("Bearer "))), None);
        assert_eq!(bearer_token(&headers(Some("abc.def.ghi"))), None);
    }
}
