//! # Route configuration
//!
//! Wires handlers to paths and attaches the authorization gates. Each policy
//! group is its own sub-router so the gate is fixed where the routes are
//! registered.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::middleware::gate;
use crate::auth::{Gate, TokenCodec};
use crate::members::handlers;
use crate::server::AppState;

/// Permission required to manage other members' records.
pub const MEMBER_ADMINISTRATION: i32 = 1;

/// Create all routes.
pub fn create_routes(state: AppState) -> Router {
    let codec = state.codec.clone();
    Router::new()
        .nest("/auth", auth_routes(&codec))
        .nest("/members", member_routes(&codec))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Login and token introspection.
fn auth_routes(codec: &Arc<TokenCodec>) -> Router<AppState> {
    let session = Router::new()
        .route("/me", get(handlers::current_member))
        .route_layer(from_fn_with_state(Gate::auth_only(codec.clone()), gate));

    Router::new()
        .route("/login", post(handlers::login))
        .merge(session)
}

/// Member CRUD behind the three gate policies.
fn member_routes(codec: &Arc<TokenCodec>) -> Router<AppState> {
    // Reading the member list only needs a session.
    let listing = Router::new()
        .route("/", get(handlers::list_members))
        .route_layer(from_fn_with_state(Gate::auth_only(codec.clone()), gate));

    // Creating members is reserved for member administration.
    let administration = Router::new()
        .route("/", post(handlers::create_member))
        .route_layer(from_fn_with_state(
            Gate::permissions(codec.clone(), vec![MEMBER_ADMINISTRATION]),
            gate,
        ));

    // Record access: the member themselves, or an administrator.
    let record = Router::new()
        .route("/{id}", get(handlers::get_member))
        .route("/{id}", patch(handlers::update_member))
        .route_layer(from_fn_with_state(
            Gate::self_or_permissions(codec.clone(), vec![MEMBER_ADMINISTRATION]),
            gate,
        ));

    listing.merge(administration).merge(record)
}
