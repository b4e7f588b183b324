//! # Server assembly
//!
//! Loads the key material, wires up shared state and runs the axum server.

use std::sync::Arc;

use anyhow::Context;

use crate::auth::{KeyMaterial, TokenCodec};
use crate::config::AppConfig;
use crate::members::{InMemoryDirectory, MemberDirectory};
use crate::routes;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Token codec bound to the process key pair.
    pub codec: Arc<TokenCodec>,
    /// Member directory backing login and the CRUD handlers.
    pub directory: Arc<dyn MemberDirectory>,
}

impl AppState {
    /// Assemble the state from its two collaborators.
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>, directory: Arc<dyn MemberDirectory>) -> Self {
        Self { codec, directory }
    }
}

/// Run the server until it is shut down.
///
/// Fails fast before binding the listener if the key material cannot be
/// loaded: without it no request can be authorized.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let keys = KeyMaterial::from_pem_files(&config.private_key_path, &config.public_key_path)
        .context("loading JWT key material")?;

    let state = AppState::new(
        Arc::new(TokenCodec::new(Arc::new(keys))),
        Arc::new(InMemoryDirectory::new()),
    );
    let app = routes::create_routes(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("binding {}", config.bind_addr()))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")
}
