//! # Members API server entry point.

use anyhow::Context;

use members_api::config::AppConfig;
use members_api::{logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(None);

    // Key material and listener settings come from the environment. Anything
    // missing or malformed here must abort startup: without valid keys no
    // request can be authorized.
    let config = AppConfig::from_env().context("invalid server configuration")?;

    tracing::info!("starting members-api");
    server::run(config).await
}
