//! `weknora-probe`: check whether the persisted session is still accepted.
//!
//! Reads the client configuration from the environment, opens the on-disk
//! session and asks the backend to validate the token. Prints the result as
//! JSON; a rejected session is cleared from disk like in the web client.

use std::sync::Arc;

use anyhow::Context;
use weknora_api::auth;
use weknora_client::{ClientConfig, HttpClient, TracingNavigator};
use weknora_session::{FileSessionStore, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    weknora_observability::init();

    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let store = Arc::new(FileSessionStore::open_default()?);

    tracing::info!(
        base_url = config.base_url(),
        session = %store.path().display(),
        authenticated = store.record().is_authenticated(),
        "probing session"
    );

    let client = HttpClient::new(config, store, Arc::new(TracingNavigator))
        .context("failed to build HTTP client")?;

    let validation = auth::validate_token(&client).await;
    println!("{}", serde_json::to_string_pretty(&validation)?);

    Ok(())
}
