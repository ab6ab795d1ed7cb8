use openbook_api::dispatch::LogDispatcher;
use openbook_api::init::{InitError, install_tracing, load_config};
use openbook_api::server::{self, ServerState};
use openbook_api::storage::MediaStorage;
use openbook_db::client::DbClient;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let config = load_config()?;
    let env: Env = envy::from_env().map_err(InitError::from)?;

    let db_client = DbClient::connect(config.clone()).await?;
    db_client.run_migrations().await?;

    let storage = MediaStorage::from_config(&config).await?;
    info!(kind = ?storage.kind(), "Media storage backend selected");

    let state = ServerState {
        db_client: Arc::new(db_client),
        storage: Arc::new(storage),
        dispatcher: Arc::new(LogDispatcher),
        config: Arc::new(config),
    };

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes().with_state(state).layer(tracing_layer);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    axum::serve(listener, app)
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
