//! Binary entrypoint wiring the WebSocket game loop, HTTP query routes, and
//! the storage/analytics collaborators.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fourline_back::{
    config::AppConfig,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let port = config.port;
    let app_state = AppState::new(config);

    spawn_storage_supervisor(&app_state);
    spawn_event_sink(&app_state);

    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Keep a MongoDB-backed store connected in the background; the server runs
/// degraded (no persistence, no leaderboard) until it succeeds.
#[cfg(feature = "mongo-store")]
fn spawn_storage_supervisor(state: &SharedState) {
    use fourline_back::dao::game_store::{GameStore, mongodb::MongoGameStore};
    use fourline_back::dao::storage::StorageError;
    use fourline_back::services::storage_supervisor;

    let supervised = state.clone();
    let uri = state.config().mongo_uri.clone();
    let db_name = state.config().mongo_db.clone();

    tokio::spawn(storage_supervisor::run(supervised, move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let config = fourline_back::dao::game_store::mongodb::MongoConfig::from_uri(
                &uri,
                db_name.as_deref(),
            )
            .await?;
            let store = MongoGameStore::connect(config).await?;
            Ok::<Arc<dyn GameStore>, StorageError>(Arc::new(store))
        }
    }));
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_storage_supervisor(_state: &SharedState) {
    tracing::warn!("built without a storage backend; running in degraded mode");
}

/// Probe the Kafka brokers once at startup and install the sink on success.
/// Analytics are best-effort; a failed probe only logs.
#[cfg(feature = "kafka-events")]
fn spawn_event_sink(state: &SharedState) {
    use fourline_back::events::kafka::KafkaEventSink;

    let Some(brokers) = state.config().kafka_brokers.clone() else {
        info!("KAFKA_BROKERS not set; analytics events disabled");
        return;
    };
    let topic = state.config().kafka_topic.clone();
    let state = state.clone();

    tokio::spawn(async move {
        match KafkaEventSink::connect(&brokers, &topic).await {
            Ok(sink) => {
                info!(%brokers, %topic, "kafka event sink connected");
                state.set_event_sink(Arc::new(sink)).await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "kafka unavailable; analytics events disabled");
            }
        }
    });
}

#[cfg(not(feature = "kafka-events"))]
fn spawn_event_sink(_state: &SharedState) {}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
