//! Flow client binary.
//!
//! Builds a session against the configured backend, loads the feed and
//! logs inbound notifications with structured logging until SIGINT or
//! SIGTERM, then shuts the session down gracefully.

use flow_client::config;
use flow_client::{Session, StaticAuthGate};
use flow_feed::HttpFeedApi;
use flow_notify::{NotificationChannel, WsTransport};
use flow_types::AuthGate;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("FLOW_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("flow.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the client cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // The binary has no interactive sign-in flow; identity comes from the
    // environment when present.
    let auth = match std::env::var("FLOW_VIEWER_ID") {
        Ok(id) if !id.trim().is_empty() => {
            Arc::new(StaticAuthGate::signed_in(id.trim().to_string()))
        }
        _ => Arc::new(StaticAuthGate::anonymous()),
    };
    if let Some(viewer) = auth.current_identity() {
        tracing::info!(viewer = %viewer, "starting signed in");
    } else {
        tracing::info!("starting anonymously");
    }

    let api = Arc::new(HttpFeedApi::new(config.backend.base_url.clone()));
    let channel = NotificationChannel::open(
        WsTransport::new(config.notifications.url.clone()),
        config.notifications.reconnect_policy(),
    );
    let session = Session::new(api, auth as Arc<dyn AuthGate>, channel);

    match session.refresh_feed().await {
        Ok(posts) => tracing::info!(count = posts.len(), "feed loaded"),
        Err(err) => tracing::warn!(error = %err, "initial feed load failed; starting empty"),
    }

    // Log notifications until asked to stop. The session's own wiring has
    // already applied each event to the feed store.
    let mut events = session.subscribe_events();
    loop {
        tokio::select! {
            () = shutdown_signal() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    tracing::info!(kind = event.payload.kind(), received_at = %event.received_at, "notification");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "notification log lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    session.shutdown().await;
    tracing::info!("flow client shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
