use anyhow::Context;
use chatline::{audit, bus, config, heartbeat, ingest, server, store};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let dotenv = dotenvy::dotenv();

    // Initialize logging with default filter if RUST_LOG is not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = dotenv {
        // It's not fatal if .env doesn't exist
        info!("No .env file found or failed to load: {}", e);
    }

    info!("chatline starting...");

    let config = config::Config::from_env().context("Failed to load configuration")?;

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    let db_path = config.db_path();
    info!("Initializing store at {}", db_path.display());
    let store = store::Store::new(&db_path).await?;
    store.init().await?;

    let audit = match config.audit_path() {
        Some(path) => {
            info!("Logging raw packets to {}", path.display());
            let log = audit::AuditLog::open(&path, config.audit_truncate)
                .await
                .with_context(|| format!("Failed to open audit log {}", path.display()))?;
            Some(Arc::new(log))
        }
        None => {
            info!("Raw packet logging disabled");
            None
        }
    };

    let bus = Arc::new(bus::EventBus::new());
    let logger_handle = bus::spawn_logger(&bus);

    let heartbeat = heartbeat::Heartbeat::new(
        bus.clone(),
        config.status_delay,
        config.status_interval,
    );
    let heartbeat_handle = tokio::spawn(async move { heartbeat.run().await });

    let ingestor = Arc::new(ingest::Ingestor::new(
        Arc::new(store.clone()),
        audit,
        bus.clone(),
    ));
    let app = server::IngestServer::new(ingestor, config.route())
        .with_body_limit(config.max_body_bytes)
        .router();

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!(
        "Listening at http://{}{}",
        listener.local_addr()?,
        config.route()
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        res = axum::serve(listener, app) => {
            if let Err(e) = res {
                error!("Server stopped with error: {}", e);
            }
        }
    }

    heartbeat_handle.abort();
    logger_handle.abort();

    Ok(())
}
