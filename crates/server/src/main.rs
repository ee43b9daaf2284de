use anyhow::{Context, Result};
use tracing::info;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use outlay_server::{create_router, ServerConfig};

const LOG_FORMAT_ENV: &str = "OUTLAY_LOG_FORMAT";

fn init_tracing() {
    // RUST_LOG wins over the default
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("info")
    };

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(
                "outlay-server".into(),
                std::io::stdout,
            ))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ServerConfig::load()?;
    let db = outlay_storage::create_db(&config.database)
        .await
        .with_context(|| format!("failed to open {}", config.database.display()))?;
    info!(database = %config.database.display(), "Database ready");

    if config.seed_rules {
        outlay_storage::seed_default_rules(&db).await?;
    }

    let addr = config.bind.clone();
    let app = create_router(db, config);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Outlay server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
