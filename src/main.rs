use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use alphascan::analysis::Analyzer;
use alphascan::config::{AppConfig, LogFormat};
use alphascan::db::{self, PgTradeSource};
use alphascan::output::{ConsoleSink, Notifier, SignalSink};
use alphascan::services::run_analysis_loop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);

    if let Some(addr) = config.metrics_addr {
        alphascan::metrics::init_metrics(addr)?;
    }

    let mut sink = ConsoleSink::new();
    if config.has_telegram() {
        let notifier = Notifier::new(
            config.telegram_bot_token.clone().unwrap_or_default(),
            config.telegram_chat_id.clone().unwrap_or_default(),
        );
        sink = sink.with_notifier(Arc::new(notifier), config.alert_min_severity);
        tracing::info!(
            min_severity = %config.alert_min_severity,
            "Telegram alerts enabled"
        );
    }

    sink.log_startup(env!("CARGO_PKG_VERSION"), config.analysis_interval_secs);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .context("failed to connect to database")?;

    sink.emit_info("Running system health check...");
    if !db::check_connection(&pool).await {
        sink.emit_error("Health check failed, exiting");
        anyhow::bail!("database health check failed");
    }
    sink.emit_success("System ready, starting analysis loop");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_shutdown_signals(shutdown.clone()));

    let analyzer = Analyzer::new(PgTradeSource::new(pool), sink, config.analysis.clone());
    run_analysis_loop(
        &analyzer,
        Duration::from_secs(config.analysis_interval_secs),
        shutdown,
    )
    .await;

    analyzer.sink().log_shutdown();
    Ok(())
}

/// Cancel `token` on SIGINT or SIGTERM.
async fn watch_shutdown_signals(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Received SIGINT, initiating shutdown...");
                }
                token.cancel();
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT, initiating shutdown..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating shutdown..."),
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received ctrl-c, initiating shutdown...");
        }
    }

    token.cancel();
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
    }
}
