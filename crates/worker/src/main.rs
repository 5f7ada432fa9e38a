//! Projection worker entry point.
//!
//! Consumes the product stream into the PostgreSQL read model. Runs until
//! SIGINT or SIGTERM, checkpointing after every record so a restart resumes
//! where it left off. Invoke with the `rebuild` argument to clear the read
//! model and replay the stream from the start instead of running the loop.

mod config;

use event_log::{PostgresCheckpointStore, PostgresEventLog};
use projections::{PostgresProductStore, ProductProjector, ProductSubscriber};
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::Config;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    // 2. Expose Prometheus metrics for scraping
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()
        .expect("failed to install Prometheus recorder");

    // 3. Connect and migrate
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let log = PostgresEventLog::new(pool.clone()).with_poll_interval(config.poll_interval);
    log.run_migrations().await.expect("migrations failed");

    // 4. Wire the pipeline
    let checkpoints = PostgresCheckpointStore::new(pool.clone());
    let projector = ProductProjector::new(PostgresProductStore::new(pool));
    let subscriber = ProductSubscriber::new(
        log,
        checkpoints,
        projector,
        config.stream.clone(),
        config.consumer.clone(),
    );

    if std::env::args().nth(1).as_deref() == Some("rebuild") {
        subscriber.rebuild().await.expect("rebuild failed");
        return;
    }

    // 5. Run until a signal arrives or the loop halts on its own
    tracing::info!(
        stream = %config.stream,
        consumer = %config.consumer,
        "starting projection worker"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task = tokio::spawn(async move { subscriber.run(shutdown_rx).await });

    tokio::select! {
        result = &mut task => {
            match result {
                Ok(Ok(())) => tracing::info!("subscriber stopped"),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "subscriber halted");
                    std::process::exit(1);
                }
                Err(e) => {
                    tracing::error!(error = %e, "subscriber task panicked");
                    std::process::exit(1);
                }
            }
        }
        () = shutdown_signal() => {
            let _ = shutdown_tx.send(true);
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "subscriber failed during shutdown"),
                Err(e) => tracing::error!(error = %e, "subscriber task panicked"),
            }
        }
    }

    tracing::info!("worker shut down gracefully");
}
