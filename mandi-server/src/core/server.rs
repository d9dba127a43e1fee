//! HTTP server startup and shutdown

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::core::state::AppState;
use crate::core::tasks::BackgroundTasks;
use crate::core::Config;

/// HTTP server
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Initialize state, serve until the shutdown signal, then stop the
    /// background pipeline.
    pub async fn run(&self) -> anyhow::Result<()> {
        // 1. State and background pipeline
        let mut tasks = BackgroundTasks::new();
        let state = AppState::initialize(&self.config, &mut tasks)?;
        tasks.log_summary();

        // 2. Router and listener
        let app = crate::api::router(state);
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            environment = %self.config.environment,
            "Mandi server listening on {}",
            listener.local_addr()?
        );

        // 3. Serve until ctrl-c
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // 4. Drain and stop background tasks
        tasks.shutdown().await;

        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
