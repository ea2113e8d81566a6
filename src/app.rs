use crate::config::{Config, DEFAULT_PORT};
use crate::scrape::{HttpFetcher, RmpScraper};
use crate::state::AppState;
use crate::utils::fmt_duration;
use crate::web::create_router;
use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    app_state: AppState,
}

impl App {
    /// Build the scraper and shared state from configuration.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let fetcher =
            HttpFetcher::new(config.fetch_timeout).context("Failed to build HTTP client")?;
        let scraper = RmpScraper::new(
            Arc::new(fetcher),
            config.scrape_settings(),
            config.fallback_search(),
        );

        info!(
            school_city = %config.school_city,
            max_visits = config.max_visits,
            fetch_timeout = fmt_duration(config.fetch_timeout),
            request_timeout = fmt_duration(config.request_timeout),
            "scraper configured"
        );

        Ok(App {
            app_state: AppState::new(scraper, config.request_timeout),
            config,
        })
    }

    pub fn router(&self) -> Router {
        create_router(self.app_state.clone())
    }

    /// Bind the listener and serve until a shutdown signal arrives.
    ///
    /// Failing to bind is the only fatal runtime error.
    pub async fn run(self) -> ExitCode {
        if self.config.port.is_none() {
            info!("PORT not set, defaulting to {DEFAULT_PORT}");
        }
        let port = self.config.listen_port();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(%addr, error = %e, "Failed to bind listener");
                return ExitCode::FAILURE;
            }
        };
        info!(port, "listening");

        let router = self.router();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await
        });

        tokio::select! {
            result = &mut server => {
                error!(result = ?result, "Server exited unexpectedly");
                return ExitCode::FAILURE;
            }
            _ = shutdown_signal() => {}
        }

        info!(
            timeout = fmt_duration(self.config.shutdown_timeout),
            "shutting down, draining in-flight requests"
        );
        let _ = shutdown_tx.send(());

        match tokio::time::timeout(self.config.shutdown_timeout, server).await {
            Ok(Ok(Ok(()))) => {
                info!("shutdown complete");
                ExitCode::SUCCESS
            }
            Ok(Ok(Err(e))) => {
                error!(error = %e, "Server error during shutdown");
                ExitCode::FAILURE
            }
            Ok(Err(e)) => {
                error!(error = %e, "Server task panicked");
                ExitCode::FAILURE
            }
            Err(_) => {
                warn!("Graceful shutdown timed out, exiting with requests in flight");
                ExitCode::FAILURE
            }
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
