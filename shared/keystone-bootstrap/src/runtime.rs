//! Service runtime
//!
//! Standard hosting lifecycle: freeze the pipelines, serve HTTP, wait for a
//! shutdown signal, then drain. The drain deadline is owned by the bootstrap
//! handle; a hung exporter never blocks process exit.

use axum::Router;
use keystone_core::Result;
use tokio::signal;
use tracing::info;

use crate::facade::BootstrapHandle;

pub struct ServiceRuntime;

impl ServiceRuntime {
    /// Run a bootstrapped service until a shutdown signal arrives.
    pub async fn run(handle: BootstrapHandle, router: Router, bind: &str) -> Result<()> {
        handle.start();

        let listener = tokio::net::TcpListener::bind(bind).await?;
        info!(
            service = handle.resource().service_name(),
            bind = bind,
            "serving"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(Self::wait_for_shutdown())
            .await?;

        info!("Shutdown signal received, draining telemetry");
        handle.shutdown().await;
        Ok(())
    }

    async fn wait_for_shutdown() {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }
}
