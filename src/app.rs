//! Application Bootstrap
//!
//! Registers the root module tree and mounts its routes on one router.

use crate::error::Result;
use crate::module::Module;
use crate::routing::mount;
use axum::Router;
use tokio::signal;

/// A bootstrapped application.
///
/// Bootstrap walks the root module's tree, then mounts the resolved route
/// collections. A failed registration aborts bootstrap: the process should
/// fail startup rather than run with a partially wired dependency graph.
///
/// # Example
///
/// ```rust,ignore
/// let mut root = Module::builder()
///     .import(config_module)
///     .import(coin_module)
///     .build();
///
/// Application::bootstrap(&mut root).await?.serve("0.0.0.0:3000").await?;
/// ```
#[derive(Debug)]
pub struct Application {
    router: Router,
}

impl Application {
    /// Register the root module's tree and mount its routes.
    pub async fn bootstrap(root: &mut Module) -> Result<Application> {
        let routes = root.register().await?;
        tracing::info!(routes = routes.len(), "application bootstrapped");
        let router = mount(routes, root.container().clone());
        Ok(Self { router })
    }

    /// The mounted router, for custom serving or testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind `addr` and serve until a shutdown signal arrives.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "server running");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("server stopped");
        Ok(())
    }
}

/// Create a future that completes when a shutdown signal is received
///
/// # Example
///
/// ```rust,ignore
/// tokio::select! {
///     _ = shutdown_signal() => {
///         println!("Shutdown signal received");
///     }
///     _ = server.serve() => {}
/// }
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
