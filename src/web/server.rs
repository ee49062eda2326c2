//! Web server for Nimbus.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::file::{FileService, FileStorage};
use crate::{Database, NimbusError, Result};

use super::handlers::{AppState, SharedDatabase};
use super::middleware::JwtState;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
    /// Orphan sweep interval in seconds (0 = disabled).
    sweep_interval_secs: u64,
}

impl WebServer {
    /// Create a new web server from configuration and an open database.
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|_| {
                NimbusError::Config(format!(
                    "invalid server address {}:{}",
                    config.server.host, config.server.port
                ))
            })?;

        let storage = FileStorage::new(&config.storage.path)?;
        tracing::info!("File storage initialized at: {}", config.storage.path);

        let app_state = Arc::new(AppState::new(
            Arc::new(db),
            storage,
            config.max_file_size_bytes(),
        ));
        let jwt_state = Arc::new(JwtState::new(&config.auth.jwt_secret));

        Ok(Self {
            addr,
            app_state,
            jwt_state,
            cors_origins: config.server.cors_origins.clone(),
            sweep_interval_secs: config.storage.sweep_interval_secs,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the periodic orphan sweep background task.
    ///
    /// Reclaims stored objects whose metadata rows are gone, e.g. after a
    /// crash between an object write and the matching row insert.
    fn start_sweep_task(
        db: SharedDatabase,
        storage: FileStorage,
        max_file_size: u64,
        interval_secs: u64,
    ) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                let service = FileService::new(db.pool(), &storage, max_file_size);
                match service.sweep_orphans().await {
                    Ok(count) => {
                        if count > 0 {
                            tracing::info!(removed = count, "Orphan sweep reclaimed objects");
                        } else {
                            tracing::debug!("Orphan sweep found nothing to reclaim");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Orphan sweep failed");
                    }
                }
            }
        });
    }

    fn build_router(&self) -> axum::Router {
        create_router(
            self.app_state.clone(),
            self.jwt_state.clone(),
            &self.cors_origins,
        )
        .merge(create_health_router())
    }

    fn start_background_tasks(&self) {
        if self.sweep_interval_secs > 0 {
            Self::start_sweep_task(
                self.app_state.db.clone(),
                self.app_state.storage.clone(),
                self.app_state.max_file_size,
                self.sweep_interval_secs,
            );
            tracing::info!(
                interval_secs = self.sweep_interval_secs,
                "Orphan sweep task started"
            );
        }
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        // Start background tasks after successful bind
        self.start_background_tasks();

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        self.start_background_tasks();

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
