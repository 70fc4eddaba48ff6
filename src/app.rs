//! Application wiring: configuration, model client, HTTP server.

use crate::ai::{GeminiVisionClient, VisionModel};
use crate::gateway::{self, AppState};
use crate::models::Config;
use crate::service::IdentificationService;
use crate::Result;
use axum::Router;
use tracing::{info, warn};

/// Owns the identification service and serves the gateway.
pub struct App {
    config: Config,
    service: IdentificationService,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub model: Box<dyn VisionModel>,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices, config: Config) -> Self {
        let service = IdentificationService::new(services.model, config.model_timeout);
        Self { config, service }
    }

    /// Construct an app talking to the hosted Gemini model.
    pub fn new(config: Config) -> Self {
        info!("Vision provider: Gemini (model: {})", config.gemini_model);

        let model = GeminiVisionClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.model_timeout,
        );

        Self::with_services(
            AppServices {
                model: Box::new(model),
            },
            config,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the app into its HTTP router.
    pub fn into_router(self) -> Router {
        let max_body_bytes = self.config.max_body_bytes;
        gateway::router(AppState::new(self.service, max_body_bytes))
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            "Listening on {} (body limit {} bytes, model timeout {:?})",
            listener.local_addr()?,
            self.config.max_body_bytes,
            self.config.model_timeout
        );

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
    }
}
