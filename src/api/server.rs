use std::sync::Arc;

use anyhow::{Context, Result};
use async_graphql_axum::GraphQL;
use axum::Router;
use axum::routing::post_service;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::application::LedgerService;

use super::build_schema;

/// HTTP server exposing the GraphQL schema at `/graphql`.
pub struct ApiServer {
    service: Arc<LedgerService>,
    bind_addr: String,
}

impl ApiServer {
    pub fn new(service: Arc<LedgerService>, port: u16) -> Self {
        Self {
            service,
            bind_addr: format!("0.0.0.0:{}", port),
        }
    }

    /// Bind and serve until the shutdown signal fires. In-flight requests
    /// drain before this returns.
    pub async fn start(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let schema = build_schema(self.service);

        let app = Router::new()
            .route("/graphql", post_service(GraphQL::new(schema)))
            .layer(CorsLayer::permissive());

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .with_context(|| format!("Failed to bind API server on {}", self.bind_addr))?;

        info!("GraphQL server is running on http://{}/graphql", self.bind_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .context("API server failed")?;

        Ok(())
    }
}
