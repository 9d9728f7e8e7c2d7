// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SpaceAPI HTTP server.
//!
//! # Overview
//!
//! The server module consists of:
//!
//! - [`SpaceApiServer`]: owns the document store and the auth gate, serves HTTP
//! - [`ServerConfig`]: resolved runtime configuration
//! - [`security`]: failed-attempt limiter and API key gate
//! - [`router`]: route table
//!
//! # Example
//!
//! ```no_run
//! use spaceapi::server::{ServerConfig, SpaceApiServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::builder()
//!         .listen_address("0.0.0.0:8080")
//!         .document_path("spaceapi.json")
//!         .api_key("change-me")
//!         .build();
//!
//!     let server = SpaceApiServer::from_config(config)?;
//!     server.run(async { let _ = tokio::signal::ctrl_c().await; }).await
//! }
//! ```

pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod router;
pub mod security;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;

use crate::document::{load_document, SpaceApi, StatusStore};

pub use self::config::{ServerConfig, ServerConfigBuilder};
pub use self::error::ApiError;
pub use self::security::{AuthGate, AuthRateLimitConfig, AuthRateLimiter};

/// The SpaceAPI server.
///
/// Cloning the store, gate or limiter handles shares state with the server.
pub struct SpaceApiServer {
    config: Arc<ServerConfig>,
    store: StatusStore,
    gate: AuthGate,
}

impl SpaceApiServer {
    /// Create a server around an already loaded document.
    pub fn new(config: ServerConfig, document: SpaceApi) -> Self {
        let limiter = AuthRateLimiter::new(config.rate_limit.clone());
        let gate = AuthGate::new(limiter, config.api_key.clone())
            .with_trusted_proxies(config.trusted_proxies.clone());

        Self {
            config: Arc::new(config),
            store: StatusStore::new(document),
            gate,
        }
    }

    /// Create a server, loading the document from `config.document_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed.
    pub fn from_config(config: ServerConfig) -> Result<Self> {
        let document = load_document(&config.document_path).with_context(|| {
            format!(
                "Failed to load SpaceAPI document from {}",
                config.document_path.display()
            )
        })?;

        tracing::info!(
            path = %config.document_path.display(),
            space = %document.space,
            events = document.events.len(),
            "Loaded SpaceAPI document"
        );

        Ok(Self::new(config, document))
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the document store.
    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// Get the failed-attempt limiter.
    pub fn limiter(&self) -> &AuthRateLimiter {
        self.gate.limiter()
    }

    /// Build the router without starting the limiter's eviction sweep.
    pub fn router(&self) -> Router {
        router::build_router(
            self.store.clone(),
            self.gate.clone(),
            self.config.cors_enabled,
        )
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = &self.config.listen_address;
        tracing::info!(address = %addr, "Starting SpaceAPI server");

        let listener = TcpListener::bind(addr.as_str())
            .await
            .with_context(|| format!("Failed to bind to {addr}"))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// The limiter's eviction sweep runs for the lifetime of the call and is
    /// stopped once in-flight requests have drained.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            local_addr = ?listener.local_addr(),
            api_key_configured = self.gate.is_configured(),
            "SpaceAPI server listening"
        );

        if !self.gate.is_configured() {
            tracing::warn!("No API key configured; write requests will fail");
        }

        let limiter = self.limiter().clone();
        limiter.start_cleanup();

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Server error");

        limiter.stop();
        tracing::info!("SpaceAPI server stopped");

        result
    }
}
