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

//! Server configuration.
//!
//! [`ServerFileConfig`] mirrors the YAML file; [`ServerConfig`] is the
//! resolved runtime configuration handed to the server.

mod loader;
mod types;

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

pub use loader::{generate_config_template, load_config};
pub use types::{
    AuthConfig, CorsConfig, DocumentConfig, SecurityConfig, ServerFileConfig, ServerSettings,
};

use crate::server::security::AuthRateLimitConfig;

/// Runtime configuration for the SpaceAPI server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080").
    pub listen_address: String,

    /// Path of the document loaded at startup.
    pub document_path: PathBuf,

    /// Shared write credential. `None` makes every write fail closed.
    pub api_key: Option<String>,

    /// Failed-attempt limits.
    pub rate_limit: AuthRateLimitConfig,

    /// Peers allowed to set `X-Forwarded-For`.
    pub trusted_proxies: Vec<IpAddr>,

    /// Whether CORS headers are added.
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_string(),
            document_path: PathBuf::from("spaceapi.json"),
            api_key: None,
            rate_limit: AuthRateLimitConfig::default(),
            trusted_proxies: Vec::new(),
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing server configuration.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl ServerFileConfig {
    /// Resolve the file configuration into the runtime configuration.
    pub fn into_server_config(self) -> ServerConfig {
        let security = self.security;
        let rate_limit = AuthRateLimitConfig::new(
            security.max_auth_attempts,
            security.auth_window,
            security.block_time,
        )
        .with_retention(Duration::from_secs(security.retention))
        .with_cleanup_interval(Duration::from_secs(security.cleanup_interval));

        ServerConfig {
            listen_address: format!("{}:{}", self.server.bind_address, self.server.port),
            document_path: self.document.path,
            api_key: self.auth.api_key.filter(|key| !key.is_empty()),
            rate_limit,
            trusted_proxies: security.trusted_proxies,
            cors_enabled: self.cors.enabled,
        }
    }
}

/// Builder for constructing ServerConfig.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the listen address.
    pub fn listen_address(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_address = addr.into();
        self
    }

    /// Set the document path.
    pub fn document_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.document_path = path.into();
        self
    }

    /// Set the shared API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the failed-attempt limits.
    pub fn rate_limit(mut self, rate_limit: AuthRateLimitConfig) -> Self {
        self.config.rate_limit = rate_limit;
        self
    }

    /// Add a trusted proxy address.
    pub fn trusted_proxy(mut self, addr: IpAddr) -> Self {
        self.config.trusted_proxies.push(addr);
        self
    }

    /// Enable or disable CORS headers.
    pub fn cors_enabled(mut self, enabled: bool) -> Self {
        self.config.cors_enabled = enabled;
        self
    }

    /// Build the ServerConfig.
    pub fn build(self) -> ServerConfig {
        self.config
    }
}
