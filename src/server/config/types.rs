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

//! Configuration types for spaceapi-server.
//!
//! This module defines the configuration schema for YAML file-based
//! server configuration. All types support serde serialization/deserialization.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Main server configuration loaded from YAML files.
///
/// # Example YAML
///
/// ```yaml
/// server:
///   bind_address: "0.0.0.0"
///   port: 8080
///
/// document:
///   path: /var/lib/spaceapi/spaceapi.json
///
/// auth:
///   api_key: "change-me"
///
/// security:
///   max_auth_attempts: 5
///   trusted_proxies:
///     - 127.0.0.1
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerFileConfig {
    /// HTTP listener settings.
    pub server: ServerSettings,

    /// Status document settings.
    pub document: DocumentConfig,

    /// Write credential.
    pub auth: AuthConfig,

    /// Failed-attempt limits and client identification.
    pub security: SecurityConfig,

    /// Cross-origin response headers.
    pub cors: CorsConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind to (e.g., "0.0.0.0" or "127.0.0.1").
    ///
    /// Default: "0.0.0.0"
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to listen on.
    ///
    /// Default: 8080
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Status document settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Path to the SpaceAPI JSON document loaded at startup.
    ///
    /// Default: "spaceapi.json"
    #[serde(default = "default_document_path")]
    pub path: PathBuf,
}

/// Write credential configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared API key required for write requests.
    ///
    /// When unset, every write request is rejected with a server
    /// configuration error. Prefer `SPACEAPI_AUTH_KEY` over storing the key here.
    pub api_key: Option<String>,
}

/// Failed-attempt limits and client identification.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Failed attempts that trigger a block.
    ///
    /// Default: 5
    #[serde(default = "default_max_auth_attempts")]
    pub max_auth_attempts: u32,

    /// Window in seconds, measured from the first failure, in which
    /// `max_auth_attempts` must occur to trigger a block.
    ///
    /// Default: 900 (15 minutes)
    #[serde(default = "default_auth_window")]
    pub auth_window: u64,

    /// Block duration in seconds.
    ///
    /// Default: 3600 (1 hour)
    #[serde(default = "default_block_time")]
    pub block_time: u64,

    /// Age in seconds after which attempt records are evicted.
    ///
    /// Default: 7200 (2 hours)
    #[serde(default = "default_retention")]
    pub retention: u64,

    /// Interval in seconds between eviction sweeps.
    ///
    /// Default: 1800 (30 minutes)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,

    /// Peers allowed to set `X-Forwarded-For`.
    ///
    /// Empty means the header is trusted from any peer.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

/// Cross-origin response headers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Add permissive CORS headers and answer preflight requests.
    ///
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_document_path() -> PathBuf {
    PathBuf::from("spaceapi.json")
}

fn default_true() -> bool {
    true
}

fn default_max_auth_attempts() -> u32 {
    5
}

fn default_auth_window() -> u64 {
    900
}

fn default_block_time() -> u64 {
    3600
}

fn default_retention() -> u64 {
    7200
}

fn default_cleanup_interval() -> u64 {
    1800
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: default_document_path(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_auth_attempts: default_max_auth_attempts(),
            auth_window: default_auth_window(),
            block_time: default_block_time(),
            retention: default_retention(),
            cleanup_interval: default_cleanup_interval(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}
