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

//! Configuration loader for spaceapi-server.
//!
//! This module handles loading configuration from multiple sources with
//! the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file (YAML)
//! 4. Default values

use super::types::ServerFileConfig;
use crate::server::security::MAX_DURATION;
use anyhow::{Context, Result};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Load configuration from file and environment.
///
/// CLI arguments are applied on top of the result by the binary.
///
/// # Arguments
///
/// * `config_path` - Optional path to configuration file. If None, searches default locations.
///
/// # Default Locations
///
/// If no config path is specified, searches in order:
/// 1. `./spaceapi-server.yaml` (current directory)
/// 2. `/etc/spaceapi/server.yaml` (system-wide)
/// 3. `$XDG_CONFIG_HOME/spaceapi/server.yaml` or `~/.config/spaceapi/server.yaml` (user-specific)
///
/// # Environment Variables
///
/// - `PORT` or `SPACEAPI_PORT` - Server port (`SPACEAPI_PORT` wins when both are set)
/// - `SPACEAPI_BIND_ADDRESS` - Bind address (e.g., "127.0.0.1")
/// - `SPACEAPI_DOCUMENT` - Path to the SpaceAPI JSON document
/// - `SPACEAPI_AUTH_KEY` - Shared API key for write requests
/// - `SPACEAPI_TRUSTED_PROXIES` - Comma-separated proxy addresses
///
/// # Example
///
/// ```no_run
/// use spaceapi::server::config::load_config;
///
/// # fn main() -> anyhow::Result<()> {
/// let config = load_config(None)?;
/// let config = load_config(Some("/etc/spaceapi/custom.yaml".as_ref()))?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if:
/// - Configuration file cannot be read or parsed
/// - Environment variables have invalid values
/// - Configuration validation fails
pub fn load_config(config_path: Option<&Path>) -> Result<ServerFileConfig> {
    let mut config = ServerFileConfig::default();

    if let Some(path) = config_path {
        config = load_config_file(path).context("Failed to load configuration file")?;
        tracing::info!(path = %path.display(), "Loaded configuration from file");
    } else {
        for path in default_config_paths() {
            if path.exists() {
                config = load_config_file(&path).context("Failed to load configuration file")?;
                tracing::info!(path = %path.display(), "Loaded configuration from file");
                break;
            }
        }
    }

    config = apply_env_overrides(config)?;

    validate_config(&config)?;

    Ok(config)
}

/// Generate a configuration template as YAML string.
///
/// # Example
///
/// ```
/// use spaceapi::server::config::generate_config_template;
///
/// let template = generate_config_template();
/// assert!(template.contains("security:"));
/// ```
pub fn generate_config_template() -> String {
    let config = ServerFileConfig::default();
    let mut yaml = String::new();

    yaml.push_str("# spaceapi-server configuration file\n");
    yaml.push_str("#\n");
    yaml.push_str("# Configuration hierarchy (highest to lowest precedence):\n");
    yaml.push_str("# 1. CLI arguments\n");
    yaml.push_str("# 2. Environment variables (PORT, SPACEAPI_* prefix)\n");
    yaml.push_str("# 3. This configuration file\n");
    yaml.push_str("# 4. Default values\n");
    yaml.push_str("#\n");
    yaml.push_str("# Write requests are rejected until auth.api_key or SPACEAPI_AUTH_KEY is set.\n");
    yaml.push_str("# Durations under `security` are in seconds.\n\n");

    yaml.push_str(&serde_yaml::to_string(&config).unwrap_or_default());

    yaml
}

/// Load configuration from a YAML file.
fn load_config_file(path: &Path) -> Result<ServerFileConfig> {
    let content =
        std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;

    serde_yaml::from_str(&content).context(format!("Failed to parse {}", path.display()))
}

/// Get default configuration file search paths.
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("./spaceapi-server.yaml"),
        PathBuf::from("/etc/spaceapi/server.yaml"),
    ];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("spaceapi/server.yaml"));
    }

    paths
}

fn parse_port(var: &str, value: &str) -> Result<u16> {
    value
        .parse()
        .context(format!("Invalid {var} value: {value}"))
}

/// Apply environment variable overrides to configuration.
fn apply_env_overrides(mut config: ServerFileConfig) -> Result<ServerFileConfig> {
    // PORT, as set by most container platforms
    if let Ok(port_str) = std::env::var("PORT") {
        config.server.port = parse_port("PORT", &port_str)?;
        tracing::debug!(port = config.server.port, "Applied PORT override");
    }

    if let Ok(port_str) = std::env::var("SPACEAPI_PORT") {
        config.server.port = parse_port("SPACEAPI_PORT", &port_str)?;
        tracing::debug!(port = config.server.port, "Applied SPACEAPI_PORT override");
    }

    if let Ok(addr) = std::env::var("SPACEAPI_BIND_ADDRESS") {
        tracing::debug!(address = %addr, "Applied SPACEAPI_BIND_ADDRESS override");
        config.server.bind_address = addr;
    }

    if let Ok(path) = std::env::var("SPACEAPI_DOCUMENT") {
        tracing::debug!(path = %path, "Applied SPACEAPI_DOCUMENT override");
        config.document.path = PathBuf::from(path);
    }

    // Never log the key itself
    if let Ok(key) = std::env::var("SPACEAPI_AUTH_KEY") {
        config.auth.api_key = Some(key);
        tracing::debug!("Applied SPACEAPI_AUTH_KEY override");
    }

    // SPACEAPI_TRUSTED_PROXIES (comma-separated list)
    if let Ok(proxies) = std::env::var("SPACEAPI_TRUSTED_PROXIES") {
        config.security.trusted_proxies = proxies
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<IpAddr>()
                    .context(format!("Invalid address in SPACEAPI_TRUSTED_PROXIES: {s}"))
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            proxy_count = config.security.trusted_proxies.len(),
            "Applied SPACEAPI_TRUSTED_PROXIES override"
        );
    }

    Ok(config)
}

/// Validate configuration for correctness.
fn validate_config(config: &ServerFileConfig) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.document.path.as_os_str().is_empty() {
        anyhow::bail!("Document path cannot be empty (document.path or SPACEAPI_DOCUMENT)");
    }

    let security = &config.security;
    if security.max_auth_attempts == 0 {
        anyhow::bail!("max_auth_attempts must be greater than 0");
    }
    for (name, secs) in [
        ("auth_window", security.auth_window),
        ("block_time", security.block_time),
        ("retention", security.retention),
        ("cleanup_interval", security.cleanup_interval),
    ] {
        validate_duration(name, secs)?;
    }

    if config.auth.api_key.as_deref().is_none_or(str::is_empty) {
        tracing::warn!("No API key configured; all write requests will be rejected");
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

/// Durations must be non-zero and at most [`MAX_DURATION`].
fn validate_duration(name: &str, secs: u64) -> Result<()> {
    if secs == 0 {
        anyhow::bail!("{name} must be greater than 0");
    }
    if secs > MAX_DURATION.as_secs() {
        anyhow::bail!(
            "{name} must be at most {} seconds (one year)",
            MAX_DURATION.as_secs()
        );
    }
    Ok(())
}
