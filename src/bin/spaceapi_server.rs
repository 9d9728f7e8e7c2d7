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

//! spaceapi-server binary - SpaceAPI status endpoint for hackerspaces
//!
//! This binary provides a command-line interface for running and configuring
//! the SpaceAPI server.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use spaceapi::server::config::{generate_config_template, load_config, ServerFileConfig};
use spaceapi::server::SpaceApiServer;
use spaceapi::utils::logging;
use std::io::Write;
use std::path::PathBuf;

/// SpaceAPI server - publishes whether the space is open
#[derive(Parser, Debug)]
#[command(name = "spaceapi-server")]
#[command(version)]
#[command(about = "SpaceAPI server - publishes whether the space is open", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(short = 'b', long, global = true, value_name = "ADDR")]
    bind_address: Option<String>,

    /// Port to listen on
    #[arg(short, long, global = true, value_name = "PORT")]
    port: Option<u16>,

    /// SpaceAPI JSON document
    #[arg(short = 'd', long, global = true, value_name = "FILE")]
    document: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the server (default)
    Run,

    /// Generate a configuration file template
    GenConfig {
        /// Output path (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check configuration and document for errors
    CheckConfig,

    /// Show version information
    Version,
}

/// CLI arguments for configuration overrides
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub document: Option<PathBuf>,
}

impl From<&Cli> for CliArgs {
    fn from(cli: &Cli) -> Self {
        Self {
            bind_address: cli.bind_address.clone(),
            port: cli.port,
            document: cli.document.clone(),
        }
    }
}

impl CliArgs {
    /// Apply CLI overrides on top of file and environment configuration.
    fn apply(&self, config: &mut ServerFileConfig) {
        if let Some(bind_address) = &self.bind_address {
            config.server.bind_address = bind_address.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(document) = &self.document {
            config.document.path = document.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.verbose);

    match &cli.command {
        None | Some(Commands::Run) => run_server(&cli).await,
        Some(Commands::GenConfig { output }) => gen_config(output.clone()),
        Some(Commands::CheckConfig) => check_config(&cli),
        Some(Commands::Version) => show_version(),
    }
}

/// Load file and environment configuration, then apply CLI overrides.
fn resolve_config(cli: &Cli) -> Result<ServerFileConfig> {
    let mut file_config = match &cli.config {
        Some(config_path) => load_config(Some(config_path))
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?,
        None => load_config(None).context("Failed to load configuration")?,
    };

    CliArgs::from(cli).apply(&mut file_config);
    Ok(file_config)
}

/// Run the server until SIGINT or SIGTERM
async fn run_server(cli: &Cli) -> Result<()> {
    tracing::info!("Starting spaceapi-server");

    let config = resolve_config(cli)?.into_server_config();

    tracing::info!(
        address = %config.listen_address,
        document = %config.document_path.display(),
        cors = config.cors_enabled,
        trusted_proxies = config.trusted_proxies.len(),
        "Server configuration loaded"
    );

    let server = SpaceApiServer::from_config(config)?;

    server.run(shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Generate a configuration file template
fn gen_config(output: Option<PathBuf>) -> Result<()> {
    let template = generate_config_template();

    if let Some(path) = output {
        #[cfg(unix)]
        {
            use std::fs::OpenOptions;
            use std::os::unix::fs::OpenOptionsExt;

            // The template may end up holding the API key
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)
                .context("Failed to create configuration file")?;

            file.write_all(template.as_bytes())
                .context("Failed to write configuration file")?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&path, &template).context("Failed to write configuration file")?;
        }

        println!("Configuration template written to {}", path.display());
        #[cfg(unix)]
        println!("File permissions set to 0600 (owner read/write only)");
    } else {
        print!("{}", template);
    }

    Ok(())
}

/// Check configuration and document for errors
fn check_config(cli: &Cli) -> Result<()> {
    let file_config = resolve_config(cli)?;

    let document = spaceapi::document::load_document(&file_config.document.path)
        .context("Failed to load SpaceAPI document")?;

    println!("✓ Configuration is valid\n");
    println!("Server Configuration:");
    println!("  Bind address: {}", file_config.server.bind_address);
    println!("  Port: {}", file_config.server.port);
    println!("  CORS: {}", file_config.cors.enabled);

    println!("\nDocument:");
    println!("  Path: {}", file_config.document.path.display());
    println!("  Space: {}", document.space);
    println!("  API compatibility: {:?}", document.api_compatibility);
    println!("  Events: {}", document.events.len());

    let security = &file_config.security;
    println!("\nSecurity:");
    println!(
        "  API key: {}",
        if file_config.auth.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            "configured"
        } else {
            "NOT configured (writes will be rejected)"
        }
    );
    println!("  Max auth attempts: {}", security.max_auth_attempts);
    println!("  Auth window: {}s", security.auth_window);
    println!("  Block time: {}s", security.block_time);
    println!("  Retention: {}s", security.retention);
    println!("  Cleanup interval: {}s", security.cleanup_interval);
    if !security.trusted_proxies.is_empty() {
        println!("  Trusted proxies: {:?}", security.trusted_proxies);
    }

    Ok(())
}

/// Show version information
fn show_version() -> Result<()> {
    println!("spaceapi-server {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("SpaceAPI status endpoint for hackerspaces");

    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        use clap::CommandFactory;

        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_args_apply() {
        let cli = Cli::try_parse_from([
            "spaceapi-server",
            "-b",
            "127.0.0.1",
            "-p",
            "9090",
            "-d",
            "/srv/space.json",
        ])
        .unwrap();

        let mut config = ServerFileConfig::default();
        CliArgs::from(&cli).apply(&mut config);

        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.document.path, PathBuf::from("/srv/space.json"));
    }

    #[test]
    fn test_cli_args_apply_empty() {
        let cli = Cli::try_parse_from(["spaceapi-server"]).unwrap();

        let mut config = ServerFileConfig::default();
        CliArgs::from(&cli).apply(&mut config);

        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parsing_with_subcommand() {
        let args = Cli::try_parse_from(["spaceapi-server", "run"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Run)));

        let args = Cli::try_parse_from(["spaceapi-server", "gen-config"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Commands::GenConfig { output: None })
        ));

        let args =
            Cli::try_parse_from(["spaceapi-server", "gen-config", "-o", "/tmp/config.yaml"])
                .unwrap();
        if let Some(Commands::GenConfig { output }) = args.command {
            assert_eq!(output, Some(PathBuf::from("/tmp/config.yaml")));
        } else {
            panic!("Expected GenConfig command");
        }

        let args = Cli::try_parse_from(["spaceapi-server", "check-config"]).unwrap();
        assert!(matches!(args.command, Some(Commands::CheckConfig)));

        let args = Cli::try_parse_from(["spaceapi-server", "version"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Version)));
    }

    #[test]
    fn test_cli_global_options() {
        let args = Cli::try_parse_from([
            "spaceapi-server",
            "-c",
            "/etc/spaceapi/server.yaml",
            "-vvv",
            "run",
            "-p",
            "8081",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("/etc/spaceapi/server.yaml")));
        assert_eq!(args.verbose, 3);
        assert_eq!(args.port, Some(8081));
    }

    #[test]
    fn test_gen_config_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.yaml");

        gen_config(Some(path.clone())).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("spaceapi-server configuration"));
    }
}
