use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Default upload size cap: 500 MiB.
pub const DEFAULT_MAX_FILE_SIZE: usize = 500 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub public_dir: String,
    pub max_file_size: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Minimal audio-file hosting service")]
pub struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploads are stored (overrides UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<String>,

    /// Directory served under /public (overrides PUBLIC_DIR)
    #[arg(long)]
    pub public_dir: Option<String>,

    /// Maximum upload size in bytes (overrides MAX_FILE_SIZE)
    #[arg(long)]
    pub max_file_size: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading PORT"),
        };
        let env_upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into());
        let env_public_dir = env::var("PUBLIC_DIR").unwrap_or_else(|_| "./public".into());
        let env_max_size = match env::var("MAX_FILE_SIZE") {
            Ok(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing MAX_FILE_SIZE value `{}`", value))?,
            Err(env::VarError::NotPresent) => DEFAULT_MAX_FILE_SIZE,
            Err(err) => return Err(err).context("reading MAX_FILE_SIZE"),
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            upload_dir: args.upload_dir.unwrap_or(env_upload_dir),
            public_dir: args.public_dir.unwrap_or(env_public_dir),
            max_file_size: args.max_file_size.unwrap_or(env_max_size),
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
