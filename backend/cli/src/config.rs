use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;

use grid_gateway::cors::DEFAULT_ALLOWED_ORIGINS;
use grid_gateway::server::DEFAULT_MAX_UPLOAD_BYTES;
use grid_logging::LogFormat;

pub const DEFAULT_PORT: u16 = 4060;

/// Gateway runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// GridFS connection string
    pub mongo_uri: Option<String>,
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Origins allowed to call the API cross-origin
    pub cors_origins: Vec<String>,
    /// Upload body cap in bytes
    pub max_upload_bytes: usize,
    /// Log level
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo_uri: None,
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`) with defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Listen address; `bind_address` may be IPv4 or IPv6 (`::`).
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.bind_address.trim().parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Unset, empty or unparsable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            mongo_uri: var("MONGO_URI"),
            bind_address: var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: var("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: var("CORS_ORIGINS")
                .map(|list| {
                    list.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            max_upload_bytes: var("MAX_UPLOAD_BYTES")
                .and_then(|n| n.trim().parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: var("LOG_FORMAT")
                .and_then(|f| f.parse().ok())
                .unwrap_or(defaults.log_format),
            log_dir: var("LOG_DIR").map(PathBuf::from),
        }
    }
}
