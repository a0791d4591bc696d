use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_HOST: &str = "MINIO_HOST";
pub const ENV_PORT: &str = "MINIO_API_PORT";
pub const ENV_ACCESS_KEY: &str = "MINIO_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "MINIO_SECRET_KEY";
pub const ENV_SECURE: &str = "MINIO_SECURE";
pub const ENV_REGION: &str = "MINIO_REGION";
pub const ENV_INSECURE_TLS: &str = "MINIO_INSECURE_TLS";

/// Bucket override variables paired with their default names, in provisioning order
pub const BUCKET_VARS: [(&str, &str); 4] = [
    ("MINIO_BUCKET_DOCUMENTS", "documents"),
    ("MINIO_BUCKET_TEMPLATES", "templates"),
    ("MINIO_BUCKET_ATTACHMENTS", "attachments"),
    ("MINIO_BUCKET_BACKUPS", "backups"),
];

/// Connection settings and the buckets to provision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// MinIO host name or address
    #[serde(default = "default_host")]
    pub host: String,

    /// MinIO API port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_access_key")]
    pub access_key: String,

    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Use HTTPS instead of HTTP
    #[serde(default)]
    pub secure: bool,

    /// Signing region (MinIO accepts us-east-1 unless configured otherwise)
    #[serde(default = "default_region")]
    pub region: String,

    /// Skip TLS certificate verification (self-signed MinIO deployments)
    #[serde(default)]
    pub insecure_tls: bool,

    /// Bucket names, processed in order
    #[serde(default = "default_buckets")]
    pub buckets: Vec<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_access_key() -> String {
    "ncc_admin".to_string()
}

fn default_secret_key() -> String {
    "ncc_minio_password_2024".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_buckets() -> Vec<String> {
    BUCKET_VARS
        .iter()
        .map(|(_, name)| name.to_string())
        .collect()
}

impl Config {
    /// Configuration with every field at its default
    pub fn new() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            access_key: default_access_key(),
            secret_key: default_secret_key(),
            secure: false,
            region: default_region(),
            insecure_tls: false,
            buckets: default_buckets(),
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// `host:port` as shown to operators
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base endpoint URL, e.g. `http://localhost:9000`
    pub fn endpoint(&self) -> String {
        format!("{}://{}", self.scheme(), self.address())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpret a boolean environment value. Only `true` (any case) enables it.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: Config = serde_yaml::from_str(&content)
        .context("Failed to parse YAML configuration")?;

    if config.buckets.is_empty() {
        anyhow::bail!("Config file lists no buckets");
    }

    Ok(config)
}

/// Load configuration from environment variables
///
/// A `.env` file in the working directory is read first when present;
/// variables already set in the process environment take precedence.
pub fn load_from_env() -> Result<Config> {
    let _ = dotenvy::dotenv();

    from_lookup(|key| std::env::var(key).ok())
}

/// Build configuration from an arbitrary variable lookup.
///
/// Every variable is optional; missing ones fall back to the defaults.
pub fn from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = Config::new();

    if let Some(host) = lookup(ENV_HOST) {
        config.host = host;
    }

    if let Some(port) = lookup(ENV_PORT) {
        config.port = port
            .trim()
            .parse()
            .context(format!("{} must be a port number, got {:?}", ENV_PORT, port))?;
    }

    if let Some(access_key) = lookup(ENV_ACCESS_KEY) {
        config.access_key = access_key;
    }

    if let Some(secret_key) = lookup(ENV_SECRET_KEY) {
        config.secret_key = secret_key;
    }

    if let Some(secure) = lookup(ENV_SECURE) {
        config.secure = parse_flag(&secure);
    }

    if let Some(region) = lookup(ENV_REGION) {
        config.region = region;
    }

    if let Some(insecure) = lookup(ENV_INSECURE_TLS) {
        config.insecure_tls = parse_flag(&insecure) || insecure.trim() == "1";
    }

    config.buckets = BUCKET_VARS
        .iter()
        .map(|&(var, default)| lookup(var).unwrap_or_else(|| default.to_string()))
        .collect();

    Ok(config)
}

/// Load configuration from a YAML file when given, otherwise from the environment
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    match config_path {
        Some(path) => load_from_yaml(path),
        None => load_from_env(),
    }
}
