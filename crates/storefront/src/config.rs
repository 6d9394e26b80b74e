//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify shop name (`your-store`) or full domain
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API access token
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2021-10)
//! - `SWR_MAX_AGE_SECONDS` - Freshness window for provider responses (default: 60)
//! - `SWR_MAX_ENTRIES` - In-memory store capacity (default: 10000)
//! - `IMAGE_CACHE_DIR` - Transformed image directory (default: .cache/images)
//! - `PUBLIC_DIR` - Root for `/`-relative image sources (default: public)
//! - `IMAGE_ACCEPT_INVALID_CERTS` - Skip TLS verification for image sources (default: false)
//! - `SESSION_SECURE_COOKIE` - Mark the session cookie `Secure` (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyConfig,
    /// Provider response cache configuration
    pub swr: SwrConfig,
    /// Image transform cache configuration
    pub images: ImageConfig,
    /// Mark the session cookie `Secure` (HTTPS only)
    pub secure_cookies: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shop name (`your-store`) or full domain (`shop.example.com`)
    pub store: String,
    /// Storefront API version (e.g., 2021-10)
    pub api_version: String,
    /// Storefront API access token
    pub storefront_access_token: SecretString,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_access_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyConfig {
    /// GraphQL endpoint for this shop.
    ///
    /// A bare shop name expands to `<name>.myshopify.com`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let host = if self.store.contains('.') {
            self.store.clone()
        } else {
            format!("{}.myshopify.com", self.store)
        };
        format!("https://{host}/api/{}/graphql.json", self.api_version)
    }
}

/// Provider response cache configuration.
#[derive(Debug, Clone)]
pub struct SwrConfig {
    /// How long a cached response counts as fresh
    pub max_age: Duration,
    /// Maximum number of entries in the in-memory store
    pub max_entries: u64,
}

impl Default for SwrConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(60),
            max_entries: 10_000,
        }
    }
}

/// Image transform cache configuration.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Directory holding transformed images
    pub cache_dir: PathBuf,
    /// Directory `/`-relative sources are read from
    pub public_dir: PathBuf,
    /// Accept invalid TLS certificates from image sources
    pub accept_invalid_certs: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache/images"),
            public_dir: PathBuf::from("public"),
            accept_invalid_certs: false,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the access token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_parsed_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;

        let shopify = ShopifyConfig::from_env()?;
        let swr = SwrConfig::from_env()?;
        let images = ImageConfig::from_env()?;
        let secure_cookies = get_parsed_env_or_default("SESSION_SECURE_COOKIE", "false")?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            shopify,
            swr,
            images,
            secure_cookies,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let storefront_access_token = get_required_secret("SHOPIFY_STOREFRONT_ACCESS_TOKEN")?;
        reject_placeholder(
            storefront_access_token.expose_secret(),
            "SHOPIFY_STOREFRONT_ACCESS_TOKEN",
        )?;

        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2021-10"),
            storefront_access_token,
        })
    }
}

impl SwrConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_age: Duration::from_secs(get_parsed_env_or_default("SWR_MAX_AGE_SECONDS", "60")?),
            max_entries: get_parsed_env_or_default("SWR_MAX_ENTRIES", "10000")?,
        })
    }
}

impl ImageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cache_dir: get_env_or_default("IMAGE_CACHE_DIR", ".cache/images").into(),
            public_dir: get_env_or_default("PUBLIC_DIR", "public").into(),
            accept_invalid_certs: get_parsed_env_or_default("IMAGE_ACCEPT_INVALID_CERTS", "false")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable with a default value and parse it.
fn get_parsed_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Reject values that look like template placeholders.
fn reject_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if secret.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "is empty".to_string(),
        ));
    }

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}
