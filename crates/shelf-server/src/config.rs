//! Server configuration from environment variables.

use std::env;

use http::HeaderValue;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server port to listen on.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
    /// CORS allowed origins (comma-separated or "*" for all).
    pub cors_allowed_origins: String,
    /// Username of the credential guarding deletes.
    pub auth_username: String,
    /// Password of the credential guarding deletes.
    pub auth_password: String,
    /// Largest request body accepted on writes, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: "info".to_string(),
            log_json: false,
            cors_allowed_origins: "*".to_string(),
            auth_username: "admin".to_string(),
            auth_password: "admin".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// All optional:
    /// - `PORT`: Server port (default: 3000)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    /// - `LOG_FORMAT`: "text" or "json" (default: "text")
    /// - `CORS_ALLOWED_ORIGINS`: Allowed CORS origins (default: "*")
    /// - `AUTH_USERNAME` / `AUTH_PASSWORD`: Delete credential (default: admin / admin)
    /// - `MAX_BODY_BYTES`: Request body limit (default: 1 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_var(&var, "PORT")?.unwrap_or(defaults.port);
        let max_body_bytes = parse_var(&var, "MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_bytes);

        let log_level = var("LOG_LEVEL").unwrap_or(defaults.log_level);

        let log_json = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => false,
            Some("json") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "LOG_FORMAT".to_string(),
                    reason: format!("expected \"text\" or \"json\", got {other:?}"),
                });
            }
        };

        let cors_allowed_origins =
            var("CORS_ALLOWED_ORIGINS").unwrap_or(defaults.cors_allowed_origins);

        let auth_username = var("AUTH_USERNAME").unwrap_or(defaults.auth_username);
        let auth_password = var("AUTH_PASSWORD").unwrap_or(defaults.auth_password);
        if auth_username.contains(':') {
            return Err(ConfigError::InvalidValue {
                name: "AUTH_USERNAME".to_string(),
                reason: "must not contain ':'".to_string(),
            });
        }

        let config = Self {
            port,
            log_level,
            log_json,
            cors_allowed_origins,
            auth_username,
            auth_password,
            max_body_bytes,
        };
        config.cors_origins()?;
        Ok(config)
    }

    /// Get the socket address for the server.
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// Parsed CORS origins; `None` means any origin.
    pub fn cors_origins(&self) -> Result<Option<Vec<HeaderValue>>, ConfigError> {
        if self.cors_allowed_origins.trim() == "*" {
            return Ok(None);
        }
        self.cors_allowed_origins
            .split(',')
            .map(|s| {
                s.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    name: "CORS_ALLOWED_ORIGINS".to_string(),
                    reason: format!("invalid origin {s:?}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid environment variable value.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
