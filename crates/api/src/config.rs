use docket_core::permission::{
    EditPolicy, DEFAULT_GRANT_DURATION_HOURS, DEFAULT_INITIAL_EDIT_WINDOW_HOURS,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Initial edit window and grant duration.
    pub edit_policy: EditPolicy,
    /// Directory that stored attachment paths are relative to.
    pub attachment_root: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `EDIT_WINDOW_HOURS`    | `24`                       |
    /// | `EDIT_GRANT_HOURS`     | `24`                       |
    /// | `ATTACHMENT_ROOT`      | `./uploads`                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let window_hours: i64 = std::env::var("EDIT_WINDOW_HOURS")
            .unwrap_or_else(|_| DEFAULT_INITIAL_EDIT_WINDOW_HOURS.to_string())
            .parse()
            .expect("EDIT_WINDOW_HOURS must be a valid i64");

        let grant_hours: i64 = std::env::var("EDIT_GRANT_HOURS")
            .unwrap_or_else(|_| DEFAULT_GRANT_DURATION_HOURS.to_string())
            .parse()
            .expect("EDIT_GRANT_HOURS must be a valid i64");

        let edit_policy = EditPolicy::from_hours(window_hours, grant_hours)
            .expect("EDIT_WINDOW_HOURS and EDIT_GRANT_HOURS must be positive");

        let attachment_root =
            std::env::var("ATTACHMENT_ROOT").unwrap_or_else(|_| "./uploads".into());

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            edit_policy,
            attachment_root,
        }
    }
}
