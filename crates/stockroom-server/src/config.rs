//! Command-line and environment configuration.

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};
use stockroom_auth::AuthConfig;
use stockroom_db::DbConfig;

use crate::state::AppSettings;

/// Password the bootstrap admin gets when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "adminpass";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Stockroom inventory server.
#[derive(Debug, Clone, Parser)]
#[command(name = "stockroom", version, about = "Role-gated inventory ledger service")]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "STOCKROOM_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// SurrealDB endpoint (`mem://` or `ws://host:port`).
    #[arg(long, env = "STOCKROOM_DB_URL", default_value = "mem://")]
    pub db_url: String,

    #[arg(long, env = "STOCKROOM_DB_NAMESPACE", default_value = "stockroom")]
    pub db_namespace: String,

    #[arg(long, env = "STOCKROOM_DB_DATABASE", default_value = "inventory")]
    pub db_database: String,

    #[arg(long, env = "STOCKROOM_DB_USERNAME", default_value = "root")]
    pub db_username: String,

    #[arg(
        long,
        env = "STOCKROOM_DB_PASSWORD",
        default_value = "root",
        hide_env_values = true
    )]
    pub db_password: String,

    /// Password for the `admin` account created on first start.
    #[arg(
        long,
        env = "STOCKROOM_ADMIN_PASSWORD",
        default_value = DEFAULT_ADMIN_PASSWORD,
        hide_env_values = true
    )]
    pub admin_password: String,

    /// Server-side secret prepended to passwords before hashing.
    #[arg(long, env = "STOCKROOM_PEPPER", hide_env_values = true)]
    pub pepper: Option<String>,

    #[arg(long, env = "STOCKROOM_SESSION_LIFETIME_SECS", default_value_t = 86_400)]
    pub session_lifetime_secs: u64,

    #[arg(long, env = "STOCKROOM_MIN_PASSWORD_LENGTH", default_value_t = 8)]
    pub min_password_length: usize,

    /// Items below this quantity count as low stock on the dashboard.
    #[arg(long, env = "STOCKROOM_LOW_STOCK_THRESHOLD", default_value_t = 5)]
    pub low_stock_threshold: i64,

    /// Allow anonymous self-registration as an operator.
    #[arg(
        long,
        env = "STOCKROOM_ALLOW_REGISTRATION",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub allow_registration: bool,

    /// Mark cookies `Secure` (serve behind TLS).
    #[arg(long, env = "STOCKROOM_SECURE_COOKIES", default_value_t = false)]
    pub secure_cookies: bool,

    #[arg(long, env = "STOCKROOM_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            pepper: self.pepper.clone().filter(|p| !p.is_empty()),
            session_lifetime_secs: self.session_lifetime_secs,
            min_password_length: self.min_password_length,
        }
    }

    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            low_stock_threshold: self.low_stock_threshold,
            allow_registration: self.allow_registration,
            secure_cookies: self.secure_cookies,
            session_lifetime_secs: self.session_lifetime_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::try_parse_from(["stockroom"]).unwrap();
        assert_eq!(config.bind.to_string(), "127.0.0.1:5000");
        assert_eq!(config.db_url, "mem://");
        assert_eq!(config.admin_password, DEFAULT_ADMIN_PASSWORD);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.allow_registration);
        assert!(!config.secure_cookies);

        let auth = config.auth_config();
        assert_eq!(auth.session_lifetime_secs, 86_400);
        assert_eq!(auth.min_password_length, 8);
        assert!(auth.pepper.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "stockroom",
            "--bind",
            "0.0.0.0:8080",
            "--db-url",
            "ws://db:8000",
            "--allow-registration",
            "false",
            "--low-stock-threshold",
            "2",
            "--log-format",
            "pretty",
            "--pepper",
            "s3cret",
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.db_config().url, "ws://db:8000");
        assert!(!config.app_settings().allow_registration);
        assert_eq!(config.app_settings().low_stock_threshold, 2);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.auth_config().pepper.as_deref(), Some("s3cret"));
    }
}
