// config.rs
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use clap::Parser;
use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};
use sqlx::sqlite::SqliteConnectOptions;

use crate::libs::database::DatabaseTarget;

/// The relay always listens here.
pub const LISTEN_PORT: u16 = 8080;

pub fn listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, LISTEN_PORT))
}

/// Database settings, read from flags or the environment (`.env` included).
#[derive(Debug, Clone, Parser)]
#[command(name = "patient-relay", version, about)]
pub struct RelayConfig {
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 3306)]
    pub db_port: u16,

    #[arg(long, env = "DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub db_password: String,

    #[arg(long, env = "DB_NAME", default_value = "patients")]
    pub db_name: String,

    /// disabled, preferred, required, verify-ca or verify-identity
    #[arg(long, env = "DB_SSL_MODE", default_value = "preferred", value_parser = parse_ssl_mode)]
    pub db_ssl_mode: MySqlSslMode,

    /// Full connection URL; overrides the individual DB_* settings.
    /// `sqlite:` URLs select the SQLite backend.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,
}

fn parse_ssl_mode(s: &str) -> Result<MySqlSslMode, String> {
    MySqlSslMode::from_str(s).map_err(|e| e.to_string())
}

impl RelayConfig {
    fn server_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .ssl_mode(self.db_ssl_mode);
        if !self.db_password.is_empty() {
            options = options.password(&self.db_password);
        }
        options
    }

    /// Resolve the settings into a concrete backend.
    pub fn target(&self) -> Result<DatabaseTarget, sqlx::Error> {
        match self.database_url.as_deref() {
            Some(url) if url.starts_with("sqlite:") => {
                Ok(DatabaseTarget::Sqlite(SqliteConnectOptions::from_str(url)?))
            }
            Some(url) => Ok(DatabaseTarget::MySql {
                options: MySqlConnectOptions::from_str(url)?,
                bootstrap: None,
            }),
            None => {
                let server = self.server_options();
                Ok(DatabaseTarget::MySql {
                    options: server.clone().database(&self.db_name),
                    bootstrap: Some((server, self.db_name.clone())),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RelayConfig {
        RelayConfig::try_parse_from(std::iter::once("patient-relay").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn listens_on_fixed_port() {
        assert_eq!(listen_addr().port(), 8080);
    }

    #[test]
    fn individual_settings_build_mysql_target() {
        // Built directly so a DATABASE_URL in the test environment cannot interfere.
        let config = RelayConfig {
            db_host: "db.internal".into(),
            db_port: 3307,
            db_user: "relay".into(),
            db_password: String::new(),
            db_name: "clinic".into(),
            db_ssl_mode: MySqlSslMode::Required,
            database_url: None,
            max_connections: 4,
        };
        match config.target().unwrap() {
            DatabaseTarget::MySql { options, bootstrap } => {
                assert_eq!(options.get_host(), "db.internal");
                assert_eq!(options.get_port(), 3307);
                assert_eq!(options.get_username(), "relay");
                assert_eq!(options.get_database(), Some("clinic"));
                let (server, name) = bootstrap.unwrap();
                assert_eq!(server.get_database(), None);
                assert_eq!(name, "clinic");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sqlite_url_selects_sqlite() {
        let config = parse(&["--database-url", "sqlite::memory:"]);
        assert!(matches!(config.target().unwrap(), DatabaseTarget::Sqlite(_)));
    }

    #[test]
    fn mysql_url_skips_database_creation() {
        let config = parse(&["--database-url", "mysql://u:p@localhost:3306/clinic"]);
        match config.target().unwrap() {
            DatabaseTarget::MySql { options, bootstrap } => {
                assert_eq!(options.get_database(), Some("clinic"));
                assert!(bootstrap.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_ssl_mode() {
        let result = RelayConfig::try_parse_from(["patient-relay", "--db-ssl-mode", "sometimes"]);
        assert!(result.is_err());
    }
}
