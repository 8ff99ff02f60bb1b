//! Application configuration loaded from environment variables.

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8080`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: full PostgreSQL URL, or the discrete `DB_HOST`,
///   `DB_PORT` (5432), `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_SSLMODE` (disable)
/// - `DB_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `RUN_MIGRATIONS`: apply migrations on startup (default: `true`)
///
/// With neither `DATABASE_URL` nor `DB_HOST` set, `database` is `None` and the
/// server runs on the in-memory store.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database: Option<DatabaseConfig>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            database: database_from_lookup(&lookup),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn database_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Option<DatabaseConfig> {
    let url = match lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
        Some(url) => url,
        None => {
            let host = lookup("DB_HOST").filter(|h| !h.is_empty())?;
            let port = lookup("DB_PORT").unwrap_or_else(|| "5432".to_string());
            let user = lookup("DB_USER").unwrap_or_else(|| "postgres".to_string());
            let password = lookup("DB_PASSWORD").unwrap_or_default();
            let name = lookup("DB_NAME").unwrap_or_else(|| "postgres".to_string());
            let sslmode = lookup("DB_SSLMODE").unwrap_or_else(|| "disable".to_string());
            format!("postgres://{user}:{password}@{host}:{port}/{name}?sslmode={sslmode}")
        }
    };

    Some(DatabaseConfig {
        url,
        max_connections: lookup("DB_MAX_CONNECTIONS")
            .and_then(|n| n.parse().ok())
            .unwrap_or(10),
        run_migrations: lookup("RUN_MIGRATIONS")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.database.is_none());
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert!(config.database.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = config_from(&[("HOST", "127.0.0.1"), ("PORT", "3000")]);
        assert_eq!(config.addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = config_from(&[("PORT", "eighty")]);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_json_log_format() {
        assert_eq!(
            config_from(&[("LOG_FORMAT", "JSON")]).log_format,
            LogFormat::Json
        );
        assert_eq!(
            config_from(&[("LOG_FORMAT", "text")]).log_format,
            LogFormat::Pretty
        );
    }

    #[test]
    fn test_database_url_wins() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://app:secret@db/shop"),
            ("DB_HOST", "ignored"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("RUN_MIGRATIONS", "false"),
        ]);
        let db = config.database.unwrap();
        assert_eq!(db.url, "postgres://app:secret@db/shop");
        assert_eq!(db.max_connections, 4);
        assert!(!db.run_migrations);
    }

    #[test]
    fn test_discrete_database_settings() {
        let config = config_from(&[
            ("DB_HOST", "localhost"),
            ("DB_USER", "kurai"),
            ("DB_PASSWORD", "pw"),
            ("DB_NAME", "shop"),
        ]);
        let db = config.database.unwrap();
        assert_eq!(
            db.url,
            "postgres://kurai:pw@localhost:5432/shop?sslmode=disable"
        );
        assert_eq!(db.max_connections, 10);
        assert!(db.run_migrations);
    }
}
