use std::time::Duration;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Loaded once at startup from the process environment (and a `.env` file
// when present). Every knob has a default except the database URL.
//
// ============================================================================

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Environment variable {0} is empty")]
    EmptyValue(String),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("Unsupported database URL scheme: {0:?} (expected postgres:// or sqlite:)")]
    UnsupportedDatabase(String),
}

/// Relational backends the store knows how to bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    /// Detect the backend from a connection URL.
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            Err(ConfigError::UnsupportedDatabase(scheme.to_string()))
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Database connection settings.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub backend: Backend,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Upper bound for a single service operation, transaction included.
    pub statement_timeout: Duration,
    /// Connection attempts at startup before giving up.
    pub connect_attempts: u32,
    pub auto_create_schema: bool,
}

impl DatabaseSettings {
    /// Settings for a URL with every other knob at its default.
    pub fn for_url(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let backend = Backend::from_url(&url)?;
        Ok(Self {
            url,
            backend,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_millis(5000),
            connect_attempts: 5,
            auto_create_schema: true,
        })
    }
}

// The URL may carry credentials.
impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &"[REDACTED]")
            .field("backend", &self.backend)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .field("connect_attempts", &self.connect_attempts)
            .field("auto_create_schema", &self.auto_create_schema)
            .finish()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
}

impl AppConfig {
    /// Build configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;
        if url.trim().is_empty() {
            return Err(ConfigError::EmptyValue("DATABASE_URL".to_string()));
        }

        let mut database = DatabaseSettings::for_url(url.trim())?;
        database.max_connections =
            parse_or("DB_MAX_CONNECTIONS", &lookup, database.max_connections)?;
        database.acquire_timeout = Duration::from_secs(parse_or(
            "DB_ACQUIRE_TIMEOUT_SECS",
            &lookup,
            database.acquire_timeout.as_secs(),
        )?);
        database.statement_timeout = Duration::from_millis(parse_or(
            "DB_STATEMENT_TIMEOUT_MS",
            &lookup,
            database.statement_timeout.as_millis() as u64,
        )?);
        database.connect_attempts =
            parse_or("DB_CONNECT_ATTEMPTS", &lookup, database.connect_attempts)?.max(1);
        database.auto_create_schema =
            parse_or("AUTO_CREATE_SCHEMA", &lookup, database.auto_create_schema)?;

        let defaults = ServerSettings::default();
        let server = ServerSettings {
            host: lookup("ORDER_SERVICE_HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parse_or("ORDER_SERVICE_PORT", &lookup, defaults.port)?,
        };

        Ok(Self { server, database })
    }
}

fn parse_or<T, F>(name: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/orders")]))
                .unwrap();

        assert_eq!(config.database.backend, Backend::Postgres);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.statement_timeout, Duration::from_millis(5000));
        assert!(config.database.auto_create_schema);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_overrides_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("ORDER_SERVICE_PORT", "9000"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("DB_STATEMENT_TIMEOUT_MS", "250"),
            ("AUTO_CREATE_SCHEMA", "false"),
        ]))
        .unwrap();

        assert_eq!(config.database.backend, Backend::Sqlite);
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.database.statement_timeout, Duration::from_millis(250));
        assert!(!config.database.auto_create_schema);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_missing_database_url() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "DATABASE_URL"));
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "mysql://root@127.0.0.1:3306/orders_by",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedDatabase(ref s) if s == "mysql"));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("ORDER_SERVICE_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref name, .. } if name == "ORDER_SERVICE_PORT"
        ));
    }

    #[test]
    fn test_debug_redacts_url() {
        let settings = DatabaseSettings::for_url("postgres://user:secret@db/orders").unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("secret"));
    }
}
