//! Runtime configuration, read once at startup

use serde::Deserialize;

const ENV_PREFIX: &str = "GUESTLIST";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Value sent as `Access-Control-Allow-Origin`
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. Without one the process runs on the in-memory store.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// Owner credentials seeded at startup. Empty means "do not seed".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub groom_code: String,
    #[serde(default)]
    pub bride_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_true")]
    pub require_family_group: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            app_env: default_app_env(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_seconds: default_acquire_timeout(),
            run_migrations: true,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            require_family_group: true,
        }
    }
}

impl Config {
    /// Load from `.env` (if present) and `GUESTLIST__*` environment variables.
    ///
    /// Example: `GUESTLIST__DATABASE__URL` sets `database.url`.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::from_env(environment())?;

        // Plain DATABASE_URL is honoured when no prefixed override is set
        if config.database.url.is_none() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                config.database.url = Some(url);
            }
        }

        Ok(config)
    }

    fn from_env(env: config::Environment) -> anyhow::Result<Self> {
        let mut config: Self = config::Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()?;

        if config.database.url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            config.database.url = None;
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.server.app_env.eq_ignore_ascii_case("production")
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Config {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        Config::from_env(environment().source(Some(source))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_vars(&[]);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origin, "http://localhost:5173");
        assert!(!config.is_production());
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.run_migrations);
        assert!(config.bootstrap.groom_code.is_empty());
        assert!(config.import.require_family_group);
    }

    #[test]
    fn test_env_overrides() {
        let config = from_vars(&[
            ("GUESTLIST__SERVER__PORT", "9000"),
            ("GUESTLIST__SERVER__APP_ENV", "production"),
            ("GUESTLIST__DATABASE__URL", "postgres://localhost/wedding"),
            ("GUESTLIST__BOOTSTRAP__GROOM_CODE", "GRM01"),
            ("GUESTLIST__IMPORT__REQUIRE_FAMILY_GROUP", "false"),
        ]);
        assert_eq!(config.server.port, 9000);
        assert!(config.is_production());
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/wedding"));
        assert_eq!(config.bootstrap.groom_code, "GRM01");
        assert!(!config.import.require_family_group);
    }

    #[test]
    fn test_numeric_looking_codes_stay_strings() {
        let config = from_vars(&[
            ("GUESTLIST__BOOTSTRAP__GROOM_CODE", "01234"),
            ("GUESTLIST__BOOTSTRAP__BRIDE_CODE", "1E100"),
        ]);
        assert_eq!(config.bootstrap.groom_code, "01234");
        assert_eq!(config.bootstrap.bride_code, "1E100");
    }

    #[test]
    fn test_blank_database_url_is_absent() {
        let config = from_vars(&[("GUESTLIST__DATABASE__URL", "  ")]);
        assert!(config.database.url.is_none());
    }
}
