//! Server configuration.
//!
//! Loaded from a TOML file (`dynapi.toml` by default). String values may reference
//! environment variables as `${VAR}`; `DATABASE_URL` and `DYNAPI_BIND` override the
//! file when set.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use dynapi::{Ident, MonitorConfig};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "dynapi.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// `tracing-subscriber` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            base_path: default_base_path(),
            log_filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: usize,
    /// Primary-key column returned by inserts.
    #[serde(default = "default_id_column")]
    pub id_column: String,
    /// Statements slower than this are logged at WARN.
    #[serde(default)]
    pub slow_query_ms: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_max_size: default_pool_max_size(),
            id_column: default_id_column(),
            slow_query_ms: None,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_base_path() -> String {
    "/api/dynamic_api".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_pool_max_size() -> usize {
    dynapi::pool::DEFAULT_POOL_SIZE
}

fn default_id_column() -> String {
    "id".to_string()
}

impl Config {
    /// Load configuration from `path`, then apply environment overrides and validate.
    ///
    /// A missing file is only an error when `required` is set; otherwise defaults are
    /// used, which lets the server run from `DATABASE_URL` alone.
    pub fn load(path: &Path, required: bool) -> anyhow::Result<Self> {
        let mut config = if path.exists() || required {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            Self::parse(&raw, env_lookup)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(env_lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML and expand `${VAR}` references through `lookup`.
    pub fn parse(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(raw)?;
        config.expand_env(&lookup)?;
        Ok(config)
    }

    fn expand_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        self.server.bind = expand_env_vars(&self.server.bind, lookup)?;
        self.server.base_path = expand_env_vars(&self.server.base_path, lookup)?;
        self.server.log_filter = expand_env_vars(&self.server.log_filter, lookup)?;
        self.database.url = expand_env_vars(&self.database.url, lookup)?;
        self.database.id_column = expand_env_vars(&self.database.id_column, lookup)?;
        Ok(())
    }

    /// Apply `DATABASE_URL` / `DYNAPI_BIND` overrides.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = url;
        }
        if let Some(bind) = lookup("DYNAPI_BIND").filter(|v| !v.trim().is_empty()) {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.trim().is_empty() {
            anyhow::bail!("database.url must not be empty (set it in the config file or DATABASE_URL)");
        }
        if self.database.pool_max_size == 0 {
            anyhow::bail!("database.pool_max_size must be greater than 0");
        }
        Ident::parse(&self.database.id_column)
            .map_err(|e| anyhow::anyhow!("database.id_column is not a valid identifier: {e}"))?;

        let base = &self.server.base_path;
        if !base.starts_with('/') {
            anyhow::bail!("server.base_path must start with '/': {base}");
        }
        if base.len() > 1 && base.ends_with('/') {
            anyhow::bail!("server.base_path must not end with '/': {base}");
        }
        if base.contains('{') || base.contains('}') {
            anyhow::bail!("server.base_path must not contain route parameters: {base}");
        }
        Ok(())
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        let config = MonitorConfig::new();
        match self.database.slow_query_ms {
            Some(ms) => config.with_slow_query_threshold(Duration::from_millis(ms)),
            None => config,
        }
    }

    /// The database URL with any password replaced by `***`, for display.
    pub fn redacted_database_url(&self) -> String {
        match url::Url::parse(&self.database.url) {
            Ok(mut parsed) if parsed.password().is_some() => {
                // Only fails for cannot-be-a-base URLs, which have no password.
                let _ = parsed.set_password(Some("***"));
                parsed.to_string()
            }
            Ok(parsed) => parsed.to_string(),
            // key=value connection strings
            Err(_) => self
                .database
                .url
                .split_whitespace()
                .map(|pair| match pair.split_once('=') {
                    Some((key, _)) if key == "password" => "password=***".to_string(),
                    _ => pair.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn expand_env_vars(
    input: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = lookup(&key)
                .ok_or_else(|| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config = Config::parse("[database]\nurl = \"postgres://localhost/app\"\n", vars(&[])).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.server.base_path, "/api/dynamic_api");
        assert_eq!(config.server.log_filter, "info");
        assert_eq!(config.database.pool_max_size, 16);
        assert_eq!(config.database.id_column, "id");
        assert_eq!(config.database.slow_query_ms, None);
        config.validate().unwrap();
    }

    #[test]
    fn expands_env_references() {
        let raw = r#"
            [database]
            url = "postgres://${DB_USER}:${DB_PASS}@db/app"
        "#;
        let config = Config::parse(raw, vars(&[("DB_USER", "svc"), ("DB_PASS", "pw")])).unwrap();
        assert_eq!(config.database.url, "postgres://svc:pw@db/app");
    }

    #[test]
    fn missing_env_reference_is_an_error() {
        let raw = "[database]\nurl = \"${NOT_SET}\"\n";
        let err = Config::parse(raw, vars(&[])).unwrap_err();
        assert!(err.to_string().contains("NOT_SET"));
    }

    #[test]
    fn unterminated_reference_is_an_error() {
        assert!(expand_env_vars("postgres://${USER", &vars(&[("USER", "x")])).is_err());
        assert!(expand_env_vars("${}", &vars(&[])).is_err());
        assert_eq!(expand_env_vars("cost: $5", &vars(&[])).unwrap(), "cost: $5");
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = Config::parse(
            "[server]\nbind = \"127.0.0.1:9000\"\n[database]\nurl = \"postgres://file/db\"\n",
            vars(&[]),
        )
        .unwrap();
        config.apply_overrides(vars(&[
            ("DATABASE_URL", "postgres://env/db"),
            ("DYNAPI_BIND", "0.0.0.0:7000"),
        ]));
        assert_eq!(config.database.url, "postgres://env/db");
        assert_eq!(config.server.bind, "0.0.0.0:7000");

        config.apply_overrides(vars(&[("DATABASE_URL", "  ")]));
        assert_eq!(config.database.url, "postgres://env/db");
    }

    #[test]
    fn validation_rules() {
        let mut config = Config::default();
        assert!(config.validate().is_err(), "empty url");

        config.database.url = "postgres://localhost/app".into();
        config.validate().unwrap();

        config.database.pool_max_size = 0;
        assert!(config.validate().is_err());
        config.database.pool_max_size = 4;

        config.database.id_column = "id; drop".into();
        assert!(config.validate().is_err());
        config.database.id_column = "user_id".into();

        for bad in ["api", "/api/", "/api/{table}"] {
            config.server.base_path = bad.into();
            assert!(config.validate().is_err(), "{bad}");
        }
        config.server.base_path = "/crud".into();
        config.validate().unwrap();
    }

    #[test]
    fn slow_query_threshold_from_millis() {
        let mut config = Config::default();
        assert_eq!(config.monitor_config().slow_query_threshold, None);
        config.database.slow_query_ms = Some(250);
        assert_eq!(
            config.monitor_config().slow_query_threshold,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn redacts_passwords() {
        let mut config = Config::default();
        config.database.url = "postgres://svc:secret@db:5432/app".into();
        let shown = config.redacted_database_url();
        assert!(!shown.contains("secret"));
        assert!(shown.contains("svc"));

        config.database.url = "host=db user=svc password=secret".into();
        assert_eq!(config.redacted_database_url(), "host=db user=svc password=***");
    }

    #[test]
    fn required_missing_file_is_an_error() {
        let path = Path::new("definitely/not/here/dynapi.toml");
        assert!(Config::load(path, true).is_err());
    }
}
