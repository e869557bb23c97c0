//! Configuration loading.
//!
//! Builds an [`AppConfig`] from, in increasing priority:
//! 1. built-in defaults,
//! 2. an optional TOML file named by `SCHULAUFGABE_CONFIG`,
//! 3. individual environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use schulaufgabe_core::config::AppConfig;

/// Environment variable naming the optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "SCHULAUFGABE_CONFIG";

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigLoadError {
    /// File I/O error.
    IoError { path: PathBuf, source: std::io::Error },
    /// TOML parsing error.
    ParseError(toml::de::Error),
    /// An environment variable held a value of the wrong type.
    InvalidValue { name: String, value: String },
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::IoError { path, source } => {
                write!(f, "Failed to read config file {}: {}", path.display(), source)
            }
            ConfigLoadError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigLoadError::InvalidValue { name, value } => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigLoadError {}

impl From<toml::de::Error> for ConfigLoadError {
    fn from(e: toml::de::Error) -> Self {
        ConfigLoadError::ParseError(e)
    }
}

/// Loads [`AppConfig`] from a TOML file and an environment lookup.
///
/// The lookup is injectable so tests never mutate the process environment.
pub struct ConfigLoader<F>
where
    F: Fn(&str) -> Option<String>,
{
    lookup: F,
}

impl ConfigLoader<fn(&str) -> Option<String>> {
    /// Creates a loader that reads the real process environment.
    pub fn from_process_env() -> Self {
        fn process_env(name: &str) -> Option<String> {
            std::env::var(name).ok()
        }
        Self {
            lookup: process_env,
        }
    }
}

impl<F> ConfigLoader<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Fails if the named config file cannot be read or parsed, or an override
    /// variable cannot be parsed. Unset variables are never an error.
    pub fn load(&self) -> Result<AppConfig, ConfigLoadError> {
        let mut config = match self.var(CONFIG_PATH_ENV) {
            Some(path) => Self::load_file(Path::new(&path))?,
            None => AppConfig::default(),
        };
        self.apply_env(&mut config)?;
        Ok(config)
    }

    /// Parses a TOML config file. Missing keys keep their defaults.
    pub fn load_file(path: &Path) -> Result<AppConfig, ConfigLoadError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigLoadError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env(&self, config: &mut AppConfig) -> Result<(), ConfigLoadError> {
        // Server
        if let Some(bind) = self.var("SCHULAUFGABE_BIND") {
            config.server.bind = bind;
        }
        if let Some(origins) = self.var("SCHULAUFGABE_CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(max) = self.parsed::<usize>("SCHULAUFGABE_MAX_UPLOAD_BYTES")? {
            config.server.max_upload_bytes = max;
        }
        if let Some(json) = self.flag("SCHULAUFGABE_LOG_JSON")? {
            config.server.log_json = json;
        }

        // Storage
        if let Some(root) = self.var("SCHULAUFGABE_TEMP_ROOT") {
            config.storage.temp_root = Some(PathBuf::from(root));
        }
        if let Some(ttl) = self.parsed::<u64>("SCHULAUFGABE_SESSION_TTL_SECS")? {
            config.storage.session_ttl_secs = ttl;
        }
        if let Some(interval) = self.parsed::<u64>("SCHULAUFGABE_SWEEP_INTERVAL_SECS")? {
            config.storage.sweep_interval_secs = interval;
        }

        // Inference
        if let Some(key) = self.var("GOOGLE_API_KEY") {
            config.inference.api_key = Some(key);
        }
        if let Some(model) = self.var("GEMINI_MODEL") {
            config.inference.model = model;
        }
        if let Some(prompt) = self.var("SCHULAUFGABE_PROMPT_PATH") {
            config.inference.prompt_path = PathBuf::from(prompt);
        }

        // Compiler
        if let Some(binary) = self.var("TECTONIC_PATH") {
            config.compiler.binary = PathBuf::from(binary);
        }
        if let Some(workers) = self.parsed::<usize>("SCHULAUFGABE_COMPILE_WORKERS")? {
            config.compiler.workers = workers.max(1);
        }
        if let Some(timeout) = self.parsed::<u64>("SCHULAUFGABE_COMPILE_TIMEOUT_SECS")? {
            config.compiler.timeout_secs = timeout;
        }

        // Metrics
        if let Some(user) = self.var("METRICS_USERNAME") {
            config.metrics.username = Some(user);
        }
        if let Some(pass) = self.var("METRICS_PASSWORD") {
            config.metrics.password = Some(pass);
        }

        if let Some(test_mode) = self.flag("TEST_MODE")? {
            config.test_mode = test_mode;
        }

        Ok(())
    }

    /// Returns a non-empty, trimmed variable.
    fn var(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, ConfigLoadError> {
        match self.var(name) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigLoadError::InvalidValue {
                    name: name.to_string(),
                    value,
                }),
        }
    }

    fn flag(&self, name: &str) -> Result<Option<bool>, ConfigLoadError> {
        match self.var(name) {
            None => Ok(None),
            Some(value) => match value.as_str() {
                "1" | "true" | "TRUE" | "yes" | "YES" => Ok(Some(true)),
                "0" | "false" | "FALSE" | "no" | "NO" => Ok(Some(false)),
                _ => Err(ConfigLoadError::InvalidValue {
                    name: name.to_string(),
                    value,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn loader(vars: &[(&str, &str)]) -> ConfigLoader<impl Fn(&str) -> Option<String>> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigLoader::with_lookup(move |name| map.get(name).cloned())
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = loader(&[]).load().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = loader(&[
            ("GOOGLE_API_KEY", "key-123"),
            ("TEST_MODE", "1"),
            ("SCHULAUFGABE_COMPILE_WORKERS", "4"),
            ("SCHULAUFGABE_CORS_ORIGINS", "http://a.example, http://b.example,"),
            ("METRICS_USERNAME", "prom"),
            ("METRICS_PASSWORD", "secret"),
        ])
        .load()
        .unwrap();

        assert_eq!(config.inference.api_key.as_deref(), Some("key-123"));
        assert!(config.test_mode);
        assert_eq!(config.compiler.workers, 4);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
        assert_eq!(config.metrics.credentials(), Some(("prom", "secret")));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = loader(&[("GOOGLE_API_KEY", "   ")]).load().unwrap();
        assert!(config.inference.api_key.is_none());
    }

    #[test]
    fn test_invalid_number_is_error() {
        let err = loader(&[("SCHULAUFGABE_COMPILE_WORKERS", "many")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::InvalidValue { .. }));
    }

    #[test]
    fn test_invalid_flag_is_error() {
        let err = loader(&[("TEST_MODE", "maybe")]).load().unwrap_err();
        assert!(err.to_string().contains("TEST_MODE"));
    }

    #[test]
    fn test_file_then_env_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [server]
            bind = "127.0.0.1:9000"

            [inference]
            model = "gemini-from-file"
            "#,
        )
        .unwrap();
        let path_str = path.to_string_lossy().to_string();

        let config = loader(&[
            (CONFIG_PATH_ENV, path_str.as_str()),
            ("GEMINI_MODEL", "gemini-from-env"),
        ])
        .load()
        .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.inference.model, "gemini-from-env");
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let err = loader(&[(CONFIG_PATH_ENV, "/nonexistent/schulaufgabe.toml")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::IoError { .. }));
    }
}
