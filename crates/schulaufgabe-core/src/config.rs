use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TECTONIC_PATH: &str = "/usr/local/bin/tectonic";
pub const DEFAULT_PROMPT_PATH: &str = "assets/gemini_system_prompt.txt";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Root configuration, assembled from defaults, an optional TOML file and the
/// environment.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub inference: InferenceConfig,
    pub compiler: CompilerConfig,
    pub metrics: MetricsConfig,
    /// Replaces both external collaborators with fixed mock outputs.
    pub test_mode: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "https://schulaufgabe-frontend.onrender.com".to_string(),
            ],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_json: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Parent of the namespaced scratch root. `None` means the OS temp dir.
    pub temp_root: Option<PathBuf>,
    /// Age after which a session directory is swept. 0 disables sweeping.
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_root: None,
            session_ttl_secs: 24 * 60 * 60,
            sweep_interval_secs: 15 * 60,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    /// Gemini API key. Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub prompt_path: PathBuf,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            prompt_path: PathBuf::from(DEFAULT_PROMPT_PATH),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CompilerConfig {
    pub binary: PathBuf,
    /// Maximum number of compilations running at once.
    pub workers: usize,
    /// 0 disables the timeout.
    pub timeout_secs: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_TECTONIC_PATH),
            workers: 2,
            timeout_secs: 120,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl MetricsConfig {
    /// Returns the configured credentials when both halves are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some((user, pass))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.compiler.workers, 2);
        assert_eq!(config.inference.model, DEFAULT_GEMINI_MODEL);
        assert!(!config.test_mode);
        assert!(config.metrics.credentials().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            test_mode = true

            [compiler]
            workers = 4
            "#,
        )
        .unwrap();
        assert!(config.test_mode);
        assert_eq!(config.compiler.workers, 4);
        assert_eq!(config.compiler.timeout_secs, 120);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_credentials_require_both_parts() {
        let mut metrics = MetricsConfig {
            username: Some("prom".to_string()),
            password: Some(String::new()),
        };
        assert!(metrics.credentials().is_none());
        metrics.password = Some("secret".to_string());
        assert_eq!(metrics.credentials(), Some(("prom", "secret")));
    }
}
