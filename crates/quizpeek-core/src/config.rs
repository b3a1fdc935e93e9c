use crate::errors::CoreError;
use crate::request::OPENROUTER_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables that override `[api] key`, in lookup order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["QUIZPEEK_API_KEY", "OPENROUTER_API_KEY"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub save_key: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    #[serde(default)]
    pub enable_reasoning: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

/// Read by the screen-capture side; carried here so one file holds all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_hotkey")]
    pub hotkey: String,
    #[serde(default = "default_top_crop_pct")]
    pub top_crop_pct: u32,
    #[serde(default = "default_bottom_crop_pct")]
    pub bottom_crop_pct: u32,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default)]
    pub bypass_confidence: bool,
    #[serde(default)]
    pub show_notifications: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            save_key: false,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            enable_reasoning: false,
            endpoint: default_endpoint(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            hotkey: default_hotkey(),
            top_crop_pct: default_top_crop_pct(),
            bottom_crop_pct: default_bottom_crop_pct(),
            max_width: default_max_width(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            bypass_confidence: false,
            show_notifications: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
        }
    }
}

fn default_model() -> String {
    "meta-llama/llama-3.2-90b-vision-instruct".to_string()
}
fn default_timeout_secs() -> f64 {
    2.0
}
fn default_endpoint() -> String {
    OPENROUTER_ENDPOINT.to_string()
}
fn default_hotkey() -> String {
    "ctrl".to_string()
}
fn default_top_crop_pct() -> u32 {
    8
}
fn default_bottom_crop_pct() -> u32 {
    6
}
fn default_max_width() -> u32 {
    1024
}
fn default_confidence_threshold() -> f64 {
    0.7
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load config from the given path, or return defaults if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| CoreError::Io(format!("reading config: {e}")))?;
            let config: Config =
                toml::from_str(&contents).map_err(|e| CoreError::Config(e.to_string()))?;

            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Write config to the given path. The API key is only persisted when
    /// `save_key` is set.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let mut to_write = self.clone();
        if !to_write.api.save_key {
            to_write.api.key.clear();
        }

        let contents =
            toml::to_string_pretty(&to_write).map_err(|e| CoreError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::Io(format!("creating config dir: {e}")))?;
        }
        std::fs::write(path, contents)
            .map_err(|e| CoreError::Io(format!("writing config: {e}")))?;
        Ok(())
    }

    /// The API key to use: environment first, then the config file.
    pub fn api_key(&self) -> String {
        self.resolve_key(|var| std::env::var(var).ok())
    }

    /// Key lookup over an arbitrary environment: the first non-blank
    /// `API_KEY_ENV_VARS` entry, else `[api] key`.
    pub fn resolve_key(&self, env: impl Fn(&str) -> Option<String>) -> String {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|&var| env(var))
            .find(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.api.key.clone())
    }
}

/// Get the quizpeek data directory, following each platform's convention.
pub fn quizpeek_dir() -> PathBuf {
    let home = || PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()));
    if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("QuizPeek")
    } else if cfg!(target_os = "macos") {
        home().join("Library/Application Support/QuizPeek")
    } else {
        home().join(".config/quizpeek")
    }
}

pub fn config_path() -> PathBuf {
    quizpeek_dir().join("config.toml")
}

pub fn log_path() -> PathBuf {
    quizpeek_dir().join("quizpeek.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.model, "meta-llama/llama-3.2-90b-vision-instruct");
        assert_eq!(config.api.timeout_secs, 2.0);
        assert_eq!(config.api.endpoint, OPENROUTER_ENDPOINT);
        assert!(!config.api.save_key);
        assert_eq!(config.capture.top_crop_pct, 8);
        assert_eq!(config.capture.bottom_crop_pct, 6);
        assert_eq!(config.capture.max_width, 1024);
        assert_eq!(config.display.confidence_threshold, 0.7);
        assert!(!config.display.bypass_confidence);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_deserialize() {
        // Config with only some fields should fill defaults for the rest
        let toml_str = r#"
[api]
model = "openai/gpt-4o"

[display]
bypass_confidence = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.model, "openai/gpt-4o");
        assert_eq!(config.api.timeout_secs, 2.0); // default
        assert!(config.display.bypass_confidence);
        assert_eq!(config.display.confidence_threshold, 0.7); // default
        assert_eq!(config.capture.hotkey, "ctrl"); // section absent
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.capture.max_width, 1024);
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nmodel = ").unwrap();
        assert!(matches!(Config::load(&path), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_save_drops_key_unless_save_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.api.key = "sk-secret".to_string();
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap().api.key, "");

        config.api.save_key = true;
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.api.key, "sk-secret");
        assert!(loaded.api.save_key);
    }

    #[test]
    fn test_env_key_overrides_file_key() {
        let mut config = Config::default();
        config.api.key = "sk-file".to_string();

        fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
            move |var| {
                pairs
                    .iter()
                    .find(|(k, _)| *k == var)
                    .map(|(_, v)| v.to_string())
            }
        }

        assert_eq!(config.resolve_key(env(&[])), "sk-file");
        assert_eq!(
            config.resolve_key(env(&[("OPENROUTER_API_KEY", "sk-openrouter")])),
            "sk-openrouter"
        );
        assert_eq!(
            config.resolve_key(env(&[
                ("OPENROUTER_API_KEY", "sk-openrouter"),
                ("QUIZPEEK_API_KEY", "sk-quizpeek"),
            ])),
            "sk-quizpeek"
        );
        // Blank values are skipped.
        assert_eq!(
            config.resolve_key(env(&[
                ("QUIZPEEK_API_KEY", "  "),
                ("OPENROUTER_API_KEY", "sk-openrouter"),
            ])),
            "sk-openrouter"
        );
        assert_eq!(config.resolve_key(env(&[("QUIZPEEK_API_KEY", "")])), "sk-file");
    }

    #[test]
    fn test_paths_live_in_quizpeek_dir() {
        assert_eq!(config_path().parent(), Some(quizpeek_dir().as_path()));
        assert!(log_path().ends_with("quizpeek.log"));
    }
}
