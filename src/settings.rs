//! Launcher settings.
//!
//! This module defines the `Settings` struct that represents `crewflow.yaml`
//! in the launcher home. Every field is optional; unknown fields are ignored
//! for forward compatibility and values are validated after parsing.

use crate::error::{CrewError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the settings document inside the launcher home.
pub const SETTINGS_FILE: &str = "crewflow.yaml";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Settings for the command-driven execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Command template run once per task; the prompt is written to stdin.
    pub command: String,

    /// Seconds before a task's command is killed.
    pub timeout_seconds: u64,

    /// Extra environment variables for every command.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            timeout_seconds: default_timeout_seconds(),
            environment: BTreeMap::new(),
        }
    }
}

/// Logging settings; `CREWFLOW_LOG` and `-v`/`-q` take precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Contents of `crewflow.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one subdirectory per flow (relative to home).
    pub config_root: PathBuf,

    /// Directory receiving reports and event logs (relative to home).
    pub output_root: PathBuf,

    /// Input name bound to the operator's free text.
    pub input_key: String,

    /// Text used when the operator enters nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_input: Option<String>,

    /// Model used by agents that declare none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Provider id -> credential environment variable. Replaces the built-in
    /// map entirely when present.
    pub providers: BTreeMap<String, String>,

    pub engine: EngineSettings,

    pub logging: LoggingSettings,
}

fn default_config_root() -> PathBuf {
    PathBuf::from("config")
}
fn default_output_root() -> PathBuf {
    PathBuf::from("outputs")
}
fn default_input_key() -> String {
    "business_description".to_string()
}
fn default_model() -> Option<String> {
    Some("openai/gpt-4o-mini".to_string())
}
fn default_engine_command() -> String {
    "llm -m {model}".to_string()
}
fn default_timeout_seconds() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Built-in provider routes.
pub fn default_providers() -> BTreeMap<String, String> {
    [
        ("gemini", "GEMINI_API_KEY"),
        ("groq", "GROQ_API_KEY"),
        ("deepseek", "DEEPSEEK_API_KEY"),
        ("openai", "OPENAI_API_KEY"),
    ]
    .into_iter()
    .map(|(provider, variable)| (provider.to_string(), variable.to_string()))
    .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_root: default_config_root(),
            output_root: default_output_root(),
            input_key: default_input_key(),
            fallback_input: None,
            default_model: default_model(),
            providers: default_providers(),
            engine: EngineSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CrewError::io("failed to read settings file", path, e))?;
        Self::from_yaml(&content).map_err(|e| match e {
            CrewError::Config(msg) => {
                CrewError::Config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Settings file to load: `explicit` if given, else `<home>/crewflow.yaml`
    /// when it exists. `None` means defaults apply.
    pub fn locate(explicit: Option<&Path>, home: &Path) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(home.join(SETTINGS_FILE)).filter(|path| path.is_file()),
        }
    }

    /// Load the file chosen by [`Settings::locate`], or return defaults.
    pub fn load_located(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse settings from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Option<Settings> = serde_yaml::from_str(yaml)
            .map_err(|e| CrewError::Config(format!("failed to parse settings YAML: {}", e)))?;
        let settings = settings.unwrap_or_default();
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings values.
    ///
    /// Validation rules:
    /// - `engine.command` must be non-empty
    /// - `engine.timeout_seconds` must be positive
    /// - `input_key` must be non-empty and contain no braces
    pub fn validate(&self) -> Result<()> {
        if self.engine.command.trim().is_empty() {
            return Err(CrewError::Config(
                "settings validation failed: engine.command must not be empty".to_string(),
            ));
        }

        if self.engine.timeout_seconds == 0 {
            return Err(CrewError::Config(
                "settings validation failed: engine.timeout_seconds must be greater than 0"
                    .to_string(),
            ));
        }

        let key = self.input_key.trim();
        if key.is_empty() || key.contains(['{', '}']) {
            return Err(CrewError::Config(format!(
                "settings validation failed: input_key '{}' must be a bare placeholder name",
                self.input_key
            )));
        }

        Ok(())
    }

    /// Absolute or home-relative config root.
    pub fn config_root_in(&self, home: &Path) -> PathBuf {
        home.join(&self.config_root)
    }

    /// Absolute or home-relative output root.
    pub fn output_root_in(&self, home: &Path) -> PathBuf {
        home.join(&self.output_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.config_root, PathBuf::from("config"));
        assert_eq!(settings.output_root, PathBuf::from("outputs"));
        assert_eq!(settings.input_key, "business_description");
        assert!(settings.fallback_input.is_none());
        assert_eq!(settings.default_model.as_deref(), Some("openai/gpt-4o-mini"));
        assert_eq!(
            settings.providers.get("groq").map(String::as_str),
            Some("GROQ_API_KEY")
        );
        assert_eq!(settings.engine.command, "llm -m {model}");
        assert_eq!(settings.engine.timeout_seconds, 600);
        assert_eq!(settings.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
output_root: /var/reports
fallback_input: "A test concrete plant"
engine:
  timeout_seconds: 30
"#;
        let settings = Settings::from_yaml(yaml).unwrap();

        assert_eq!(settings.output_root, PathBuf::from("/var/reports"));
        assert_eq!(settings.fallback_input.as_deref(), Some("A test concrete plant"));
        assert_eq!(settings.engine.timeout_seconds, 30);
        assert_eq!(settings.engine.command, "llm -m {model}");
        assert_eq!(settings.config_root, PathBuf::from("config"));
    }

    #[test]
    fn test_providers_replace_builtin_map() {
        let yaml = "providers:\n  mistral: MISTRAL_API_KEY\n";
        let settings = Settings::from_yaml(yaml).unwrap();

        assert_eq!(settings.providers.len(), 1);
        assert_eq!(
            settings.providers.get("mistral").map(String::as_str),
            Some("MISTRAL_API_KEY")
        );
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let yaml = "input_key: brief\nfuture_feature: true\n";
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.input_key, "brief");
    }

    #[test]
    fn test_json_log_format() {
        let settings = Settings::from_yaml("logging:\n  format: json\n").unwrap();
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        let err = Settings::from_yaml("logging:\n  format: xml\n").unwrap_err();
        assert!(err.to_string().contains("failed to parse settings YAML"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = Settings::from_yaml("engine:\n  timeout_seconds: 0\n").unwrap_err();
        assert!(err.to_string().contains("timeout_seconds must be greater than 0"));
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = Settings::from_yaml("engine:\n  command: \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("engine.command"));
    }

    #[test]
    fn test_braced_input_key_rejected() {
        let err = Settings::from_yaml("input_key: \"{brief}\"\n").unwrap_err();
        assert!(err.to_string().contains("bare placeholder name"));
    }

    #[test]
    fn test_paths_relative_to_home() {
        let settings = Settings::default();
        let home = Path::new("/srv/agency");

        assert_eq!(settings.config_root_in(home), PathBuf::from("/srv/agency/config"));
        assert_eq!(settings.output_root_in(home), PathBuf::from("/srv/agency/outputs"));
    }

    #[test]
    fn test_missing_home_settings_use_defaults() {
        let temp = tempfile::TempDir::new().unwrap();

        let located = Settings::locate(None, temp.path());
        assert_eq!(located, None);
        assert_eq!(Settings::load_located(None).unwrap(), Settings::default());
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join(SETTINGS_FILE), "input_key: brief\n").unwrap();
        let explicit = temp.path().join("other.yaml");

        assert_eq!(
            Settings::locate(None, temp.path()),
            Some(temp.path().join(SETTINGS_FILE))
        );
        assert_eq!(
            Settings::locate(Some(explicit.as_path()), temp.path()),
            Some(explicit.clone())
        );
        assert!(Settings::load_located(Some(explicit.as_path())).is_err());
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "input_key: brief").unwrap();
        writeln!(file, "default_model: groq/llama-3.1-70b").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.input_key, "brief");
        assert_eq!(settings.default_model.as_deref(), Some("groq/llama-3.1-70b"));
    }
}
