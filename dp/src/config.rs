//! docplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main docplan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Oracle classifier limits
    pub oracle: OracleConfig,

    /// Plan synthesis options
    pub planner: PlannerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Context file lookup
    pub context: ContextConfig,

    /// Outline artifact output
    pub artifacts: ArtifactsConfig,

    /// Log level when not given on the command line
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .docplan.yml
        let local_config = PathBuf::from(".docplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/docplan/docplan.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("docplan").join("docplan.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only `log-level`, before logging is initialized
    ///
    /// Errors are swallowed here; `load` reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".docplan.yml")];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("docplan").join("docplan.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .filter(|path| path.exists())
            .find_map(|path| fs::read_to_string(path).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    /// Directory searched for `.pmt` prompt overrides
    pub fn prompts_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docplan").join("prompts"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "anthropic" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.api_key_env
            )),
        }
    }

    /// Whether an API key is available, i.e. the oracle can be used
    pub fn has_api_key(&self) -> bool {
        self.get_api_key().is_ok()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 1024,
            timeout_ms: 30_000,
        }
    }
}

/// Oracle classifier limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Per-call deadline in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Simultaneous oracle calls allowed
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Reply budget; the reply is a single `type|confidence` line
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_concurrent: 5,
            max_tokens: 32,
        }
    }
}

/// Plan synthesis options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Ask the oracle to review section lists
    pub enhance: bool,

    /// Deadline for the enhancer call in milliseconds
    #[serde(rename = "enhance-timeout-ms")]
    pub enhance_timeout_ms: u64,
}

impl PlannerConfig {
    pub fn enhance_timeout(&self) -> Duration {
        Duration::from_millis(self.enhance_timeout_ms)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enhance: true,
            enhance_timeout_ms: 8_000,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the plan store
    #[serde(rename = "store-dir")]
    pub store_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/docplan/plans on Linux)
        let store_dir = dirs::data_dir()
            .map(|d| d.join("docplan").join("plans"))
            .unwrap_or_else(|| PathBuf::from(".docplan/plans"));

        Self { store_dir }
    }
}

/// Where per-entity context files live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub dir: PathBuf,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("context"),
        }
    }
}

/// Where generated outlines are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.oracle.timeout(), Duration::from_millis(5_000));
        assert_eq!(config.oracle.max_concurrent, 5);
        assert!(config.planner.enhance);
        assert!(config.storage.store_dir.ends_with("plans"));
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
oracle:
  timeout-ms: 1500
planner:
  enhance: false
log-level: debug
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.oracle.timeout_ms, 1500);
        assert_eq!(config.oracle.max_concurrent, 5);
        assert!(!config.planner.enhance);
        assert_eq!(config.planner.enhance_timeout_ms, 8_000);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "context:\n  dir: /srv/context\nartifacts:\n  dir: /srv/out").unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.context.dir, PathBuf::from("/srv/context"));
        assert_eq!(config.artifacts.dir, PathBuf::from("/srv/out"));
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let missing = PathBuf::from("/nonexistent/docplan.yml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_log_level() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log-level: trace").unwrap();
        assert_eq!(
            Config::load_log_level(Some(&file.path().to_path_buf())).as_deref(),
            Some("trace")
        );

        let missing = PathBuf::from("/nonexistent/docplan.yml");
        assert!(Config::load_log_level(Some(&missing)).is_none());
    }

    #[test]
    fn test_missing_api_key_env() {
        let config = LlmConfig {
            api_key_env: "DOCPLAN_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(!config.has_api_key());
        assert!(config.get_api_key().is_err());
    }
}
