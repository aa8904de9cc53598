// Configuration loading and parsing (barvagt.toml, credentials.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::editor::SavePolicy;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub save: SaveConfig,
    pub backend: BackendConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// barvagt.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire barvagt.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AppFile {
    schedule: ScheduleConfig,
    save: SaveConfig,
    backend: BackendConfig,
}

/// How roster rows are addressed. The two modes are mutually exclusive;
/// the active one decides the key column of the persisted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleMode {
    /// A fixed grid of hour slots; rows are keyed by a unique `slot_index`.
    FixedSlots,
    /// A reorderable team list; rows are ranked by a dense `sort_order`.
    FreeOrder,
}

impl ScheduleMode {
    pub fn key_column(self) -> &'static str {
        match self {
            ScheduleMode::FixedSlots => "slot_index",
            ScheduleMode::FreeOrder => "sort_order",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub mode: ScheduleMode,
    /// Start hour of slot 0 (24h clock). Slots wrap past midnight.
    pub first_hour: u32,
    /// Number of one-hour slots in fixed-slots mode.
    pub slot_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SavePolicyKind {
    Explicit,
    Debounced,
    Immediate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveConfig {
    pub policy: SavePolicyKind,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl SaveConfig {
    pub fn save_policy(&self) -> SavePolicy {
        match self.policy {
            SavePolicyKind::Explicit => SavePolicy::Explicit,
            SavePolicyKind::Debounced => {
                SavePolicy::Debounced(Duration::from_millis(self.debounce_ms))
            }
            SavePolicyKind::Immediate => SavePolicy::Immediate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    Sqlite,
    Rest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default)]
    pub sqlite: SqliteSection,
    #[serde(default)]
    pub rest: RestSection,
}

fn default_table() -> String {
    "teams".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqliteSection {
    /// Database file path. Relative paths resolve under the per-user data
    /// directory; `":memory:"` gives an ephemeral database.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for SqliteSection {
    fn default() -> Self {
        SqliteSection {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "barvagt.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RestSection {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`.
    #[serde(default)]
    pub url: String,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/barvagt.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization
/// automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- barvagt.toml (required) ---
    let app_path = config_dir.join("barvagt.toml");
    let app_text = read_file(&app_path)?;
    let app_file: AppFile = toml::from_str(&app_text).map_err(|e| ConfigError::ParseError {
        path: app_path.clone(),
        source: e,
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        schedule: app_file.schedule,
        save: app_file.save,
        backend: app_file.backend,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Load configuration from the current directory, copying any missing
/// config files from `defaults/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let base_dir = std::env::current_dir().map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to determine current directory: {e}"),
    })?;
    ensure_config_files(&base_dir)?;
    load_config_from(&base_dir)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };

        // Skip .example template files
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.schedule.first_hour >= 24 {
        return Err(ConfigError::ValidationError {
            field: "schedule.first_hour".to_string(),
            message: format!("must be 0..=23, got {}", config.schedule.first_hour),
        });
    }
    if config.schedule.slot_count == 0 || config.schedule.slot_count > 24 {
        return Err(ConfigError::ValidationError {
            field: "schedule.slot_count".to_string(),
            message: format!("must be 1..=24, got {}", config.schedule.slot_count),
        });
    }
    if config.save.policy == SavePolicyKind::Debounced && config.save.debounce_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "save.debounce_ms".to_string(),
            message: "must be greater than zero for the debounced policy".to_string(),
        });
    }
    if config.backend.table.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "backend.table".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if config.backend.kind == BackendKind::Rest {
        if config.backend.rest.url.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "backend.rest.url".to_string(),
                message: "required when backend.kind = \"rest\"".to_string(),
            });
        }
        if config
            .credentials
            .api_key
            .as_deref()
            .unwrap_or_default()
            .is_empty()
        {
            return Err(ConfigError::ValidationError {
                field: "credentials.api_key".to_string(),
                message: "config/credentials.toml must provide api_key for the rest backend"
                    .to_string(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [schedule]
        mode = "fixed-slots"
        first_hour = 16
        slot_count = 12

        [save]
        policy = "explicit"

        [backend]
        kind = "sqlite"

        [backend.sqlite]
        path = ":memory:"
    "#;

    fn sample_config() -> Config {
        let app: AppFile = toml::from_str(SAMPLE).unwrap();
        Config {
            schedule: app.schedule,
            save: app.save,
            backend: app.backend,
            credentials: CredentialsConfig::default(),
        }
    }

    #[test]
    fn sample_parses_and_validates() {
        let config = sample_config();
        assert_eq!(config.schedule.mode, ScheduleMode::FixedSlots);
        assert_eq!(config.schedule.slot_count, 12);
        assert_eq!(config.save.policy, SavePolicyKind::Explicit);
        assert_eq!(config.backend.kind, BackendKind::Sqlite);
        assert_eq!(config.backend.table, "teams");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn debounce_defaults_to_300ms() {
        let config = sample_config();
        assert_eq!(config.save.debounce_ms, 300);
    }

    #[test]
    fn save_policy_conversion() {
        let mut config = sample_config();
        assert_eq!(config.save.save_policy(), SavePolicy::Explicit);

        config.save.policy = SavePolicyKind::Debounced;
        config.save.debounce_ms = 250;
        assert_eq!(
            config.save.save_policy(),
            SavePolicy::Debounced(Duration::from_millis(250))
        );

        config.save.policy = SavePolicyKind::Immediate;
        assert_eq!(config.save.save_policy(), SavePolicy::Immediate);
    }

    #[test]
    fn mode_selects_key_column() {
        assert_eq!(ScheduleMode::FixedSlots.key_column(), "slot_index");
        assert_eq!(ScheduleMode::FreeOrder.key_column(), "sort_order");
    }

    #[test]
    fn free_order_mode_parses() {
        let toml_text = SAMPLE.replace("fixed-slots", "free-order");
        let app: AppFile = toml::from_str(&toml_text).unwrap();
        assert_eq!(app.schedule.mode, ScheduleMode::FreeOrder);
    }

    #[test]
    fn rejects_out_of_range_first_hour() {
        let mut config = sample_config();
        config.schedule.first_hour = 24;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { field, .. }
            if field == "schedule.first_hour"));
    }

    #[test]
    fn rejects_zero_debounce_for_debounced_policy() {
        let mut config = sample_config();
        config.save.policy = SavePolicyKind::Debounced;
        config.save.debounce_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rest_backend_requires_url_and_api_key() {
        let mut config = sample_config();
        config.backend.kind = BackendKind::Rest;
        assert!(validate(&config).is_err());

        config.backend.rest.url = "https://example.supabase.co".to_string();
        assert!(validate(&config).is_err());

        config.credentials.api_key = Some("anon-key".to_string());
        assert!(validate(&config).is_ok());
    }
}
