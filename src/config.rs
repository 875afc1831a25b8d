use crate::error::{FieldOpsError, Result};
use dialoguer::{Input, Password, Select};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub farm: FarmConfig,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
    #[serde(default = "default_include_forecast")]
    pub include_forecast: bool,
}

fn default_retries() -> u32 {
    1
}

fn default_forecast_days() -> u32 {
    7
}

fn default_include_forecast() -> bool {
    true
}

impl ApiConfig {
    /// Bearer token, if one is configured and non-blank.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("retries", &self.retries)
            .field("forecast_days", &self.forecast_days)
            .field("include_forecast", &self.include_forecast)
            .finish()
    }
}

/// Development mode surfaces mapped HTTP reason phrases; production keeps
/// them out of the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FarmConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub field_ids: Vec<i64>,
}

const ENV_PREFIX: &str = "FIELDOPS";

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(FieldOpsError::Config(format!(
                "Config file not found at {:?}. Run `fieldops init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| FieldOpsError::Config(format!("Failed to read config: {}", e)))?;

        let config = Self::from_yaml_str(&config_str)?;
        tracing::debug!(path = %config_path.display(), ?config, "Configuration loaded");
        Ok(config)
    }

    /// Parse YAML after `${VAR}` substitution, then layer
    /// `FIELDOPS_<SECTION>__<KEY>` environment overrides on top.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(&content, config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| FieldOpsError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            return Err(FieldOpsError::Config("api.base_url must be set".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(FieldOpsError::Config(format!(
                "api.base_url '{}' must start with http:// or https://",
                base
            )));
        }
        if let Some(bad) = self.farm.field_ids.iter().find(|id| **id <= 0) {
            return Err(FieldOpsError::Config(format!(
                "farm.field_ids contains non-positive id {}",
                bad
            )));
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("fieldops").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        Self::default_config_path()
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/fieldops/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FieldOpsError::Config("Cannot determine config directory".into()))?
            .join("fieldops");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up FieldOps!");
        println!();

        println!("Backend API");
        let base_url: String = Input::new()
            .with_prompt("  Base URL")
            .default("http://localhost:5000/api/".into())
            .interact_text()
            .map_err(|e| FieldOpsError::Config(format!("Input error: {}", e)))?;

        let token: String = Password::new()
            .with_prompt("  Bearer token (blank for none)")
            .allow_empty_password(true)
            .interact()
            .map_err(|e| FieldOpsError::Config(format!("Input error: {}", e)))?;

        let mode_index = Select::new()
            .with_prompt("  Mode")
            .items(&["production", "development"])
            .default(0)
            .interact()
            .map_err(|e| FieldOpsError::Config(format!("Input error: {}", e)))?;

        println!();

        println!("Farm (leave blank to list fields from the backend)");
        let field_ids_raw: String = Input::new()
            .with_prompt("  Field ids, comma separated")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| FieldOpsError::Config(format!("Input error: {}", e)))?;

        let field_ids = field_ids_raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| FieldOpsError::Config(format!("Invalid field id '{}'", s)))
            })
            .collect::<Result<Vec<_>>>()?;

        println!();

        let config = Config {
            api: ApiConfig {
                base_url,
                token: Some(token).filter(|t| !t.is_empty()),
                retries: default_retries(),
                forecast_days: default_forecast_days(),
                include_forecast: default_include_forecast(),
            },
            mode: if mode_index == 1 {
                RunMode::Development
            } else {
                RunMode::Production
            },
            cache: CacheConfig::default(),
            farm: FarmConfig {
                name: None,
                field_ids,
            },
        };
        config.validate()?;

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| FieldOpsError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# FieldOps Configuration\n# Generated by `fieldops init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .expect("env placeholder pattern is valid");

        re.replace_all(content, |caps: &regex_lite::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("FIELDOPS_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| FieldOpsError::Config("Cannot determine data directory".into()))?
            .join("fieldops");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("fieldops.db"))
    }
}
