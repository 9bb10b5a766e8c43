use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{PrepError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct PrepConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub target: TargetConfig,
    pub resources: ResourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Directory of `<collection>.ndjson` / `<collection>.json` exports
    Ndjson,
    /// SQLite database with a `documents(collection, body)` table
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub path: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            account: default_account(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    /// `ACRONYM=expansion` per line
    pub chat_words: PathBuf,
    /// `word=frequency` per line; bare words count once
    pub dictionary: PathBuf,
    /// Optional `form=lemma` irregular forms, merged over the built-in table
    #[serde(default)]
    pub lemma_exceptions: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_collection() -> String {
    constants::DEFAULT_COLLECTION.to_string()
}

fn default_account() -> String {
    constants::DEFAULT_TARGET_ACCOUNT.to_string()
}

fn default_language() -> String {
    constants::DEFAULT_TARGET_LANGUAGE.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(constants::DEFAULT_OUTPUT_DIR)
}

impl PrepConfig {
    /// Load from an explicit path, `PREP_CONFIG`, or `prep.toml` in that order,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var("PREP_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(constants::DEFAULT_CONFIG_PATH)),
        };
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            PrepError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config = Self::from_toml_str(&config_content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PrepConfig = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(account) = std::env::var("PREP_TARGET_ACCOUNT") {
            if !account.trim().is_empty() {
                self.target.account = account.trim().to_string();
            }
        }
        if let Ok(dir) = std::env::var("PREP_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output.dir = PathBuf::from(dir.trim());
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.account.trim().is_empty() {
            return Err(PrepError::Config("target.account must not be empty".into()));
        }
        if self.target.language.trim().is_empty() {
            return Err(PrepError::Config("target.language must not be empty".into()));
        }
        if self.store.collection.trim().is_empty() {
            return Err(PrepError::Config("store.collection must not be empty".into()));
        }
        Ok(())
    }
}
