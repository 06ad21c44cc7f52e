use anyhow::{Context, Result};
use kharcha_classify::{CategoryRuleTable, Classifier};
use kharcha_sms::{DirectionPriority, Extractor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Which keyword set wins when a message reads as both credit and debit.
    #[serde(default)]
    pub direction_priority: DirectionPriority,
    /// Extra `[[rules]]` spliced into the built-in category table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            direction_priority: DirectionPriority::default(),
            rules_file: None,
        }
    }
}

impl Config {
    pub fn extractor(&self) -> Extractor {
        Extractor::new(self.direction_priority)
    }

    pub fn classifier(&self) -> Result<Classifier> {
        let table = CategoryRuleTable::builtin();
        let Some(path) = &self.rules_file else {
            return Ok(Classifier::new(table));
        };
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let table = table
            .extend_from_toml(&s)
            .with_context(|| format!("load rules from {}", path.display()))?;
        tracing::debug!(rules = table.rules().len(), "category rules loaded");
        Ok(Classifier::new(table))
    }
}

/// Platform data directory; falls back to the working directory when the
/// platform has no notion of a home.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "kharcha", "Kharcha")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_database_path() -> PathBuf {
    data_dir().join("kharcha.db")
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("kharcha.toml")
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let s = toml::to_string_pretty(&Config::default()).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
