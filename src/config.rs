use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ledger::MonthOrder;
use crate::parser::StatementFormat;

pub const CONFIG_FILE_NAME: &str = "monthbook.json";
pub const DEFAULT_STORE: &str = "classifications.json";

/// One statement export to import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub path: PathBuf,
    pub format: StatementFormat,
}

impl Source {
    pub fn new(path: impl Into<PathBuf>, format: StatementFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

/// Parses `PATH:FORMAT`, splitting on the last colon so Windows drive letters survive.
pub fn parse_source_arg(raw: &str) -> Result<Source, String> {
    let (path, format) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("Invalid source '{raw}'. Expected PATH:FORMAT"))?;
    if path.is_empty() {
        return Err(format!("Invalid source '{raw}': empty path"));
    }
    Ok(Source::new(path, format.parse::<StatementFormat>()?))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Classifier store file.
    pub store: PathBuf,

    /// Labels whose transactions are echoed while importing.
    pub watch: Vec<String>,

    pub month_order: MonthOrder,

    /// Imported in list order.
    pub sources: Vec<Source>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: PathBuf::from(DEFAULT_STORE),
            watch: vec!["Unknown".to_string()],
            month_order: MonthOrder::Chronological,
            sources: vec![
                Source::new("transumm_family.CSV", StatementFormat::Account),
                Source::new("transumm_joint.CSV", StatementFormat::Account),
                Source::new("transumm_savings.CSV", StatementFormat::Account),
                Source::new("transumm_credit_card.CSV", StatementFormat::CreditCard),
            ],
        }
    }
}

impl AppConfig {
    /// Make relative paths relative to `base`.
    pub fn anchor(mut self, base: &Path) -> Self {
        if self.store.is_relative() {
            self.store = base.join(&self.store);
        }
        for src in &mut self.sources {
            if src.path.is_relative() {
                src.path = base.join(&src.path);
            }
        }
        self
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults,
}

/// Resolve the config: explicit path, then `./monthbook.json`, then the
/// platform config dir, then built-in defaults relative to the working dir.
pub fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, ConfigOrigin)> {
    if let Some(path) = explicit {
        let cfg = read_config(path)?;
        return Ok((cfg, ConfigOrigin::File(path.to_path_buf())));
    }

    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        let cfg = read_config(&local)?;
        return Ok((cfg, ConfigOrigin::File(local)));
    }

    if let Some(global) = platform_config_path()
        && global.exists()
    {
        let cfg = read_config(&global)?;
        return Ok((cfg, ConfigOrigin::File(global)));
    }

    Ok((AppConfig::default().anchor(&cwd), ConfigOrigin::Defaults))
}

pub fn platform_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "monthbook", "monthbook").map(|p| p.config_dir().join("config.json"))
}

pub fn read_config(path: &Path) -> Result<AppConfig> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg: AppConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(cfg.anchor(&base))
}

pub fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn validate_watch(labels: &[String]) -> Result<()> {
    if let Some(blank) = labels.iter().find(|l| l.trim().is_empty()) {
        return Err(anyhow!("Invalid watch label '{blank}': must not be blank"));
    }
    Ok(())
}
