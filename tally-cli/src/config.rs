use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tally_core::{Classifier, MatchMode, RuleTable};
use tally_ingest::DEFAULT_MAX_UPLOAD_BYTES;

use crate::state::{default_uploads_dir, ensure_tally_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierSection,
    #[serde(default)]
    pub uploads: UploadsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSection {
    /// Rule table TOML; the built-in table is used when unset
    pub rules_file: Option<PathBuf>,
    /// Overrides the `match_mode` written in the rule table
    pub match_mode: Option<MatchMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadsSection {
    /// Where uploads are staged while being read (default: `$TALLY_HOME/uploads`)
    pub dir: Option<PathBuf>,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for UploadsSection {
    fn default() -> Self {
        Self {
            dir: None,
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadsSection {
    pub fn resolved_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => default_uploads_dir(),
        }
    }
}

impl Config {
    /// Rule table from `rules_override`, else the configured file, else the
    /// built-in table; the configured match mode wins over the file's.
    pub fn rule_table(&self, rules_override: Option<&Path>) -> Result<RuleTable> {
        let path = rules_override.or(self.classifier.rules_file.as_deref());
        let mut table = match path {
            Some(p) => load_rule_table(p)?,
            None => RuleTable::builtin(),
        };
        if let Some(mode) = self.classifier.match_mode {
            table.match_mode = mode;
        }
        Ok(table)
    }

    pub fn classifier(&self, rules_override: Option<&Path>) -> Result<Classifier> {
        let table = self.rule_table(rules_override)?;
        Classifier::new(&table).context("invalid rule table")
    }
}

pub fn load_rule_table(path: &Path) -> Result<RuleTable> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    RuleTable::from_toml_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
