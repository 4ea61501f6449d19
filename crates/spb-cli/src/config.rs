//! Optional `spb2xml.toml` configuration and symbol source resolution.
//!
//! ```toml
//! [symbols]
//! dirs = ["defs/base", "defs/addons"]
//! models = "models.csv"
//! ```
//!
//! Relative paths are resolved against the directory of the config file.
//! Command-line flags win over the file; `SPB_DEFS_DIR` is used only when
//! neither names a definitions directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::cli::SymbolArgs;

pub const DEFAULT_CONFIG_FILE: &str = "spb2xml.toml";
pub const DEFS_DIR_ENV: &str = "SPB_DEFS_DIR";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub symbols: SymbolsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymbolsConfig {
    pub dirs: Vec<PathBuf>,
    pub models: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Make relative paths relative to `base`.
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        for dir in &mut self.symbols.dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        if let Some(models) = self.symbols.models.as_mut()
            && models.is_relative()
        {
            *models = base.join(&*models);
        }
        self
    }
}

/// Load `explicit`, or `spb2xml.toml` from the working directory when it
/// exists, or nothing.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                return Ok(FileConfig::default());
            }
            default
        }
    };
    let text = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config = FileConfig::parse(&text)
        .with_context(|| format!("parse config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    let base = path.parent().unwrap_or(Path::new("")).to_path_buf();
    Ok(config.relative_to(&base))
}

/// Definition directories and model table for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSources {
    pub dirs: Vec<PathBuf>,
    pub models: Option<PathBuf>,
}

impl SymbolSources {
    /// Merge flags over the config file, falling back to `env_dir`.
    pub fn resolve(flags: &SymbolArgs, config: &FileConfig, env_dir: Option<PathBuf>) -> Self {
        let mut dirs = if flags.defs.is_empty() {
            config.symbols.dirs.clone()
        } else {
            flags.defs.clone()
        };
        if dirs.is_empty() {
            dirs.extend(env_dir);
        }
        Self {
            dirs,
            models: flags
                .models
                .clone()
                .or_else(|| config.symbols.models.clone()),
        }
    }

    /// Same as [`SymbolSources::resolve`] with `SPB_DEFS_DIR` from the
    /// environment.
    pub fn from_env(flags: &SymbolArgs, config: &FileConfig) -> Self {
        let env_dir = std::env::var_os(DEFS_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::resolve(flags, config, env_dir)
    }
}
