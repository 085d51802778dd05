//! `evacd` configuration, loaded from TOML.
//!
//! The file is selected via:
//! 1. `--config <path>` on the command line
//! 2. the `EVAC_CONFIG` environment variable
//! 3. `config/default.toml`
//!
//! A missing file is not fatal: the caller gets the defaults and the
//! reason, and decides how loudly to complain.  A file that exists but
//! cannot be read or parsed is an error.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use evac_coord::EngineConfig;

pub const CONFIG_ENV:   &str = "EVAC_CONFIG";
pub const DEFAULT_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub waypoints: PathBuf,
    pub edges:     PathBuf,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            waypoints: PathBuf::from("data/floor1/waypoints.csv"),
            edges:     PathBuf::from("data/floor1/edges.csv"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// SQLite database for the write-through mirror.  Needs the `sqlite`
    /// feature; unset means no mirror.
    pub sqlite: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub json:  bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map:     MapConfig,
    pub engine:  EngineConfig,
    pub mirror:  MirrorConfig,
    pub logging: LoggingConfig,
}

/// Result of [`Config::load`].
#[derive(Debug)]
pub struct Loaded {
    pub config:   Config,
    pub source:   PathBuf,
    /// Why the defaults were used instead of `source`, if they were.
    pub fallback: Option<anyhow::Error>,
}

impl Config {
    /// Parse a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Flag, then environment, then the default path.
    pub fn resolve_path(flag: Option<&Path>) -> PathBuf {
        if let Some(path) = flag {
            return path.to_path_buf();
        }
        if let Ok(path) = env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        PathBuf::from(DEFAULT_PATH)
    }

    /// Load from the resolved path, falling back to defaults only when no
    /// file exists there.
    pub fn load(flag: Option<&Path>) -> anyhow::Result<Loaded> {
        let source = Self::resolve_path(flag);
        match fs::read_to_string(&source) {
            Ok(content) => {
                let config = Self::from_toml(&content)
                    .with_context(|| format!("failed to parse config file {}", source.display()))?;
                Ok(Loaded { config, source, fallback: None })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let reason = anyhow::Error::new(e).context(format!("no config file at {}", source.display()));
                Ok(Loaded { config: Self::default(), source, fallback: Some(reason) })
            }
            Err(e) => Err(e).with_context(|| format!("failed to read config file {}", source.display())),
        }
    }
}
