//! Settings file handling.
//!
//! The engine binary is never guessed: it has to come from the settings file
//! or from the `CHESS_GUI_ENGINE` environment variable.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cozy_chess::Color;
use serde::Deserialize;
use thiserror::Error;
use uci_client::{EngineConfig, SearchLimits};

/// Environment variable naming the settings file
pub const CONFIG_ENV: &str = "CHESS_GUI_CONFIG";
/// Environment variable overriding `engine.path`
pub const ENGINE_ENV: &str = "CHESS_GUI_ENGINE";
/// Settings file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "chess_gui.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("settings file {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no engine configured: set `engine.path` in {} or {}", DEFAULT_CONFIG_FILE, ENGINE_ENV)]
    MissingEnginePath,
}

/// On-disk layout of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub game: GameSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
    pub move_time_ms: u64,
    pub depth: Option<u8>,
    pub handshake_timeout_ms: u64,
    pub options: BTreeMap<String, String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            move_time_ms: 100,
            depth: None,
            handshake_timeout_ms: 5000,
            options: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumanColor {
    #[default]
    White,
    Black,
}

impl From<HumanColor> for Color {
    fn from(c: HumanColor) -> Self {
        match c {
            HumanColor::White => Color::White,
            HumanColor::Black => Color::Black,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameSection {
    pub human_color: HumanColor,
    pub engine_delay_ms: u64,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            human_color: HumanColor::White,
            engine_delay_ms: 500,
        }
    }
}

/// Everything the application needs, resolved and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub engine: EngineConfig,
    pub limits: SearchLimits,
    pub human: Color,
    pub engine_delay: Duration,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let path = self.engine.path.ok_or(ConfigError::MissingEnginePath)?;

        let mut engine = EngineConfig::new(path);
        engine.args = self.engine.args;
        engine.options = self.engine.options.into_iter().collect();
        engine.handshake_timeout = Duration::from_millis(self.engine.handshake_timeout_ms);

        let move_time = Duration::from_millis(self.engine.move_time_ms);
        let limits = match self.engine.depth {
            Some(depth) => SearchLimits::depth_and_time(depth, move_time),
            None => SearchLimits::time(move_time),
        };

        Ok(Settings {
            engine,
            limits,
            human: self.game.human_color.into(),
            engine_delay: Duration::from_millis(self.game.engine_delay_ms),
        })
    }
}

/// Load settings from the command line argument, the environment, or the
/// working directory, in that order.
pub fn load(cli_path: Option<PathBuf>) -> Result<Settings, ConfigError> {
    let explicit = cli_path.or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
    let engine_override = env::var_os(ENGINE_ENV).map(PathBuf::from);
    resolve(explicit, Path::new(DEFAULT_CONFIG_FILE), engine_override)
}

fn resolve(
    explicit: Option<PathBuf>,
    fallback: &Path,
    engine_override: Option<PathBuf>,
) -> Result<Settings, ConfigError> {
    let mut config = match explicit {
        Some(path) => Config::from_file(&path)?,
        None if fallback.exists() => Config::from_file(fallback)?,
        None => Config::default(),
    };

    if let Some(path) = engine_override {
        config.engine.path = Some(path);
    }

    config.into_settings()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
