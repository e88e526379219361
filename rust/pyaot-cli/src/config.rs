//! Configuration file parsing for `pyaot.toml`.
//!
//! Searches the current directory then its ancestors. Every setting is a
//! default that command-line flags override.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "pyaot.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{}': {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid toml in '{}': {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PyaotConfig {
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub diagnostics: DiagnosticsSection,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Target triple, e.g. `aarch64-unknown-linux-gnu`.
    pub target: Option<String>,
    /// `none`, `speed` or `speed_and_size`
    pub opt_level: Option<String>,
    /// Directory for object files when no explicit output path is given.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsSection {
    #[serde(default)]
    pub show_syntax: bool,
    #[serde(default)]
    pub show_ir: bool,
    #[serde(default)]
    pub show_clif: bool,
    #[serde(default)]
    pub json: bool,
}

impl PyaotConfig {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Find `pyaot.toml` in `start` or the nearest ancestor that has one.
    pub fn discover(start: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let cfg = Self::load_from(&candidate)?;
                return Ok(Some((candidate, cfg)));
            }
        }
        Ok(None)
    }

    /// Use `explicit` if given, otherwise search from the working directory.
    /// Missing files during the search yield the default config.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let cwd = match std::env::current_dir() {
            Ok(cwd) => cwd,
            Err(_) => return Ok(Self::default()),
        };
        match Self::discover(&cwd)? {
            Some((path, cfg)) => {
                log::debug!("using config {}", path.display());
                Ok(cfg)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse a TOML string directly.
    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// A commented `pyaot.toml` showing every setting.
    pub fn default_template() -> &'static str {
        r#"[build]
# target = "x86_64-unknown-linux-gnu"
opt_level = "speed"
# output_dir = "build"

[diagnostics]
show_syntax = false
show_ir = false
show_clif = false
json = false
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(PyaotConfig::parse("").unwrap(), PyaotConfig::default());
    }

    #[test]
    fn template_parses() {
        let cfg = PyaotConfig::parse(PyaotConfig::default_template()).unwrap();
        assert_eq!(cfg.build.opt_level.as_deref(), Some("speed"));
        assert!(!cfg.diagnostics.show_ir);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(PyaotConfig::parse("[build]\noptimise = true\n").is_err());
    }
}
