// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Returns the default search paths for `rigd.toml`
/// (current directory → XDG config → /etc).
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("rigd.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("rigd").join("rigd.toml"));
    }
    paths.push(PathBuf::from("/etc/rigd/rigd.toml"));
    paths
}

/// Extract and deserialize a named section from a TOML file.
///
/// `Ok(None)` when the section is absent.
fn load_section_from_file<T: DeserializeOwned>(
    path: &Path,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
    parse_section(&content, key).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
}

fn parse_section<T: DeserializeOwned>(content: &str, key: &str) -> Result<Option<T>, String> {
    let mut table: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;
    let Some(section) = table.remove(key) else {
        return Ok(None);
    };
    section.try_into().map(Some).map_err(|e| e.to_string())
}

/// Trait for loading configuration from a `rigd.toml` section.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Section key in `rigd.toml`.
    fn section_key() -> &'static str;

    /// Load the section from a specific file path.
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// does not contain the expected `[<section_key>]` header.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        load_section_from_file::<Self>(path, Self::section_key())?.ok_or_else(|| {
            ConfigError::ParseError(
                path.to_path_buf(),
                format!("missing [{}] section", Self::section_key()),
            )
        })
    }

    /// Parse the section out of an in-memory TOML document.
    fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        parse_section::<Self>(content, Self::section_key())
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e))
            .map(Option::unwrap_or_default)
    }

    /// Search default paths and load the first file that contains the
    /// expected section.
    ///
    /// Returns `(config, path_where_found)` or `(Default::default(), None)`
    /// when no config file is found.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in config_search_paths() {
            if path.exists() {
                if let Some(cfg) = load_section_from_file::<Self>(&path, Self::section_key())? {
                    return Ok((cfg, Some(path)));
                }
            }
        }
        Ok((Self::default(), None))
    }

    /// Load from `path` when given, otherwise search the default paths.
    fn load(path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match path {
            Some(path) => Ok((Self::load_from_file(path)?, Some(path.to_path_buf()))),
            None => Self::load_from_default_paths(),
        }
    }
}
