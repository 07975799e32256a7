//! User configuration stored as TOML
//!
//! Location: `<config dir>/filemark/config.toml` as resolved by `directories`.
//! Every section falls back to defaults, so a partial file is valid.

use crate::error::{Error, Result};
use crate::listing::{SortKey, SortOrder};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// File name of the fingerprint database inside the data directory
pub const DATABASE_FILE_NAME: &str = "file_hash.db";

/// Default read size when hashing file content
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub hashing: HashingConfig,
    pub listing: ListingConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Override for the database location
    pub database_path: Option<PathBuf>,
    pub busy_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HashingConfig {
    pub chunk_size: usize,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingConfig {
    pub sort: SortKey,
    pub ascending: bool,
    pub show_hidden: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            sort: SortKey::Name,
            ascending: true,
            show_hidden: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Record fingerprints of every listed file when a browse session ends
    pub record_on_exit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            record_on_exit: true,
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults when it is missing or invalid
    pub fn load() -> Self {
        let Ok(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("Failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load the config file, writing the defaults first if none exists
    pub fn load_or_create() -> Self {
        if let Ok(path) = Self::config_path() {
            if !path.exists() {
                if let Err(e) = Self::default().save() {
                    log::warn!("Failed to write default config: {}", e);
                }
            }
        }
        Self::load()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&path, self.to_toml()?).map_err(|e| Error::io(&path, e))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Database path from the config, or the default under the data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.store.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DATABASE_FILE_NAME)),
        }
    }

    /// Hash read size, never zero
    pub fn chunk_size(&self) -> usize {
        self.hashing.chunk_size.max(1)
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::from_ascending(self.listing.ascending)
    }

    /// Apply command line overrides on top of file values
    pub fn apply_cli_overrides(
        &mut self,
        database_path: Option<PathBuf>,
        sort: Option<SortKey>,
        descending: bool,
        show_hidden: Option<bool>,
    ) {
        if let Some(path) = database_path {
            self.store.database_path = Some(path);
        }
        if let Some(sort) = sort {
            self.listing.sort = sort;
        }
        if descending {
            self.listing.ascending = false;
        }
        if let Some(show) = show_hidden {
            self.listing.show_hidden = show;
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "filemark")
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}
