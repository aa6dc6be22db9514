use anyhow::{bail, Result};
use dirs::config_dir;
use log::{debug, trace};
use minitar::common::io::BUFFER_SIZE;
use minitar::Options;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::easy as toml;

/// The default subdirectory to place the config file in.
const CONFIG_DIR: &str = "minitar";
/// The default name of the config file.
const CONFIG_NAME: &str = "config.toml";

/// Gets the default path for the user's config file.
///
/// See the `dirs` crate documentation for exact details, but in general this will be in:
/// - Windows: `AppData/Roaming`
/// - macOS: `Library/Application Support`
/// - Linux: `$XDG_CONFIG_DIR` or `~/.config`
fn user_config_path() -> PathBuf {
    let mut dir = config_dir().unwrap_or_else(|| Path::new(".").to_owned());
    dir.push(CONFIG_DIR);
    dir.push(CONFIG_NAME);
    dir
}

/// The minitar configuration.
#[non_exhaustive]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// The path to save the configuration back to. This is set on load and not stored in the file.
    #[serde(skip)]
    pub path: PathBuf,

    /// Settings which affect program behavior.
    pub settings: Settings,
}

impl Config {
    fn with_path(path: PathBuf) -> Self {
        Self { path, ..Self::default() }
    }

    /// Loads the configuration from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(user_config_path())
    }

    /// Loads the configuration from `path`. If the file does not exist, it is created with the
    /// default settings.
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let mut config: Self = toml::from_str(&contents)?;
            config.path = path;
            debug!("Configuration loaded from {}", config.path.display());
            trace!("{:?}", config);
            Ok(config)
        } else {
            debug!("Config file does not exist, creating a new one");
            let config = Self::with_path(path);
            config.save()?;
            Ok(config)
        }
    }

    /// Saves the configuration back to the path it was loaded from.
    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if self.path.as_os_str().is_empty() {
            bail!("No config file is loaded");
        }
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        fs::write(&self.path, contents)?;
        debug!("Configuration saved to {}", self.path.display());
        Ok(())
    }

    /// Builds the archive options described by the settings.
    pub fn options(&self) -> Options {
        Options { atomic: self.settings.atomic_create, buffer_size: self.settings.buffer_size }
    }
}

/// Settings which affect program behavior.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Write new archives to a temporary file and move them into place once they are complete.
    pub atomic_create: bool,

    /// Size in bytes of the buffer used to copy file data.
    pub buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { atomic_create: true, buffer_size: BUFFER_SIZE }
    }
}
