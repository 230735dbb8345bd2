use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, info};

use crate::sys::event::{Key, Modifiers};

const APP_DIR: &str = "tabswitch";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub switcher: SwitcherSettings,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputMode {
    /// Hold one modifier; the first press shows the overlay.
    #[default]
    SingleKey,
    /// Hold a set of modifiers and step with the arrow keys.
    Combo,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SwitchKey {
    #[default]
    Alt,
    Control,
    Meta,
}

impl SwitchKey {
    pub fn key(self) -> Key {
        match self {
            SwitchKey::Alt => Key::Alt,
            SwitchKey::Control => Key::Control,
            SwitchKey::Meta => Key::Meta,
        }
    }

    pub fn modifier(self) -> Modifiers {
        match self {
            SwitchKey::Alt => Modifiers::ALT,
            SwitchKey::Control => Modifiers::CONTROL,
            SwitchKey::Meta => Modifiers::META,
        }
    }
}

/// Which modifiers must all be held in combo mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboKeys {
    pub meta: bool,
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Default for ComboKeys {
    fn default() -> Self {
        Self {
            meta: true,
            control: true,
            alt: true,
            shift: true,
        }
    }
}

impl ComboKeys {
    pub fn required(&self) -> Modifiers {
        let mut required = Modifiers::empty();
        required.set(Modifiers::META, self.meta);
        required.set(Modifiers::CONTROL, self.control);
        required.set(Modifiers::ALT, self.alt);
        required.set(Modifiers::SHIFT, self.shift);
        required
    }

    pub fn describe(&self) -> String {
        let required = self.required();
        if required.is_empty() {
            return "not set".to_string();
        }
        format!("{} + arrow keys", required.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherSettings {
    pub enabled: bool,
    pub mode: InputMode,
    pub switch_key: SwitchKey,
    /// Only react to the switch key when no other modifier is held with it.
    pub strict_single_key: bool,
    /// Leave the active tab out of the overlay.
    pub exclude_active: bool,
    pub focus_delay_ms: u64,
    pub combo_keys: ComboKeys,
}

impl Default for SwitcherSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: InputMode::default(),
            switch_key: SwitchKey::default(),
            strict_single_key: false,
            exclude_active: true,
            focus_delay_ms: 50,
            combo_keys: ComboKeys::default(),
        }
    }
}

impl SwitcherSettings {
    pub fn focus_delay(&self) -> Duration { Duration::from_millis(self.focus_delay_ms) }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> { toml::from_str(text) }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = Self::parse(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads `path`, or the default location when none is given. A missing
    /// file means defaults; an unreadable or malformed one is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> { Ok(toml::to_string_pretty(self)?) }
}
