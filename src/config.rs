// src/config.rs

//! Defines the configuration structures for the puzzle front end.
//!
//! Every section derives `Serialize`/`Deserialize` with `#[serde(default)]`
//! so a partial description falls back to the built-in values. The front end
//! itself only ever starts from [`Config::default`]; there is no config file
//! or environment lookup.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::keys::Modifiers;

// --- Top-Level Configuration Structure ---

/// Represents the complete configuration of one puzzle window.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window appearance.
    pub window: WindowConfig,
    /// Animation timer settings.
    pub timer: TimerConfig,
    /// Text rendering settings.
    pub fonts: FontConfig,
    /// Input translation settings.
    pub input: InputConfig,
}

// --- Window Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Title of the top-level window.
    pub title: String,
    /// Window background as 8-bit RGB. This is what `default_colour`
    /// reports back to the engine on drivers that own their background.
    pub background: [u8; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "Puzzle".to_string(),
            background: [0xdc, 0xda, 0xd5], // The classic toolkit grey.
        }
    }
}

// --- Timer Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimerConfig {
    /// Period of the animation tick in milliseconds.
    pub interval_ms: u64,
}

impl TimerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig { interval_ms: 20 }
    }
}

// --- Font Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontConfig {
    /// The one face loaded for every (family, size) the engine asks for.
    pub fallback_face: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        FontConfig {
            fallback_face: "variable".to_string(),
        }
    }
}

// --- Input Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Modifier that turns a left or right click into a middle click.
    pub middle_button_modifier: Modifiers,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            middle_button_modifier: Modifiers::SHIFT,
        }
    }
}
