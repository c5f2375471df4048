//! Frontend settings read from a plain `key=value` file.
//!
//! ```text
//! # settings.cfg
//! memory_size=4096
//! timer=external
//! scale=10
//! cycles_per_frame=10
//! sound=true
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Unknown keys are
//! logged and ignored.

use crate::chip8::{Config, TimerMode, DEFAULT_MEMORY_SIZE};
use log::warn;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Largest window scale; the renderer works in 16-bit coordinates.
pub const MAX_SCALE: u32 = 64;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: expected `key=value`, found {text:?}")]
    Syntax { line: usize, text: String },

    #[error("line {line}: invalid value {value:?} for `{key}`")]
    Value {
        line: usize,
        key: String,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub memory_size: usize,
    pub timer_mode: TimerMode,
    pub seed: Option<u64>,
    /// Window pixels per CHIP-8 pixel.
    pub scale: u32,
    /// Instructions executed per 60Hz frame.
    pub cycles_per_frame: u32,
    pub sound: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            // the frontend owns a 60Hz clock
            timer_mode: TimerMode::External,
            seed: None,
            scale: 10,
            cycles_per_frame: 10,
            sound: true,
        }
    }
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Start from the defaults and apply every `key=value` line in `text`.
    pub fn parse(text: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        for (n, raw) in text.lines().enumerate() {
            let line = n + 1;
            let entry = raw.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }

            let mut parts = entry.splitn(2, '=');
            let (key, value) = match (parts.next(), parts.next()) {
                (Some(key), Some(value)) => (key.trim(), value.trim()),
                _ => {
                    return Err(SettingsError::Syntax {
                        line,
                        text: raw.to_string(),
                    })
                }
            };

            match key {
                "memory_size" => settings.memory_size = parse_value(line, key, value)?,
                "timer" => settings.timer_mode = parse_value(line, key, value)?,
                "seed" => settings.seed = Some(parse_value(line, key, value)?),
                "scale" => {
                    settings.scale = parse_value(line, key, value)?;
                    if settings.scale == 0 || settings.scale > MAX_SCALE {
                        return Err(invalid(line, key, value));
                    }
                }
                "cycles_per_frame" => settings.cycles_per_frame = parse_value(line, key, value)?,
                "sound" => settings.sound = parse_bool(line, key, value)?,
                _ => warn!("line {}: ignoring unknown setting `{}`", line, key),
            }
        }

        Ok(settings)
    }

    /// The part of the settings the VM itself cares about.
    pub fn vm_config(&self) -> Config {
        Config {
            memory_size: self.memory_size,
            timer_mode: self.timer_mode,
            seed: self.seed,
        }
    }
}

fn parse_value<T: FromStr>(line: usize, key: &str, value: &str) -> Result<T, SettingsError> {
    value.parse().map_err(|_| invalid(line, key, value))
}

// only the exact words, not "1"/"yes"
fn parse_bool(line: usize, key: &str, value: &str) -> Result<bool, SettingsError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(line, key, value)),
    }
}

fn invalid(line: usize, key: &str, value: &str) -> SettingsError {
    SettingsError::Value {
        line,
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
    }

    #[test]
    fn every_key_is_applied() {
        let text = "
            # comment
            memory_size = 2048
            timer=instruction
            seed=42
            scale=4

            cycles_per_frame=20
            sound=false
        ";
        let settings = Settings::parse(text).unwrap();
        assert_eq!(
            settings,
            Settings {
                memory_size: 2048,
                timer_mode: TimerMode::PerInstruction,
                seed: Some(42),
                scale: 4,
                cycles_per_frame: 20,
                sound: false,
            }
        );
        assert_eq!(
            settings.vm_config(),
            Config::default()
                .with_memory_size(2048)
                .with_timer_mode(TimerMode::PerInstruction)
                .with_seed(42)
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let settings = Settings::parse("palette=amber\nscale=3").unwrap();
        assert_eq!(settings.scale, 3);
    }

    #[test]
    fn missing_equals_is_a_syntax_error() {
        match Settings::parse("scale=2\nfullscreen") {
            Err(SettingsError::Syntax { line, text }) => {
                assert_eq!(line, 2);
                assert_eq!(text, "fullscreen");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_values_name_the_key() {
        for text in [
            "scale=big",
            "scale=0",
            "scale=600",
            "timer=60hz",
            "sound=yes",
            "memory_size=-1",
        ]
        .iter()
        {
            match Settings::parse(text) {
                Err(SettingsError::Value { line: 1, .. }) => {}
                other => panic!("{}: unexpected {:?}", text, other),
            }
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Settings::from_file("/nonexistent/chip8.cfg"),
            Err(SettingsError::Io(_))
        ));
    }
}
