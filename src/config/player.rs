// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use super::audio::Audio;
use super::error::ConfigError;
use super::indicators::Indicators;
use super::input::{Keyboard, Switch};

const DEFAULT_SAMPLE_PATH: &str = "/data";
const DEFAULT_BANKS: usize = 3;
const DEFAULT_SLOTS_PER_BANK: usize = 5;
const DEFAULT_QUIT_SLOT: usize = 4;

/// The shape of the bank table: how many banks and how many slots in each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    banks: usize,
    slots_per_bank: usize,
}

impl Layout {
    pub fn new(banks: usize, slots_per_bank: usize) -> Layout {
        Layout {
            banks,
            slots_per_bank,
        }
    }

    pub fn banks(&self) -> usize {
        self.banks
    }

    pub fn slots_per_bank(&self) -> usize {
        self.slots_per_bank
    }
}

/// The configuration for the trigger box.
#[derive(Deserialize, Clone, Default, Debug)]
pub struct Player {
    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,

    /// The root directory holding one subdirectory per bank.
    sample_path: Option<String>,

    /// The number of banks (default: 3).
    banks: Option<usize>,

    /// The maximum number of slots in each bank (default: 5).
    slots_per_bank: Option<usize>,

    /// The slot whose control, together with the bank control, quits the player.
    quit_slot: Option<usize>,

    /// The foot switch configuration.
    #[serde(default)]
    switch: Switch,

    /// The keyboard configuration.
    #[serde(default)]
    keyboard: Keyboard,

    /// The indicator LED configuration.
    #[serde(default)]
    indicators: Indicators,
}

impl Player {
    /// Parse a player configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Player, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Player>()?)
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn sample_path(&self) -> PathBuf {
        PathBuf::from(self.sample_path.as_deref().unwrap_or(DEFAULT_SAMPLE_PATH))
    }

    pub fn layout(&self) -> Layout {
        Layout::new(
            self.banks.unwrap_or(DEFAULT_BANKS),
            self.slots_per_bank.unwrap_or(DEFAULT_SLOTS_PER_BANK),
        )
    }

    pub fn quit_slot(&self) -> usize {
        self.quit_slot.unwrap_or(DEFAULT_QUIT_SLOT)
    }

    pub fn switch(&self) -> &Switch {
        &self.switch
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn indicators(&self) -> &Indicators {
        &self.indicators
    }

    /// Checks every setting, including the ones that are only parsed on demand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = self.layout();
        if layout.banks() == 0 {
            return Err(ConfigError::Invalid("banks must be at least 1".to_string()));
        }
        if layout.slots_per_bank() == 0 {
            return Err(ConfigError::Invalid(
                "slots_per_bank must be at least 1".to_string(),
            ));
        }
        if self.quit_slot() >= layout.slots_per_bank() {
            return Err(ConfigError::Invalid(format!(
                "quit_slot {} is outside of the {} slots per bank",
                self.quit_slot(),
                layout.slots_per_bank()
            )));
        }

        self.audio.validate()?;
        self.switch.validate()?;
        self.keyboard.validate()?;
        Ok(())
    }
}

#[cfg(test)]
impl Player {
    /// Parses a player configuration from a YAML string (test only).
    pub fn from_yaml(yaml: &str) -> Result<Player, ConfigError> {
        let player = Config::builder()
            .add_source(File::from_str(yaml, config::FileFormat::Yaml))
            .build()?
            .try_deserialize::<Player>()?;
        player.validate()?;
        Ok(player)
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, path::PathBuf};

    use tempfile::tempdir;

    use super::{Layout, Player};

    #[test]
    fn test_defaults() {
        let player = Player::default();
        assert_eq!(PathBuf::from("/data"), player.sample_path());
        assert_eq!(Layout::new(3, 5), player.layout());
        assert_eq!(4, player.quit_slot());
        assert!(player.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() -> Result<(), Box<dyn Error>> {
        let player = Player::from_yaml(
            r#"
            sample_path: /mnt/samples
            banks: 2
            slots_per_bank: 9
            quit_slot: 8
            audio:
              device: mock-device
              period_frames: 441
              latency: 40ms
            switch:
              device: /dev/input/js1
              bank_button: 10
            keyboard:
              slot_keys: qwertyuio
              bank_key: p
            indicators:
              enabled: false
            "#,
        )?;

        assert_eq!(PathBuf::from("/mnt/samples"), player.sample_path());
        assert_eq!(Layout::new(2, 9), player.layout());
        assert_eq!(8, player.quit_slot());
        assert_eq!("mock-device", player.audio().device());
        assert_eq!(441, player.audio().period_frames());
        assert_eq!(44100, player.audio().sample_rate());
        assert_eq!(PathBuf::from("/dev/input/js1"), player.switch().device());
        assert_eq!(10, player.switch().bank_button());
        assert_eq!('p', player.keyboard().bank_key());
        assert_eq!('q', player.keyboard().slot_keys()[0]);
        assert!(!player.indicators().enabled());
        Ok(())
    }

    #[test]
    fn test_quit_slot_out_of_range() {
        assert!(Player::from_yaml(
            r#"
            slots_per_bank: 3
            quit_slot: 3
            "#,
        )
        .is_err());
    }

    #[test]
    fn test_zero_banks() {
        assert!(Player::from_yaml("banks: 0").is_err());
    }

    #[test]
    fn test_deserialize_file() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("trigbox.yaml");
        fs::write(&path, "banks: 4\nsample_path: /srv/banks\n")?;

        let player = super::super::load(Some(&path))?;
        assert_eq!(4, player.layout().banks());
        assert_eq!(PathBuf::from("/srv/banks"), player.sample_path());
        Ok(())
    }

    #[test]
    fn test_deserialize_missing_file() {
        assert!(Player::deserialize(&PathBuf::from("/nonexistent/trigbox.yaml")).is_err());
    }
}
