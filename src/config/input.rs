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
use std::path::PathBuf;
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;

const DEFAULT_SWITCH_DEVICE: &str = "/dev/input/js0";
/// Button numbers for slots 0 through 8 on the stock pedal board wiring.
const DEFAULT_SLOT_BUTTONS: [u8; 9] = [9, 7, 4, 5, 8, 0, 2, 3, 1];
const DEFAULT_BANK_BUTTON: u8 = 6;
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_MAX_RETRY_INTERVAL: Duration = Duration::from_secs(10);

const DEFAULT_SLOT_KEYS: &str = "123456789";
const DEFAULT_BANK_KEY: char = '0';

fn parse_duration(
    value: &Option<String>,
    field: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => Ok(DurationString::from_string(value.clone())
            .map_err(|source| ConfigError::Duration { field, source })?
            .into()),
        None => Ok(default),
    }
}

/// A YAML representation of the foot switch (joystick) input.
#[derive(Deserialize, Clone, Default, Debug)]
pub struct Switch {
    /// Whether the switch input runs at all (default: true).
    enabled: Option<bool>,

    /// The joystick device node.
    device: Option<String>,

    /// Button numbers, indexed by slot.
    slot_buttons: Option<Vec<u8>>,

    /// The button number that advances the bank.
    bank_button: Option<u8>,

    /// How long to wait before the first attempt to reopen a missing device.
    retry_interval: Option<String>,

    /// The longest wait between attempts to reopen a missing device.
    max_retry_interval: Option<String>,
}

impl Switch {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn device(&self) -> PathBuf {
        PathBuf::from(self.device.as_deref().unwrap_or(DEFAULT_SWITCH_DEVICE))
    }

    /// Returns the button assigned to each slot, in slot order.
    pub fn slot_buttons(&self) -> Vec<u8> {
        match &self.slot_buttons {
            Some(buttons) => buttons.clone(),
            None => DEFAULT_SLOT_BUTTONS.to_vec(),
        }
    }

    pub fn bank_button(&self) -> u8 {
        self.bank_button.unwrap_or(DEFAULT_BANK_BUTTON)
    }

    pub fn retry_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            &self.retry_interval,
            "switch.retry_interval",
            DEFAULT_RETRY_INTERVAL,
        )
    }

    pub fn max_retry_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            &self.max_retry_interval,
            "switch.max_retry_interval",
            DEFAULT_MAX_RETRY_INTERVAL,
        )
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_buttons().contains(&self.bank_button()) {
            return Err(ConfigError::Invalid(format!(
                "switch.bank_button {} is also assigned to a slot",
                self.bank_button()
            )));
        }
        if self.retry_interval()?.is_zero() {
            return Err(ConfigError::Invalid(
                "switch.retry_interval must be positive".to_string(),
            ));
        }
        self.max_retry_interval()?;
        Ok(())
    }
}

/// A YAML representation of the keyboard input.
#[derive(Deserialize, Clone, Default, Debug)]
pub struct Keyboard {
    /// Whether the keyboard input runs when stdin is a terminal (default: true).
    enabled: Option<bool>,

    /// One character per slot, in slot order.
    slot_keys: Option<String>,

    /// A single character that advances the bank.
    bank_key: Option<String>,
}

impl Keyboard {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Returns the key assigned to each slot, in slot order.
    pub fn slot_keys(&self) -> Vec<char> {
        self.slot_keys
            .as_deref()
            .unwrap_or(DEFAULT_SLOT_KEYS)
            .chars()
            .collect()
    }

    pub fn bank_key(&self) -> char {
        self.bank_key
            .as_deref()
            .and_then(|key| key.chars().next())
            .unwrap_or(DEFAULT_BANK_KEY)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bank_key) = &self.bank_key {
            if bank_key.chars().count() != 1 {
                return Err(ConfigError::Invalid(format!(
                    "keyboard.bank_key must be a single character, got {:?}",
                    bank_key
                )));
            }
        }
        if self.slot_keys().contains(&self.bank_key()) {
            return Err(ConfigError::Invalid(format!(
                "keyboard.bank_key {:?} is also assigned to a slot",
                self.bank_key()
            )));
        }
        Ok(())
    }
}
