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

use serde::Deserialize;

const DEFAULT_BANK_LEDS: [&str; 3] = [
    "/sys/class/leds/nslu2:green:disk-1",
    "/sys/class/leds/nslu2:green:disk-2",
    "/sys/class/leds/nslu2:green:ready",
];
const DEFAULT_STATUS_LED: &str = "/sys/class/leds/nslu2:red:status";

/// A YAML representation of the indicator LEDs.
#[derive(Deserialize, Clone, Default, Debug)]
pub struct Indicators {
    /// Whether indicators are driven at all (default: true).
    enabled: Option<bool>,

    /// LED class directories, one per bank.
    bank_leds: Option<Vec<String>>,

    /// LED class directory lit when the player fails.
    status_led: Option<String>,
}

impl Indicators {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn bank_leds(&self) -> Vec<PathBuf> {
        match &self.bank_leds {
            Some(leds) => leds.iter().map(PathBuf::from).collect(),
            None => DEFAULT_BANK_LEDS.iter().map(PathBuf::from).collect(),
        }
    }

    pub fn status_led(&self) -> PathBuf {
        PathBuf::from(self.status_led.as_deref().unwrap_or(DEFAULT_STATUS_LED))
    }
}

#[cfg(test)]
impl Indicators {
    /// Creates an indicator config rooted in the given directory (test only).
    pub fn new(bank_leds: Vec<String>, status_led: String) -> Indicators {
        Indicators {
            enabled: Some(true),
            bank_leds: Some(bank_leds),
            status_led: Some(status_led),
        }
    }

    /// Creates a disabled indicator config (test only).
    pub fn disabled() -> Indicators {
        Indicators {
            enabled: Some(false),
            bank_leds: None,
            status_led: None,
        }
    }
}
