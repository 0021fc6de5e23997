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
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::State;

const ON: &str = "255";
const OFF: &str = "0";

/// LEDs driven through the kernel's LED class: `<led>/brightness` takes a brightness value.
/// Writing usually needs root; without it the LEDs simply stay as they are.
pub struct Leds {
    bank_leds: Vec<PathBuf>,
    status_led: PathBuf,
}

impl Leds {
    pub fn new(bank_leds: Vec<PathBuf>, status_led: PathBuf) -> Leds {
        Leds {
            bank_leds,
            status_led,
        }
    }

    fn set(led: &Path, on: bool) {
        let brightness = led.join("brightness");
        // The LED class attribute already exists; never create files in its place.
        let result = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&brightness)
            .and_then(|mut file| file.write_all(if on { ON } else { OFF }.as_bytes()));
        if let Err(e) = result {
            debug!(led = ?brightness, err = %e, "Unable to set LED");
        }
    }

    fn set_banks(&self, lit: Option<usize>) {
        for (index, led) in self.bank_leds.iter().enumerate() {
            Self::set(led, lit == Some(index));
        }
    }
}

impl super::Indicator for Leds {
    fn show(&self, state: State) {
        match state {
            State::Bank(bank) => self.set_banks(Some(bank)),
            State::Error => {
                self.set_banks(None);
                Self::set(&self.status_led, true);
            }
            State::Off => {
                self.set_banks(None);
                Self::set(&self.status_led, false);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, path::Path};

    use tempfile::tempdir;

    use super::Leds;
    use crate::indicator::{Indicator, State};

    fn brightness(led: &Path) -> String {
        fs::read_to_string(led.join("brightness")).unwrap_or_default()
    }

    #[test]
    fn test_leds() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let leds: Vec<_> = (0..3).map(|i| dir.path().join(format!("bank{}", i))).collect();
        let status = dir.path().join("status");
        for led in leds.iter().chain([&status]) {
            fs::create_dir(led)?;
            fs::write(led.join("brightness"), "0")?;
        }

        let indicator = Leds::new(leds.clone(), status.clone());

        indicator.show(State::Bank(1));
        assert_eq!(
            vec!["0", "255", "0"],
            leds.iter().map(|led| brightness(led)).collect::<Vec<_>>()
        );

        indicator.show(State::Error);
        assert_eq!(
            vec!["0", "0", "0"],
            leds.iter().map(|led| brightness(led)).collect::<Vec<_>>()
        );
        assert_eq!("255", brightness(&status));

        indicator.show(State::Off);
        assert_eq!("0", brightness(&status));
        Ok(())
    }

    #[test]
    fn test_missing_leds_are_tolerated() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let missing = dir.path().join("missing");
        let indicator = Leds::new(vec![missing.clone()], dir.path().join("status"));

        indicator.show(State::Bank(0));
        indicator.show(State::Off);
        assert!(!missing.exists());
        Ok(())
    }
}
