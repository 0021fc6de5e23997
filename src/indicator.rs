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
use std::sync::Arc;

use tracing::debug;

use crate::config;

#[cfg(test)]
pub mod mock;
pub mod sysfs;

/// What the indicators show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The given bank is current.
    Bank(usize),
    /// Startup failed or the player is going down on an error.
    Error,
    /// Everything dark.
    Off,
}

/// Indicators are best effort: implementations swallow their own failures.
pub trait Indicator: Send + Sync {
    fn show(&self, state: State);
}

/// An indicator that shows nothing.
pub struct Null {}

impl Indicator for Null {
    fn show(&self, state: State) {
        debug!(state = ?state, "Indicators disabled, ignoring state.");
    }
}

/// Gets the indicator described by the configuration.
pub fn get_indicator(config: &config::Indicators) -> Arc<dyn Indicator> {
    if !config.enabled() {
        return Arc::new(Null {});
    }
    Arc::new(sysfs::Leds::new(config.bank_leds(), config.status_led()))
}

/// Puts the indicators into a final state when dropped, whichever way the session ends.
pub struct Guard {
    indicator: Arc<dyn Indicator>,
    final_state: State,
}

impl Guard {
    /// Creates a guard that turns everything off when dropped.
    pub fn new(indicator: Arc<dyn Indicator>) -> Guard {
        Guard {
            indicator,
            final_state: State::Off,
        }
    }

    /// Changes the state shown when the guard is dropped.
    pub fn finish_with(&mut self, state: State) {
        self.final_state = state;
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        self.indicator.show(self.final_state);
    }
}
