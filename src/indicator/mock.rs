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
use parking_lot::Mutex;

use super::State;

/// An indicator that records every state it's asked to show.
pub struct Indicator {
    states: Mutex<Vec<State>>,
}

impl Indicator {
    pub fn new() -> Indicator {
        Indicator {
            states: Mutex::new(Vec::new()),
        }
    }

    /// Shows a state directly, bypassing the trait object.
    pub fn show_state(&self, state: State) {
        self.states.lock().push(state);
    }

    /// Every state shown so far, oldest first.
    pub fn states(&self) -> Vec<State> {
        self.states.lock().clone()
    }

    /// The most recently shown state.
    pub fn last(&self) -> Option<State> {
        self.states.lock().last().copied()
    }
}

impl super::Indicator for Indicator {
    fn show(&self, state: State) {
        self.show_state(state);
    }
}
