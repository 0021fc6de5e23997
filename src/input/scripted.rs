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
use std::{collections::VecDeque, time::Duration};

use super::{Event, InputError};
use crate::playsync::CancelHandle;

/// Replays a fixed list of events.
pub struct Source {
    events: VecDeque<Event>,
    delay: Duration,
    hold_open: bool,
}

impl Source {
    /// Replays the events back to back, then finishes.
    pub fn new(events: Vec<Event>) -> Source {
        Source {
            events: events.into(),
            delay: Duration::ZERO,
            hold_open: false,
        }
    }

    /// Replays the events, then blocks until cancelled like an idle device would.
    pub fn held_open(events: Vec<Event>) -> Source {
        Source {
            hold_open: true,
            ..Source::new(events)
        }
    }

    /// Waits this long before each event.
    pub fn with_delay(mut self, delay: Duration) -> Source {
        self.delay = delay;
        self
    }
}

impl super::Source for Source {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn next_event(&mut self, cancel: &CancelHandle) -> Result<Option<Event>, InputError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        match self.events.pop_front() {
            Some(event) => {
                if !self.delay.is_zero() && cancel.wait_timeout(self.delay) {
                    return Ok(None);
                }
                Ok(Some(event))
            }
            None => {
                if self.hold_open {
                    cancel.wait();
                }
                Ok(None)
            }
        }
    }
}
