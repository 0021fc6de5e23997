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
use super::{Control, Event};

/// Watches for the quit gesture: the bank control and the quit slot's control both
/// active across two consecutive events, in either order.
pub struct QuitGesture {
    quit_slot: usize,
    previous: Option<Event>,
}

impl QuitGesture {
    pub fn new(quit_slot: usize) -> QuitGesture {
        QuitGesture {
            quit_slot,
            previous: None,
        }
    }

    /// Records an event and returns true if it completes the gesture.
    pub fn observe(&mut self, event: Event) -> bool {
        let previous = self.previous.replace(event);
        let Some(previous) = previous else {
            return false;
        };
        if !previous.active || !event.active {
            return false;
        }

        let quit = Some(Control::Slot(self.quit_slot));
        let bank = Some(Control::Bank);
        (previous.control == bank && event.control == quit)
            || (previous.control == quit && event.control == bank)
    }
}

#[cfg(test)]
mod test {
    use super::QuitGesture;
    use crate::input::{Control, Event};

    #[test]
    fn test_either_order() {
        let mut gesture = QuitGesture::new(4);
        assert!(!gesture.observe(Event::pressed(Control::Bank)));
        assert!(gesture.observe(Event::pressed(Control::Slot(4))));

        let mut gesture = QuitGesture::new(4);
        assert!(!gesture.observe(Event::pressed(Control::Slot(4))));
        assert!(gesture.observe(Event::pressed(Control::Bank)));
    }

    #[test]
    fn test_release_in_between_breaks_gesture() {
        let mut gesture = QuitGesture::new(4);
        gesture.observe(Event::pressed(Control::Bank));
        gesture.observe(Event::released(Control::Bank));
        assert!(!gesture.observe(Event::pressed(Control::Slot(4))));
    }

    #[test]
    fn test_other_event_in_between_breaks_gesture() {
        let mut gesture = QuitGesture::new(4);
        gesture.observe(Event::pressed(Control::Bank));
        gesture.observe(Event {
            control: None,
            active: true,
        });
        assert!(!gesture.observe(Event::pressed(Control::Slot(4))));
    }

    #[test]
    fn test_wrong_slot() {
        let mut gesture = QuitGesture::new(4);
        gesture.observe(Event::pressed(Control::Bank));
        assert!(!gesture.observe(Event::pressed(Control::Slot(3))));
        assert!(!gesture.observe(Event::pressed(Control::Slot(3))));
    }

    #[test]
    fn test_repeated_bank_is_not_quit() {
        let mut gesture = QuitGesture::new(4);
        gesture.observe(Event::pressed(Control::Bank));
        assert!(!gesture.observe(Event::pressed(Control::Bank)));
    }
}
