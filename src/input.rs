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
use std::{io, sync::Arc, thread};

use tracing::{error, info, span, Level};

use crate::indicator::{Indicator, State};
use crate::playsync::CancelHandle;
use crate::trigger::TriggerState;

mod gesture;
pub mod keyboard;
#[cfg(test)]
pub mod scripted;
pub mod switch;

pub use gesture::QuitGesture;

/// What a physical input is mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Toggles the slot at this position in the current bank.
    Slot(usize),
    /// Advances to the next bank.
    Bank,
}

/// A single input event. Inputs that aren't mapped to anything still produce events,
/// with no control, so they take part in gesture history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub control: Option<Control>,
    pub active: bool,
}

#[cfg(test)]
impl Event {
    pub fn pressed(control: Control) -> Event {
        Event {
            control: Some(control),
            active: true,
        }
    }

    pub fn released(control: Control) -> Event {
        Event {
            control: Some(control),
            active: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("input I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A source of input events.
pub trait Source: Send {
    fn name(&self) -> &'static str;

    /// Blocks until the next event. Returns None once the source is finished, which
    /// includes noticing that the session was cancelled. Implementations must check the
    /// cancel handle at least every few hundred milliseconds.
    fn next_event(&mut self, cancel: &CancelHandle) -> Result<Option<Event>, InputError>;
}

/// Turns events into trigger state changes. Each source gets its own dispatcher, so
/// gesture history is never shared between sources.
pub struct Dispatcher {
    triggers: Arc<TriggerState>,
    indicator: Arc<dyn Indicator>,
    gesture: QuitGesture,
}

impl Dispatcher {
    pub fn new(
        triggers: Arc<TriggerState>,
        indicator: Arc<dyn Indicator>,
        quit_slot: usize,
    ) -> Dispatcher {
        Dispatcher {
            triggers,
            indicator,
            gesture: QuitGesture::new(quit_slot),
        }
    }

    /// Applies an event and returns true if it completed the quit gesture. Only active
    /// events change anything.
    pub fn dispatch(&mut self, event: Event) -> bool {
        if event.active {
            match event.control {
                Some(Control::Slot(slot)) => {
                    if !self.triggers.toggle(slot) {
                        info!(slot, "Ignoring toggle for unknown slot.");
                    }
                }
                Some(Control::Bank) => {
                    let bank = self.triggers.advance_bank();
                    info!(bank, "Switched bank.");
                    self.indicator.show(State::Bank(bank));
                }
                None => {}
            }
        }

        self.gesture.observe(event)
    }
}

/// Runs a source on its own thread until it finishes, fails, or the quit gesture is seen.
/// A quit cancels the whole session.
pub fn spawn(
    mut source: Box<dyn Source>,
    mut dispatcher: Dispatcher,
    cancel: CancelHandle,
) -> io::Result<thread::JoinHandle<()>> {
    let name = source.name();
    thread::Builder::new()
        .name(format!("{} input", name))
        .spawn(move || {
            let span = span!(Level::INFO, "input", source = name);
            let _enter = span.enter();

            info!("Input started.");
            loop {
                match source.next_event(&cancel) {
                    Ok(Some(event)) => {
                        if dispatcher.dispatch(event) {
                            info!("Quit gesture received.");
                            cancel.cancel();
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(err = %e, "Input failed, no longer listening.");
                        break;
                    }
                }
            }
            info!("Input stopped.");
        })
}

#[cfg(test)]
mod test {
    use std::{error::Error, sync::Arc};

    use super::{scripted, spawn, Control, Dispatcher, Event};
    use crate::config::Layout;
    use crate::indicator::{mock, State};
    use crate::playsync::CancelHandle;
    use crate::trigger::TriggerState;

    fn dispatcher(layout: Layout) -> (Dispatcher, Arc<TriggerState>, Arc<mock::Indicator>) {
        let triggers = Arc::new(TriggerState::new(layout));
        let indicator = Arc::new(mock::Indicator::new());
        (
            Dispatcher::new(triggers.clone(), indicator.clone(), 4),
            triggers,
            indicator,
        )
    }

    #[test]
    fn test_press_toggles_release_does_not() {
        let (mut dispatcher, triggers, _) = dispatcher(Layout::new(3, 5));

        assert!(!dispatcher.dispatch(Event::pressed(Control::Slot(1))));
        assert!(triggers.is_pending(1));
        assert!(!dispatcher.dispatch(Event::released(Control::Slot(1))));
        assert!(triggers.is_pending(1));
        dispatcher.dispatch(Event::pressed(Control::Slot(1)));
        assert!(!triggers.is_pending(1));
    }

    #[test]
    fn test_bank_advance_is_shown() {
        let (mut dispatcher, triggers, indicator) = dispatcher(Layout::new(3, 5));

        for _ in 0..3 {
            dispatcher.dispatch(Event::pressed(Control::Bank));
            dispatcher.dispatch(Event::released(Control::Bank));
        }
        assert_eq!(0, triggers.current_bank());
        assert_eq!(
            vec![State::Bank(1), State::Bank(2), State::Bank(0)],
            indicator.states()
        );
    }

    #[test]
    fn test_quit_gesture_still_applies_event() {
        let (mut dispatcher, triggers, _) = dispatcher(Layout::new(3, 5));

        assert!(!dispatcher.dispatch(Event::pressed(Control::Slot(4))));
        assert!(dispatcher.dispatch(Event::pressed(Control::Bank)));
        assert_eq!(1, triggers.current_bank());
        assert!(triggers.is_pending(4));
    }

    #[test]
    fn test_spawned_source_quits_session() -> Result<(), Box<dyn Error>> {
        let (dispatcher, triggers, _) = dispatcher(Layout::new(3, 5));
        let cancel = CancelHandle::new();
        let source = scripted::Source::new(vec![
            Event::pressed(Control::Slot(0)),
            Event::released(Control::Slot(0)),
            Event::pressed(Control::Bank),
            Event::pressed(Control::Slot(4)),
            Event::pressed(Control::Slot(2)),
        ]);

        let handle = spawn(Box::new(source), dispatcher, cancel.clone())?;
        handle.join().map_err(|_| "input thread panicked")?;

        assert!(cancel.is_cancelled());
        assert!(triggers.is_pending(0));
        // Nothing after the gesture is read.
        assert!(!triggers.is_pending(2));
        Ok(())
    }

    #[test]
    fn test_spawned_source_stops_on_cancel() -> Result<(), Box<dyn Error>> {
        let (dispatcher, _, _) = dispatcher(Layout::new(3, 5));
        let cancel = CancelHandle::new();

        let handle = spawn(
            Box::new(scripted::Source::held_open(vec![])),
            dispatcher,
            cancel.clone(),
        )?;
        cancel.cancel();
        handle.join().map_err(|_| "input thread panicked")?;
        Ok(())
    }
}
