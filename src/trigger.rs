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
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::config::Layout;

/// Trigger state shared between the input threads and the render loop.
///
/// There is one pending toggle flag per slot position, shared by every bank: the render
/// loop applies it to the slot in whichever bank is current when it picks the flag up.
/// Inputs flip flags with an atomic XOR so that two presses between render quanta cancel
/// out, and the render loop clears them with an atomic swap, so a flip is never lost and
/// is seen no later than the next quantum.
pub struct TriggerState {
    toggles: Vec<AtomicBool>,
    bank: AtomicUsize,
    banks: usize,
}

impl TriggerState {
    /// Creates trigger state with no pending toggles and bank 0 current.
    pub fn new(layout: Layout) -> TriggerState {
        TriggerState {
            toggles: (0..layout.slots_per_bank())
                .map(|_| AtomicBool::new(false))
                .collect(),
            bank: AtomicUsize::new(0),
            banks: layout.banks(),
        }
    }

    /// Flips the pending toggle for a slot. Returns false if there is no such slot.
    pub fn toggle(&self, slot: usize) -> bool {
        match self.toggles.get(slot) {
            Some(toggle) => {
                toggle.fetch_xor(true, Ordering::AcqRel);
                true
            }
            None => false,
        }
    }

    /// Clears the pending toggle for a slot, returning whether it was set.
    pub fn take(&self, slot: usize) -> bool {
        self.toggles
            .get(slot)
            .is_some_and(|toggle| toggle.swap(false, Ordering::AcqRel))
    }

    /// Returns true if the slot has a toggle waiting to be applied.
    #[cfg(test)]
    pub fn is_pending(&self, slot: usize) -> bool {
        self.toggles
            .get(slot)
            .is_some_and(|toggle| toggle.load(Ordering::Acquire))
    }

    /// The bank that toggles currently apply to.
    pub fn current_bank(&self) -> usize {
        self.bank.load(Ordering::Acquire)
    }

    /// Moves to the next bank, wrapping back to bank 0, and returns the new bank.
    pub fn advance_bank(&self) -> usize {
        let banks = self.banks;
        let previous = self
            .bank
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bank| {
                Some((bank + 1) % banks)
            })
            .unwrap_or_default();
        (previous + 1) % banks
    }

    /// Number of slot positions.
    pub fn slots(&self) -> usize {
        self.toggles.len()
    }
}
