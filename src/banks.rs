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

//! The bank library: clips discovered on disk, organized into banks of slots.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Layout;

mod header;
mod loader;

pub use header::{WaveHeader, BYTES_PER_SAMPLE, HEADER_SIZE};
pub use loader::load_bank;

/// A clip assigned to a slot. Only the path and header are kept; the file is opened
/// again whenever the clip starts playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    path: PathBuf,
    header: WaveHeader,
}

impl Clip {
    pub fn new(path: PathBuf, header: WaveHeader) -> Clip {
        Clip { path, header }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &WaveHeader {
        &self.header
    }

    /// The clip's file name, for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// One bank: a fixed number of slot positions, each holding at most one clip.
#[derive(Debug, Clone)]
pub struct Bank {
    index: usize,
    slots: Vec<Option<Clip>>,
}

impl Bank {
    /// Creates a bank with every slot empty.
    pub fn empty(index: usize, slots_per_bank: usize) -> Bank {
        Bank {
            index,
            slots: vec![None; slots_per_bank],
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slots(&self) -> &[Option<Clip>] {
        &self.slots
    }

    #[cfg(test)]
    pub fn slot(&self, slot: usize) -> Option<&Clip> {
        self.slots.get(slot).and_then(|clip| clip.as_ref())
    }

    /// Number of slots holding a clip.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|clip| clip.is_some()).count()
    }

    pub(crate) fn into_slots(self) -> Vec<Option<Clip>> {
        self.slots
    }
}

/// The ordered collection of banks. Its shape is fixed once it's built.
#[derive(Debug, Clone)]
pub struct BankTable {
    banks: Vec<Bank>,
}

impl BankTable {
    /// Loads every bank under the root directory. Banks that can't be read are left empty.
    pub fn load(root: &Path, layout: Layout) -> BankTable {
        let banks = (0..layout.banks())
            .map(|bank| load_bank(root, bank, layout.slots_per_bank()))
            .collect();
        BankTable { banks }
    }

    /// Number of slots holding a clip across all banks.
    pub fn populated(&self) -> usize {
        self.banks.iter().map(Bank::populated).sum()
    }

    pub(crate) fn into_banks(self) -> Vec<Bank> {
        self.banks
    }
}

impl fmt::Display for BankTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bank in &self.banks {
            writeln!(f, "Bank {} ({} clips):", bank.index(), bank.populated())?;
            for (slot, clip) in bank.slots().iter().enumerate() {
                match clip {
                    Some(clip) => writeln!(
                        f,
                        "  {}: {} (channels={}, frames={})",
                        slot,
                        clip.name(),
                        clip.header().channels(),
                        clip.header().frames()
                    )?,
                    None => writeln!(f, "  {}: -", slot)?,
                }
            }
        }
        Ok(())
    }
}
