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
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::header::{HeaderError, WaveHeader, HEADER_SIZE};
use super::{Bank, Clip};

/// Loads one bank from `<root>/<bank>`.
///
/// Entries are sorted by file name in byte order and the first `slots_per_bank` are
/// assigned to slots in that order, so renaming files is how slots get rearranged.
/// A bank directory that can't be read yields an empty bank. A clip with an invalid
/// header leaves its slot empty without shifting the clips after it.
pub fn load_bank(root: &Path, bank: usize, slots_per_bank: usize) -> Bank {
    let dir = root.join(bank.to_string());
    let mut result = Bank::empty(bank, slots_per_bank);

    let entries = match sorted_entries(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                bank,
                dir = ?dir,
                err = %e,
                "Unable to read bank directory, leaving bank empty"
            );
            return result;
        }
    };

    if entries.len() > slots_per_bank {
        warn!(
            bank,
            found = entries.len(),
            slots_per_bank,
            "More clips than slots, ignoring the rest"
        );
    }

    for (slot, path) in entries.into_iter().take(slots_per_bank).enumerate() {
        match read_clip(&path) {
            Ok(clip) => {
                debug!(
                    bank,
                    slot,
                    path = ?path,
                    channels = clip.header().channels(),
                    size = clip.header().payload_size(),
                    "Loaded clip"
                );
                result.slots[slot] = Some(clip);
            }
            Err(e) => warn!(bank, slot, path = ?path, err = %e, "Skipping unreadable clip"),
        }
    }

    info!(bank, clips = result.populated(), "Bank loaded");
    result
}

/// Lists the regular, non-hidden files in a directory sorted by name.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, io::Error> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        entries.push((name, path));
    }

    // OsString ordering is plain byte ordering on unix.
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(entries.into_iter().map(|(_, path)| path).collect())
}

/// Reads the header of a clip and closes it again.
fn read_clip(path: &Path) -> Result<Clip, HeaderError> {
    let mut file = File::open(path)?;
    let length = file.metadata()?.len();
    let declared = WaveHeader::read_from(&mut file)?;

    let available = length.saturating_sub(HEADER_SIZE as u64);
    let header = declared.clamp_to(available);
    if header != declared {
        warn!(
            path = ?path,
            declared = declared.payload_size(),
            available,
            "Clip is shorter than its header claims, truncating"
        );
    }

    Ok(Clip::new(path.to_path_buf(), header))
}
