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
use std::path::Path;

use tracing::info;

mod audio;
mod error;
mod indicators;
mod input;
mod player;

pub use self::audio::Audio;
pub use self::error::ConfigError;
pub use self::indicators::Indicators;
pub use self::input::{Keyboard, Switch};
pub use self::player::{Layout, Player};

/// Loads the player configuration. Without a path, every setting takes its default.
/// The configuration is validated before it's returned, so nothing downstream needs
/// to handle malformed values.
pub fn load(path: Option<&Path>) -> Result<Player, ConfigError> {
    let player = match path {
        Some(path) => {
            info!(path = ?path, "Loading player configuration.");
            Player::deserialize(path)?
        }
        None => {
            info!("No configuration given, using defaults.");
            Player::default()
        }
    };

    player.validate()?;
    Ok(player)
}
