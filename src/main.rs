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
mod audio;
mod banks;
mod config;
mod engine;
mod indicator;
mod input;
mod player;
mod playsync;
#[cfg(test)]
mod testutil;
mod trigger;

use clap::{crate_version, Parser, Subcommand};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::banks::BankTable;
use crate::playsync::CancelHandle;

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=sample trigger box
After=sound.target

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/trigbox
ExecStart=/usr/local/bin/trigbox start --config "$TRIGBOX_CONFIG"

[Install]
WantedBy=multi-user.target
Alias=trigbox.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sample trigger box for the stage."
)]
struct Cli {
    /// Turns on debug logging.
    #[arg(short, long, global = true)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will load the banks and play them from the switch and keyboard until quit.
    Start {
        /// The path to the player config. Defaults apply without one.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Lists the clips that would be loaded into each bank from the given directory.
    Banks {
        /// The sample directory, with one subdirectory per bank.
        path: PathBuf,
        /// The path to the player config, for the bank layout.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(input::keyboard::LogWriter::stderr)
        .init();
}

/// Waits for any of the signals that should end the session.
async fn wait_for_signal() -> io::Result<&'static str> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::select! {
        _ = terminate.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
        _ = hangup.recv() => "SIGHUP",
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Commands::Start { config } => {
            let config = config::load(config.as_deref())?;
            let cancel = CancelHandle::new();

            let signal_cancel = cancel.clone();
            let signals = tokio::spawn(async move {
                match wait_for_signal().await {
                    Ok(name) => {
                        info!(signal = name, "Received signal, stopping.");
                        signal_cancel.cancel();
                    }
                    Err(e) => error!(err = %e, "Unable to listen for signals"),
                }
            });

            let result =
                tokio::task::spawn_blocking(move || player::run(&config, cancel)).await?;
            signals.abort();
            result?;
        }
        Commands::Banks { path, config } => {
            let config = config::load(config.as_deref())?;
            let table = BankTable::load(&path, config.layout());

            if table.populated() == 0 {
                println!("No clips found in {}.", path.display());
                return Ok(());
            }

            print!("{}", table);
        }
        Commands::Devices {} => {
            let devices = audio::cpal::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}
