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
use std::{
    io::{self, IsTerminal},
    sync::Arc,
    thread,
};

use tracing::{error, info, span, warn, Level};

use crate::{
    audio::{self, thread_priority},
    banks::BankTable,
    config::{self, ConfigError},
    engine::Engine,
    indicator::{self, Indicator, State},
    input::{self, keyboard, switch, Dispatcher},
    playsync::CancelHandle,
    trigger::TriggerState,
};

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("unable to open audio output: {0}")]
    Sink(#[from] audio::SinkError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("unable to start thread: {0}")]
    Io(#[from] io::Error),

    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

/// Runs a session with the inputs and indicators described by the configuration until
/// it's cancelled, either by the quit gesture or by the caller.
pub fn run(config: &config::Player, cancel: CancelHandle) -> Result<(), PlayerError> {
    let indicator = indicator::get_indicator(config.indicators());
    let slots = config.layout().slots_per_bank();

    let mut sources: Vec<Box<dyn input::Source>> = Vec::new();
    if config.switch().enabled() {
        sources.push(Box::new(switch::Switch::new(config.switch(), slots)?));
    }

    // Restores the terminal however the session ends.
    let _raw_mode = match keyboard_source(config.keyboard(), slots) {
        Some((raw_mode, keyboard)) => {
            sources.push(Box::new(keyboard));
            Some(raw_mode)
        }
        None => None,
    };

    play(config, indicator, sources, cancel)
}

/// Sets up the keyboard source if it's enabled and there's a terminal to read from.
fn keyboard_source(
    config: &config::Keyboard,
    slots: usize,
) -> Option<(keyboard::RawMode, keyboard::Keyboard)> {
    if !config.enabled() {
        return None;
    }
    if !io::stdin().is_terminal() {
        info!("Standard input is not a terminal, keyboard disabled.");
        return None;
    }
    match keyboard::RawMode::enable() {
        Ok(raw_mode) => {
            let keyboard = keyboard::Keyboard::new(config, slots, raw_mode.reports_releases());
            Some((raw_mode, keyboard))
        }
        Err(e) => {
            warn!(err = %e, "Unable to set up the terminal, keyboard disabled");
            None
        }
    }
}

/// Loads the banks, opens the output, and runs the render loop and one thread per input
/// source until cancelled. Indicators are switched off on the way out, or left showing
/// an error if the output couldn't be opened.
pub fn play(
    config: &config::Player,
    indicator: Arc<dyn Indicator>,
    sources: Vec<Box<dyn input::Source>>,
    cancel: CancelHandle,
) -> Result<(), PlayerError> {
    let span = span!(Level::INFO, "player");
    let _enter = span.enter();

    let mut indicator_guard = indicator::Guard::new(indicator.clone());
    indicator.show(State::Off);

    let layout = config.layout();
    let table = BankTable::load(&config.sample_path(), layout);
    info!(
        path = %config.sample_path().display(),
        banks = layout.banks(),
        slots_per_bank = layout.slots_per_bank(),
        populated = table.populated(),
        "Banks loaded."
    );

    let triggers = Arc::new(TriggerState::new(layout));
    indicator.show(State::Bank(triggers.current_bank()));

    let mut sink = match audio::get_sink(config.audio()) {
        Ok(sink) => sink,
        Err(e) => {
            error!(device = config.audio().device(), err = %e, "Unable to open audio output");
            indicator_guard.finish_with(State::Error);
            return Err(e.into());
        }
    };
    info!(device = %sink, "Audio output open.");

    let mut inputs = Vec::new();
    for source in sources {
        let dispatcher = Dispatcher::new(triggers.clone(), indicator.clone(), config.quit_slot());
        match input::spawn(source, dispatcher, cancel.clone()) {
            Ok(handle) => inputs.push(handle),
            Err(e) => {
                cancel.cancel();
                join_inputs(inputs);
                return Err(e.into());
            }
        }
    }

    let mut engine = Engine::new(table, triggers, config.audio().period_frames());
    let render_cancel = cancel.clone();
    let render = thread::Builder::new()
        .name("render".to_string())
        .spawn(move || {
            if let Some(priority) = thread_priority::render_thread_priority() {
                thread_priority::configure_render_thread_priority(
                    priority,
                    thread_priority::rt_audio_enabled(),
                );
            }
            engine.run(sink.as_mut(), &render_cancel);
        });
    let render = match render {
        Ok(render) => render,
        Err(e) => {
            cancel.cancel();
            join_inputs(inputs);
            return Err(e.into());
        }
    };

    let result = render.join().map_err(|_| PlayerError::Panicked("render"));
    cancel.cancel();
    join_inputs(inputs);
    info!("Session finished.");
    result
}

fn join_inputs(inputs: Vec<thread::JoinHandle<()>>) {
    for input in inputs {
        if input.join().is_err() {
            error!("Input thread panicked.");
        }
    }
}
