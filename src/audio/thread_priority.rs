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

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

/// Default priority for the render thread when TRIGBOX_THREAD_PRIORITY is unset.
const DEFAULT_RENDER_THREAD_PRIORITY: u8 = 70;

/// Reads TRIGBOX_THREAD_PRIORITY (0-99), falling back to the default.
pub fn render_thread_priority() -> Option<ThreadPriorityValue> {
    std::env::var("TRIGBOX_THREAD_PRIORITY")
        .ok()
        .and_then(|v| parse_priority(&v))
        .or_else(|| ThreadPriorityValue::try_from(DEFAULT_RENDER_THREAD_PRIORITY).ok())
}

fn parse_priority(value: &str) -> Option<ThreadPriorityValue> {
    let n = value.trim().parse::<u8>().ok()?;
    if n >= 100 {
        return None;
    }
    ThreadPriorityValue::try_from(n).ok()
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    value == "1"
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
}

/// Returns whether we should attempt RT (SCHED_FIFO) scheduling for the render thread.
/// Default: enabled. Opt out with TRIGBOX_DISABLE_RT_AUDIO=1.
pub fn rt_audio_enabled() -> bool {
    !env_flag("TRIGBOX_DISABLE_RT_AUDIO")
}

/// Raises the priority of the calling thread. Failures are logged and otherwise ignored:
/// the render loop still works at normal priority, it's just more prone to underruns.
pub fn configure_render_thread_priority(priority: ThreadPriorityValue, rt_audio: bool) {
    let tp = ThreadPriority::Crossplatform(priority);
    if let Err(e) = set_current_thread_priority(tp) {
        warn!(error = ?e, "Failed to raise render thread priority");
    }

    #[cfg(unix)]
    if rt_audio {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        let tid = thread_native_id();
        match set_thread_priority_and_policy(
            tid,
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => {
                info!("Enabled RT SCHED_FIFO for render thread");
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Failed to set RT SCHED_FIFO for render thread"
                );
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{is_truthy, parse_priority};

    #[test]
    fn test_parse_priority() {
        assert!(parse_priority("50").is_some());
        assert!(parse_priority(" 99 ").is_some());
        assert!(parse_priority("100").is_none());
        assert!(parse_priority("high").is_none());
    }

    #[test]
    fn test_is_truthy() {
        for value in ["1", "true", "YES", "On"] {
            assert!(is_truthy(value), "{} should be truthy", value);
        }
        for value in ["0", "false", "", "nope"] {
            assert!(!is_truthy(value), "{} should not be truthy", value);
        }
    }
}
