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
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A cancel handle is shared by every thread of a running session. The render loop checks it
/// once per quantum, the input threads check it between reads, and anything that sleeps waits
/// on it so that cancellation wakes it up immediately.
#[derive(Clone)]
pub struct CancelHandle {
    /// Set once the session should shut down. Checked without taking the lock.
    cancelled: Arc<AtomicBool>,
    /// Guards the condvar so that a cancel can't slip between a waiter's check and its sleep.
    lock: Arc<Mutex<()>>,
    /// The condvar will handle notification of cancelling.
    condvar: Arc<Condvar>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    /// Creates a new cancel handle.
    pub fn new() -> CancelHandle {
        CancelHandle {
            cancelled: Arc::new(AtomicBool::new(false)),
            lock: Arc::new(Mutex::new(())),
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Returns true if the session has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Blocks until the handle is cancelled.
    pub fn wait(&self) {
        let mut guard = self.lock.lock();
        self.condvar.wait_while(&mut guard, |_| !self.is_cancelled());
    }

    /// Sleeps for up to the given timeout, returning early if the handle is cancelled.
    /// Returns true if the handle was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut guard = self.lock.lock();
        self.condvar
            .wait_while_for(&mut guard, |_| !self.is_cancelled(), timeout);
        self.is_cancelled()
    }

    /// Cancels the session. Subsequent calls do nothing.
    pub fn cancel(&self) {
        let _guard = self.lock.lock();
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.condvar.notify_all();
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn test_cancel_handle_cancelled() {
        let cancel_handle = CancelHandle::new();
        assert!(!cancel_handle.is_cancelled());

        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || cancel_handle.wait())
        };

        cancel_handle.cancel();
        assert!(join.join().is_ok());
        assert!(cancel_handle.is_cancelled());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let cancel_handle = CancelHandle::new();
        let start = Instant::now();
        assert!(!cancel_handle.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_timeout_wakes_on_cancel() {
        let cancel_handle = CancelHandle::new();
        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || cancel_handle.wait_timeout(Duration::from_secs(30)))
        };

        cancel_handle.cancel();
        assert!(join.join().expect("thread panicked"));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let cancel_handle = CancelHandle::new();
        cancel_handle.cancel();
        cancel_handle.cancel();
        assert!(cancel_handle.is_cancelled());
        assert!(cancel_handle.wait_timeout(Duration::from_secs(30)));
    }
}
