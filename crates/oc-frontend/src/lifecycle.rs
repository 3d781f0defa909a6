//! Foreground lifecycle
//!
//! The OS decides when this process holds the foreground. The pump polls for
//! its messages, acknowledges foreground releases right away (no graphics
//! resources are kept across a release), and stops for good once the OS
//! reports that the process is exiting.

use oc_sys::{Foreground, ProcStatus, SaveCallback, SaveFlush};
use std::sync::Arc;
use tracing::{debug, trace};

/// Foreground state as last reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundState {
    Foreground,
    /// OS took the foreground back; released and waiting to regain it
    BackgroundReleasing,
    /// Terminal
    ShuttingDown,
}

/// Foreground message pump
#[derive(Debug)]
pub struct ForegroundPump {
    state: ForegroundState,
}

impl ForegroundPump {
    pub fn new() -> Self {
        Self {
            state: ForegroundState::Foreground,
        }
    }

    pub fn state(&self) -> ForegroundState {
        self.state
    }

    /// Handle one foreground message.
    ///
    /// Once `ShuttingDown` is reached the OS is not polled again.
    pub fn poll(&mut self, fg: &mut dyn Foreground, block: bool) -> ForegroundState {
        if self.state == ForegroundState::ShuttingDown {
            return self.state;
        }

        let next = match fg.process_messages(block) {
            ProcStatus::InForeground => ForegroundState::Foreground,
            ProcStatus::InBackground => self.state,
            ProcStatus::ReleaseForeground => {
                fg.draw_done_release();
                ForegroundState::BackgroundReleasing
            }
            ProcStatus::Exiting => ForegroundState::ShuttingDown,
        };

        if next != self.state {
            debug!("Foreground state {:?} -> {:?}", self.state, next);
        } else {
            trace!("Foreground state {:?}", next);
        }

        self.state = next;
        next
    }

    /// Block on foreground messages while released, until the OS hands the
    /// foreground back or starts shutting down.
    pub fn regain(&mut self, fg: &mut dyn Foreground) -> ForegroundState {
        while self.state == ForegroundState::BackgroundReleasing {
            self.poll(fg, true);
        }
        self.state
    }

    /// Keep polling until the OS lets the process exit. Skipped when the OS
    /// is already running the shutdown sequence.
    pub fn drain(&mut self, fg: &mut dyn Foreground) {
        if fg.in_shutdown() {
            debug!("OS already shutting down, not draining foreground messages");
            self.state = ForegroundState::ShuttingDown;
            return;
        }

        while self.poll(fg, true) != ForegroundState::ShuttingDown {}
    }
}

impl Default for ForegroundPump {
    fn default() -> Self {
        Self::new()
    }
}

/// Save-flush callback: acknowledge immediately. Saves are written as they
/// happen, so nothing is pending when the OS asks.
pub fn save_flush_callback(saves: Arc<dyn SaveFlush>) -> SaveCallback {
    Box::new(move || {
        trace!("Save flush requested");
        saves.saves_done_ready_to_release();
    })
}
