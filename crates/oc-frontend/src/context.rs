//! Process-wide launch state

use crate::classify::{LaunchClassification, LaunchContext};
use once_cell::sync::OnceCell;

/// State fixed at startup plus the one-way exec flag.
///
/// The exec flag is set the moment the OS loader accepts a relaunch and is
/// never cleared.
#[derive(Debug, Default)]
pub struct ProcessContext {
    classification: LaunchClassification,
    exec: OnceCell<()>,
}

impl ProcessContext {
    pub fn new(classification: LaunchClassification) -> Self {
        Self {
            classification,
            exec: OnceCell::new(),
        }
    }

    pub fn classification(&self) -> LaunchClassification {
        self.classification
    }

    pub fn launch_context(&self) -> LaunchContext {
        self.classification.context()
    }

    /// Whether a relaunch hand-off was accepted
    pub fn in_exec(&self) -> bool {
        self.exec.get().is_some()
    }

    pub(crate) fn mark_exec(&self) {
        let _ = self.exec.set(());
    }
}
