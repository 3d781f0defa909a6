//! Fork requests from the frontend

use crate::exec::RelaunchRequest;
use tracing::debug;

/// How the frontend wants to continue after exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontendFork {
    #[default]
    None,
    /// Start another core
    Core,
    /// Start another core with the current content or netplay session
    CoreWithArgs,
    /// Restart the frontend itself
    Restart,
}

/// Fork mode recorded for the exit sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForkState {
    mode: FrontendFork,
}

impl ForkState {
    /// Record a fork request. `Restart` is carried out as a plain core
    /// relaunch. Returns false if the request is not a fork.
    pub fn set_fork(&mut self, fork: FrontendFork) -> bool {
        self.mode = match fork {
            FrontendFork::Core | FrontendFork::Restart => FrontendFork::Core,
            FrontendFork::CoreWithArgs => FrontendFork::CoreWithArgs,
            FrontendFork::None => return false,
        };
        debug!("Fork mode set to {:?}", self.mode);
        true
    }

    pub fn mode(&self) -> FrontendFork {
        self.mode
    }

    /// Relaunch to perform at exit, if a fork was requested
    pub fn relaunch_request(&self, core_path: &str) -> Option<RelaunchRequest> {
        match self.mode {
            FrontendFork::None => None,
            mode => Some(RelaunchRequest {
                target_path: core_path.to_string(),
                include_content: mode == FrontendFork::CoreWithArgs,
            }),
        }
    }
}
