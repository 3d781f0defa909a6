//! RPX relaunch loader
//!
//! The loader replaces the running image with another executable from the
//! SD card. Launching is two-phase: `prepare_launch` stages the target, then
//! `launch_wrapper` hands over the argument blob and starts the switch. A
//! staged target that is not launched must be reverted.

use crate::Status;

/// Maximum length of [`LoadInfo::path`], terminator included
pub const LOAD_PATH_CAPACITY: usize = 256;

/// Loader status: the library was never initialized
pub const LOADER_ERROR_UNINITIALIZED: Status = -0x20;
/// Loader status: the loader service is not present on this system
pub const LOADER_ERROR_UNSUPPORTED: Status = -0x10;
/// Loader status: the target file was not found
pub const LOADER_ERROR_NOT_FOUND: Status = -0x06;
/// Loader status: unspecified failure
pub const LOADER_ERROR_UNKNOWN: Status = -0x100;

/// What a prepare request stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    /// Stage an executable from the SD card
    SdCard,
    /// Undo a previous stage request
    RevertPrepare,
}

/// Prepare request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadInfo {
    pub target: LoadTarget,
    /// Path relative to the SD card root
    pub path: String,
}

impl LoadInfo {
    pub fn sd_card(path: impl Into<String>) -> Self {
        Self {
            target: LoadTarget::SdCard,
            path: path.into(),
        }
    }

    pub fn revert() -> Self {
        Self {
            target: LoadTarget::RevertPrepare,
            path: String::new(),
        }
    }
}

/// OS facility that performs relaunches
pub trait RelaunchLoader {
    fn init_library(&mut self) -> Result<(), Status>;

    fn prepare_launch(&mut self, info: &LoadInfo) -> Result<(), Status>;

    /// Start the staged image with `args` as its packed argument blob
    fn launch_wrapper(&mut self, args: &[u8]) -> Result<(), Status>;

    fn deinit_library(&mut self);

    /// Undo a successful [`RelaunchLoader::prepare_launch`]
    fn revert(&mut self) -> Result<(), Status> {
        self.prepare_launch(&LoadInfo::revert())
    }
}
