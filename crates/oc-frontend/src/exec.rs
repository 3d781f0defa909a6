//! Relaunch executor
//!
//! Replaces the running image with another executable through the OS RPX
//! loader. The loader stages a target with a prepare call, then starts it
//! with the packed argument blob. A staged target that fails to launch is
//! reverted before the error is returned, so the loader is never left half
//! prepared.

use crate::args::{resolve_args, ArgSource, PackedArgs};
use crate::context::ProcessContext;
use crate::storage::StorageRoots;
use oc_core::RelaunchError;
use oc_sys::loader::LOAD_PATH_CAPACITY;
use oc_sys::{LoadInfo, RelaunchLoader};
use tracing::{debug, info, warn};

/// A request to hand control to another executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaunchRequest {
    pub target_path: String,
    /// Forward content or network-fork arguments to the new image
    pub include_content: bool,
}

/// A prepared launch waiting to be started.
///
/// Dropping it without a successful [`PreparedLaunch::launch`] reverts the
/// prepare step.
pub struct PreparedLaunch<'l> {
    loader: &'l mut dyn RelaunchLoader,
    armed: bool,
}

impl<'l> PreparedLaunch<'l> {
    pub fn prepare(
        loader: &'l mut dyn RelaunchLoader,
        info: &LoadInfo,
    ) -> Result<Self, RelaunchError> {
        loader
            .prepare_launch(info)
            .map_err(RelaunchError::PrepareFailed)?;

        Ok(Self {
            loader,
            armed: true,
        })
    }

    /// Start the prepared image. On failure the prepare step is reverted
    /// before this returns.
    pub fn launch(mut self, args: &[u8]) -> Result<(), RelaunchError> {
        match self.loader.launch_wrapper(args) {
            Ok(()) => {
                self.armed = false;
                Ok(())
            }
            Err(status) => Err(RelaunchError::LaunchFailed(status)),
        }
    }
}

impl Drop for PreparedLaunch<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        debug!("Reverting prepared relaunch");
        if let Err(status) = self.loader.revert() {
            warn!("Failed to revert prepared relaunch (status {})", status);
        }
    }
}

/// Runs [`RelaunchRequest`]s against the OS loader
pub struct RelaunchExecutor<'a> {
    roots: &'a StorageRoots,
    max_arg_len: usize,
}

impl<'a> RelaunchExecutor<'a> {
    pub fn new(roots: &'a StorageRoots, max_arg_len: usize) -> Self {
        Self { roots, max_arg_len }
    }

    /// Hand control to `request.target_path`.
    ///
    /// With `include_content` set, arguments come from the first of `sources`
    /// that yields any. On success the exec flag in `ctx` is set; on any
    /// failure the process keeps running and nothing is left staged.
    pub fn exec(
        &self,
        loader: &mut dyn RelaunchLoader,
        ctx: &ProcessContext,
        request: &RelaunchRequest,
        sources: &[&dyn ArgSource],
    ) -> Result<(), RelaunchError> {
        let path = request.target_path.as_str();

        if self.roots.root_of(path).is_none() {
            debug!("{} is not on a supported storage root", path);
            return Err(RelaunchError::UnsupportedTarget(path.to_string()));
        }

        let args = if request.include_content {
            resolve_args(sources)
        } else {
            None
        };
        let packed = PackedArgs::pack(path, args.as_deref().unwrap_or(&[]), self.max_arg_len);

        let relative = self.translate(path)?;

        loader
            .init_library()
            .map_err(RelaunchError::LoaderUnavailable)?;

        let prepared = PreparedLaunch::prepare(loader, &LoadInfo::sd_card(relative))?;
        prepared.launch(packed.as_bytes())?;

        ctx.mark_exec();
        info!("Relaunching into {} ({} argument bytes)", path, packed.len());
        Ok(())
    }

    /// Path relative to its storage root, as the loader expects it
    fn translate<'p>(&self, path: &'p str) -> Result<&'p str, RelaunchError> {
        match self.roots.relative(path) {
            Some(relative) if !relative.is_empty() && relative.len() < LOAD_PATH_CAPACITY => {
                Ok(relative)
            }
            _ => Err(RelaunchError::PathTranslation(path.to_string())),
        }
    }
}
