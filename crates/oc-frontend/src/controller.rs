//! Process controller
//!
//! Drives the process from startup to exit:
//! - probes the launch context and registers with the foreground manager
//! - brings up pads and removable storage
//! - alternates foreground polls with frontend ticks
//! - at exit, relaunches if a fork was requested, then picks what the OS
//!   should do next and waits for it to let the process go

use crate::args::{unpack, ArgSource, ContentPath, NetplayForkArgs};
use crate::classify::classify;
use crate::context::ProcessContext;
use crate::exec::{RelaunchExecutor, RelaunchRequest};
use crate::fork::ForkState;
use crate::lifecycle::{save_flush_callback, ForegroundPump, ForegroundState};
use crate::storage::{MountState, StorageRoots};
use oc_core::{Config, RelaunchError};
use oc_sys::{FatDevice, Platform};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one frontend iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunloopStatus {
    Continue,
    Exit,
}

/// The emulation frontend the controller drives
pub trait Runloop {
    /// Wait for queued tasks, or until the next frame is due
    fn wait_for_tasks(&mut self) {}

    /// Run one frontend iteration. Fork requests are recorded in `fork`.
    fn iterate(&mut self, fork: &mut ForkState) -> RunloopStatus;

    /// Executable a fork relaunches into
    fn core_path(&self) -> Option<String>;

    fn content_path(&self) -> Option<String> {
        None
    }

    fn netplay_fork_args(&self) -> Option<Vec<String>> {
        None
    }
}

/// What happens to the process once it exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    /// A relaunch was handed to the loader; the OS takes it from here
    Relaunched,
    /// Restart the loader title the process was started from
    RelaunchTitle,
    /// Go back to the system menu
    ReturnToMenu,
}

impl ExitDisposition {
    pub fn decide(ctx: &ProcessContext) -> Self {
        if ctx.in_exec() {
            Self::Relaunched
        } else if ctx.classification().title_loader {
            Self::RelaunchTitle
        } else {
            Self::ReturnToMenu
        }
    }
}

/// Summary of the exit sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub disposition: ExitDisposition,
    /// Result of the fork relaunch, if one was attempted
    pub relaunch: Option<Result<(), RelaunchError>>,
}

/// Owns the platform for the lifetime of the process
pub struct ProcessController {
    config: Config,
    platform: Platform,
    roots: StorageRoots,
    context: ProcessContext,
    pump: ForegroundPump,
    fork: ForkState,
    mounts: MountState,
}

impl ProcessController {
    /// Startup: classify, register for foreground messages, bring up
    /// storage and pads.
    pub fn setup(config: Config, mut platform: Platform) -> Self {
        let classification = classify(
            platform.title.as_ref(),
            platform.dynload.as_mut(),
            &config.launch,
        );

        // Loader titles handle the home button themselves; this has to
        // happen before registering
        if classification.title_loader {
            platform.foreground.enable_home_button_menu(false);
        }
        platform
            .foreground
            .init(save_flush_callback(Arc::clone(&platform.saves)));

        let mounts = Self::mount_storage(&mut platform, classification.module_loader);
        platform.peripherals.init_pads();

        let roots = StorageRoots::relaunch(&config.storage);
        info!(
            "Platform ready: {:?}, port directory {}",
            classification.context(),
            mounts.port_dir(&config.storage)
        );

        Self {
            config,
            platform,
            roots,
            context: ProcessContext::new(classification),
            pump: ForegroundPump::new(),
            fork: ForkState::default(),
            mounts,
        }
    }

    fn mount_storage(platform: &mut Platform, module_loader: bool) -> MountState {
        let mut mounts = MountState::default();

        // FAT access goes through the loader library
        if let Err(status) = platform.loader.init_library() {
            debug!("Loader library unavailable (status {}), skipping FAT mounts", status);
            return mounts;
        }

        mounts.usb_fat = platform.peripherals.mount_fat(FatDevice::Usb);
        // Mounting the SD card through FAT is unsafe under the RPX loader
        if !module_loader {
            mounts.sd_fat = platform.peripherals.mount_fat(FatDevice::Sd);
        }

        debug!("Mounted storage: {:?}", mounts);
        mounts
    }

    pub fn context(&self) -> &ProcessContext {
        &self.context
    }

    pub fn mounts(&self) -> MountState {
        self.mounts
    }

    pub fn port_dir(&self) -> String {
        self.mounts.port_dir(&self.config.storage)
    }

    pub fn drive_list(&self) -> Vec<String> {
        self.mounts.drive_list(&self.config.storage)
    }

    pub fn foreground_state(&self) -> ForegroundState {
        self.pump.state()
    }

    pub fn fork(&self) -> &ForkState {
        &self.fork
    }

    /// Arguments this process was launched with, as argv
    pub fn arguments(&self) -> Vec<String> {
        match self.platform.sysapp.standard_args() {
            Some(blob) => unpack(&blob, 1 + self.config.launch.max_forwarded_args),
            None => Vec::new(),
        }
    }

    /// Main loop: one foreground poll, one frontend iteration, until either
    /// side wants out. No iteration runs while the foreground is released.
    pub fn run<R: Runloop + ?Sized>(&mut self, runloop: &mut R) {
        info!("Entering main loop");

        loop {
            let foreground = self.platform.foreground.as_mut();
            let mut state = self.pump.poll(foreground, false);
            if state == ForegroundState::BackgroundReleasing {
                state = self.pump.regain(foreground);
            }
            if state == ForegroundState::ShuttingDown {
                info!("OS requested exit");
                break;
            }

            runloop.wait_for_tasks();
            if runloop.iterate(&mut self.fork) == RunloopStatus::Exit {
                info!("Frontend requested exit");
                break;
            }
        }
    }

    /// Hand control to another executable
    pub fn exec(
        &mut self,
        request: &RelaunchRequest,
        sources: &[&dyn ArgSource],
    ) -> Result<(), RelaunchError> {
        let executor = RelaunchExecutor::new(&self.roots, self.config.launch.max_arg_len);
        executor.exec(self.platform.loader.as_mut(), &self.context, request, sources)
    }

    fn exitspawn<R: Runloop + ?Sized>(&mut self, runloop: &R) -> Option<Result<(), RelaunchError>> {
        let core_path = runloop.core_path()?;
        let request = self.fork.relaunch_request(&core_path)?;

        let netplay = NetplayForkArgs(runloop.netplay_fork_args());
        let content = ContentPath(runloop.content_path());
        let result = self.exec(&request, &[&netplay, &content]);

        if let Err(e) = &result {
            warn!("Relaunch into {} did not happen: {}", request.target_path, e);
        }
        Some(result)
    }

    fn teardown(&mut self) {
        self.platform.peripherals.deinit_pads();

        if self.mounts.usb_fat {
            self.platform.peripherals.unmount_fat(FatDevice::Usb);
        }
        if self.mounts.sd_fat {
            self.platform.peripherals.unmount_fat(FatDevice::Sd);
        }
        self.mounts = MountState::default();

        self.platform.loader.deinit_library();
    }

    /// Exit sequence. Returns once the OS allows the process to end.
    pub fn shutdown<R: Runloop + ?Sized>(mut self, runloop: &R) -> ExitReport {
        let relaunch = self.exitspawn(runloop);
        self.teardown();

        let disposition = ExitDisposition::decide(&self.context);
        match disposition {
            ExitDisposition::Relaunched => {}
            ExitDisposition::RelaunchTitle => self.platform.sysapp.relaunch_title(),
            ExitDisposition::ReturnToMenu => self.platform.sysapp.launch_menu(),
        }
        info!("Exiting: {:?}", disposition);

        self.pump.drain(self.platform.foreground.as_mut());
        self.platform.foreground.shutdown();

        ExitReport {
            disposition,
            relaunch,
        }
    }
}
