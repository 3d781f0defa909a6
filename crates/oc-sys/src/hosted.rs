//! Hosted OS
//!
//! An in-process implementation of every OS facility. All handles created by
//! [`HostedOs::platform`] share one state, and every call made through them is
//! appended to a journal that callers can inspect afterwards.

use crate::devices::{FatDevice, Peripherals};
use crate::loader::{LoadInfo, LoadTarget, RelaunchLoader, LOADER_ERROR_UNINITIALIZED};
use crate::procui::{Foreground, ProcStatus, SaveCallback, SaveFlush};
use crate::sysapp::SysApp;
use crate::title::{DynLoad, ModuleHandle, TitleInfo};
use crate::{Platform, Status, STATUS_OK};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

/// Dynamic loader status: no module with that name is loaded
pub const DYNLOAD_ERROR_NOT_FOUND: Status = -1;

/// Title ID reported by default: an ordinary installed title
pub const DEFAULT_TITLE_ID: u64 = 0x0005_0000_1010_1000;

/// One recorded OS call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsCall {
    DynLoadAcquire(String),
    DynLoadRelease(ModuleHandle),
    LoaderInit,
    LoaderPrepare(LoadTarget, String),
    LoaderLaunch(Vec<u8>),
    LoaderDeinit,
    EnableHomeButtonMenu(bool),
    ProcUiInit,
    ProcessMessages(bool),
    DrawDoneRelease,
    ProcUiShutdown,
    SavesDoneReadyToRelease,
    RelaunchTitle,
    LaunchMenu,
    InitPads,
    DeinitPads,
    MountFat(FatDevice),
    UnmountFat(FatDevice),
}

impl OsCall {
    /// Whether this call went to the relaunch loader
    pub fn is_loader_call(&self) -> bool {
        matches!(
            self,
            Self::LoaderInit | Self::LoaderPrepare(..) | Self::LoaderLaunch(_) | Self::LoaderDeinit
        )
    }
}

/// Behavior of a [`HostedOs`]
#[derive(Debug, Clone)]
pub struct HostedConfig {
    pub title_id: u64,
    /// Names of modules that [`DynLoad::acquire`] finds
    pub modules: Vec<String>,
    pub loader_init_status: Status,
    pub prepare_status: Status,
    pub launch_status: Status,
    /// Devices that mount successfully
    pub mountable: Vec<FatDevice>,
    /// Anchor blob returned by [`SysApp::standard_args`]
    pub standard_args: Option<Vec<u8>>,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            title_id: DEFAULT_TITLE_ID,
            modules: Vec::new(),
            loader_init_status: STATUS_OK,
            prepare_status: STATUS_OK,
            launch_status: STATUS_OK,
            mountable: vec![FatDevice::Sd, FatDevice::Usb],
            standard_args: None,
        }
    }
}

fn check(status: Status) -> Result<(), Status> {
    if status == STATUS_OK {
        Ok(())
    } else {
        Err(status)
    }
}

struct HostedState {
    config: HostedConfig,
    calls: Vec<OsCall>,
    messages: VecDeque<ProcStatus>,
    save_callback: Option<Arc<dyn Fn() + Send + Sync>>,
    next_module: u32,
    loader_ready: bool,
    /// Cleared by a foreground release, set again when it is handed back
    foreground: bool,
    exiting: bool,
}

/// In-process OS
#[derive(Clone)]
pub struct HostedOs {
    state: Arc<Mutex<HostedState>>,
}

impl HostedOs {
    pub fn new(config: HostedConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostedState {
                config,
                calls: Vec::new(),
                messages: VecDeque::new(),
                save_callback: None,
                next_module: 1,
                loader_ready: false,
                foreground: true,
                exiting: false,
            })),
        }
    }

    /// Facility handles backed by this OS
    pub fn platform(&self) -> Platform {
        Platform {
            title: Box::new(self.clone()),
            dynload: Box::new(self.clone()),
            loader: Box::new(self.clone()),
            foreground: Box::new(self.clone()),
            saves: Arc::new(self.clone()),
            sysapp: Box::new(self.clone()),
            peripherals: Box::new(self.clone()),
        }
    }

    /// Every call recorded so far, in order
    pub fn calls(&self) -> Vec<OsCall> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls matching `pred`
    pub fn count(&self, pred: impl Fn(&OsCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(*c)).count()
    }

    /// Number of calls that reached the relaunch loader
    pub fn loader_call_count(&self) -> usize {
        self.count(OsCall::is_loader_call)
    }

    /// Queue a foreground message for the next poll
    pub fn push_message(&self, status: ProcStatus) {
        self.state.lock().messages.push_back(status);
    }

    /// Ask the process to leave: release the foreground, then exit
    pub fn request_exit(&self) {
        let mut state = self.state.lock();
        Self::queue_exit(&mut state);
    }

    /// Deliver a save-flush request the way the OS does, outside the
    /// foreground poll. Returns false when no callback is registered.
    pub fn request_save_flush(&self) -> bool {
        let callback = self.state.lock().save_callback.clone();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    fn queue_exit(state: &mut HostedState) {
        if state.exiting || state.messages.contains(&ProcStatus::Exiting) {
            return;
        }
        state.messages.push_back(ProcStatus::ReleaseForeground);
        state.messages.push_back(ProcStatus::Exiting);
    }

    fn record(&self, call: OsCall) {
        trace!("hosted os: {:?}", call);
        self.state.lock().calls.push(call);
    }
}

impl TitleInfo for HostedOs {
    fn title_id(&self) -> u64 {
        self.state.lock().config.title_id
    }
}

impl DynLoad for HostedOs {
    fn acquire(&mut self, name: &str) -> Result<ModuleHandle, Status> {
        self.record(OsCall::DynLoadAcquire(name.to_string()));

        let mut state = self.state.lock();
        if state.config.modules.iter().any(|m| m == name) {
            let handle = ModuleHandle(state.next_module);
            state.next_module += 1;
            Ok(handle)
        } else {
            Err(DYNLOAD_ERROR_NOT_FOUND)
        }
    }

    fn release(&mut self, handle: ModuleHandle) {
        self.record(OsCall::DynLoadRelease(handle));
    }
}

impl RelaunchLoader for HostedOs {
    fn init_library(&mut self) -> Result<(), Status> {
        self.record(OsCall::LoaderInit);

        let mut state = self.state.lock();
        check(state.config.loader_init_status)?;
        state.loader_ready = true;
        Ok(())
    }

    fn prepare_launch(&mut self, info: &LoadInfo) -> Result<(), Status> {
        self.record(OsCall::LoaderPrepare(info.target, info.path.clone()));

        let state = self.state.lock();
        if !state.loader_ready {
            return Err(LOADER_ERROR_UNINITIALIZED);
        }
        match info.target {
            LoadTarget::RevertPrepare => Ok(()),
            LoadTarget::SdCard => check(state.config.prepare_status),
        }
    }

    fn launch_wrapper(&mut self, args: &[u8]) -> Result<(), Status> {
        self.record(OsCall::LoaderLaunch(args.to_vec()));

        let mut state = self.state.lock();
        if !state.loader_ready {
            return Err(LOADER_ERROR_UNINITIALIZED);
        }
        check(state.config.launch_status)?;
        debug!("hosted os: launch accepted ({} argument bytes)", args.len());
        Self::queue_exit(&mut state);
        Ok(())
    }

    fn deinit_library(&mut self) {
        self.record(OsCall::LoaderDeinit);
        self.state.lock().loader_ready = false;
    }
}

impl Foreground for HostedOs {
    fn enable_home_button_menu(&mut self, enabled: bool) {
        self.record(OsCall::EnableHomeButtonMenu(enabled));
    }

    fn init(&mut self, on_save: SaveCallback) {
        self.record(OsCall::ProcUiInit);
        self.state.lock().save_callback = Some(Arc::from(on_save));
    }

    fn process_messages(&mut self, block: bool) -> ProcStatus {
        self.record(OsCall::ProcessMessages(block));

        let status = {
            let mut state = self.state.lock();
            let status = if state.exiting {
                ProcStatus::Exiting
            } else if let Some(status) = state.messages.pop_front() {
                status
            } else if state.foreground {
                ProcStatus::InForeground
            } else {
                ProcStatus::InBackground
            };
            match status {
                ProcStatus::ReleaseForeground => state.foreground = false,
                ProcStatus::InForeground => state.foreground = true,
                ProcStatus::Exiting => state.exiting = true,
                ProcStatus::InBackground => {}
            }
            status
        };

        // The OS asks for pending saves before it takes the foreground away
        if status == ProcStatus::ReleaseForeground {
            self.request_save_flush();
        }

        status
    }

    fn in_shutdown(&self) -> bool {
        self.state.lock().exiting
    }

    fn draw_done_release(&mut self) {
        self.record(OsCall::DrawDoneRelease);
    }

    fn shutdown(&mut self) {
        self.record(OsCall::ProcUiShutdown);
    }
}

impl SaveFlush for HostedOs {
    fn saves_done_ready_to_release(&self) {
        self.record(OsCall::SavesDoneReadyToRelease);
    }
}

impl SysApp for HostedOs {
    fn relaunch_title(&mut self) {
        self.record(OsCall::RelaunchTitle);
        Self::queue_exit(&mut self.state.lock());
    }

    fn launch_menu(&mut self) {
        self.record(OsCall::LaunchMenu);
        Self::queue_exit(&mut self.state.lock());
    }

    fn standard_args(&self) -> Option<Vec<u8>> {
        self.state.lock().config.standard_args.clone()
    }
}

impl Peripherals for HostedOs {
    fn init_pads(&mut self) {
        self.record(OsCall::InitPads);
    }

    fn deinit_pads(&mut self) {
        self.record(OsCall::DeinitPads);
    }

    fn mount_fat(&mut self, device: FatDevice) -> bool {
        self.record(OsCall::MountFat(device));
        let mounted = self.state.lock().config.mountable.contains(&device);
        debug!("hosted os: mount {}:/ -> {}", device.mount_name(), mounted);
        mounted
    }

    fn unmount_fat(&mut self, device: FatDevice) {
        self.record(OsCall::UnmountFat(device));
        debug!("hosted os: unmount {}:/", device.mount_name());
    }
}
