//! Console OS facilities used by the oxidized-cafe frontend
//!
//! Each OS service the platform driver talks to is a trait here, so the
//! driver can run against the real system libraries or against
//! [`hosted::HostedOs`], an in-process stand-in that records every call.

pub mod devices;
pub mod hosted;
pub mod loader;
pub mod procui;
pub mod sysapp;
pub mod title;

use std::sync::Arc;

pub use devices::{FatDevice, Peripherals};
pub use hosted::{HostedConfig, HostedOs, OsCall};
pub use loader::{LoadInfo, LoadTarget, RelaunchLoader};
pub use procui::{Foreground, ProcStatus, SaveCallback, SaveFlush};
pub use sysapp::SysApp;
pub use title::{DynLoad, ModuleHandle, TitleInfo};

/// Raw status code returned by an OS library call
pub type Status = i32;

/// Success status shared by the OS libraries
pub const STATUS_OK: Status = 0;

/// Every OS facility the platform driver needs, bundled
pub struct Platform {
    pub title: Box<dyn TitleInfo>,
    pub dynload: Box<dyn DynLoad>,
    pub loader: Box<dyn RelaunchLoader>,
    pub foreground: Box<dyn Foreground>,
    pub saves: Arc<dyn SaveFlush>,
    pub sysapp: Box<dyn SysApp>,
    pub peripherals: Box<dyn Peripherals>,
}
