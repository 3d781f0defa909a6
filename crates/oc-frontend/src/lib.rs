//! Platform driver for the oxidized-cafe frontend
//!
//! This crate covers the parts of the frontend that talk to the console OS:
//! launch-context detection, the foreground lifecycle, storage mounts, and
//! handing control to another executable through the RPX loader.

pub mod args;
pub mod classify;
pub mod context;
pub mod controller;
pub mod exec;
pub mod fork;
pub mod lifecycle;
pub mod storage;

pub use args::{ArgSource, ContentPath, NetplayForkArgs, PackedArgs};
pub use classify::{LaunchClassification, LaunchContext};
pub use context::ProcessContext;
pub use controller::{ExitDisposition, ExitReport, ProcessController, Runloop, RunloopStatus};
pub use exec::{RelaunchExecutor, RelaunchRequest};
pub use fork::{ForkState, FrontendFork};
pub use lifecycle::{ForegroundPump, ForegroundState};
pub use storage::{MountState, StorageRoots};
