//! Oxidized-Cafe - Wii U frontend driver
//!
//! Runs the platform driver against the hosted OS. Usage:
//!
//! ```text
//! oxidized-cafe [core-path [content-path]]
//! ```
//!
//! With a core path, the frontend asks to relaunch into it when it exits.

use anyhow::Result;
use oc_core::logging::{self, StderrSink};
use oc_core::Config;
use oc_frontend::{ForkState, FrontendFork, PackedArgs, ProcessController, Runloop, RunloopStatus};
use oc_sys::{HostedConfig, HostedOs};
use std::time::Duration;

const FRAME_TIME: Duration = Duration::from_millis(16);
const DEMO_FRAMES: usize = 3;

/// Frontend stand-in: a few idle frames, then exit
struct DemoRunloop {
    frame: usize,
    core_path: Option<String>,
    content_path: Option<String>,
}

impl Runloop for DemoRunloop {
    fn wait_for_tasks(&mut self) {
        std::thread::sleep(FRAME_TIME);
    }

    fn iterate(&mut self, fork: &mut ForkState) -> RunloopStatus {
        self.frame += 1;
        tracing::trace!("Frame {}", self.frame);
        if self.frame < DEMO_FRAMES {
            return RunloopStatus::Continue;
        }

        if self.core_path.is_some() {
            let mode = if self.content_path.is_some() {
                FrontendFork::CoreWithArgs
            } else {
                FrontendFork::Core
            };
            fork.set_fork(mode);
        }
        RunloopStatus::Exit
    }

    fn core_path(&self) -> Option<String> {
        self.core_path.clone()
    }

    fn content_path(&self) -> Option<String> {
        self.content_path.clone()
    }
}

fn main() -> Result<()> {
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    logging::init_with_sink(&config.logging, StderrSink)?;
    tracing::info!("Starting Oxidized-Cafe");
    if let Some(e) = config_error {
        tracing::warn!("Using default configuration: {}", e);
    }

    let argv: Vec<String> = std::env::args().collect();
    let program = argv.first().map(String::as_str).unwrap_or("oxidized-cafe");
    let packed = PackedArgs::pack(program, argv.get(1..).unwrap_or(&[]), config.launch.max_arg_len);
    let os = HostedOs::new(HostedConfig {
        standard_args: Some(packed.into_bytes()),
        ..Default::default()
    });

    let mut controller = ProcessController::setup(config, os.platform());
    let args = controller.arguments();
    tracing::debug!("Launch arguments: {:?}", args);

    let mut runloop = DemoRunloop {
        frame: 0,
        core_path: args.get(1).cloned(),
        content_path: args.get(2).cloned(),
    };

    controller.run(&mut runloop);
    let report = controller.shutdown(&runloop);

    if let Some(Err(e)) = &report.relaunch {
        tracing::warn!("Relaunch failed: {}", e);
    }
    tracing::info!("Exited with disposition {:?}", report.disposition);

    Ok(())
}
