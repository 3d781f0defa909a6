//! End-to-end runs of the process controller against the hosted OS

use oc_core::config::HBL_TITLE_ID;
use oc_core::{Config, RelaunchError};
use oc_frontend::{
    ExitDisposition, ForegroundState, ForkState, FrontendFork, LaunchContext, MountState,
    PackedArgs, ProcessController, Runloop, RunloopStatus,
};
use oc_sys::loader::LOADER_ERROR_UNKNOWN;
use oc_sys::{FatDevice, HostedConfig, HostedOs, LoadTarget, OsCall, ProcStatus};

/// Frontend that runs a fixed number of frames, optionally requesting a fork
/// on the last one
#[derive(Default)]
struct ScriptedRunloop {
    frames: usize,
    ticks: usize,
    fork: Option<FrontendFork>,
    core_path: Option<String>,
    content_path: Option<String>,
    netplay_args: Option<Vec<String>>,
    /// OS journal sampled on every tick
    observed_os: Option<HostedOs>,
    /// Calls recorded by the OS when each tick ran
    calls_at_tick: Vec<Vec<OsCall>>,
}

impl ScriptedRunloop {
    fn frames(frames: usize) -> Self {
        Self {
            frames,
            ..Default::default()
        }
    }

    fn forking(fork: FrontendFork, core_path: &str) -> Self {
        Self {
            frames: 2,
            fork: Some(fork),
            core_path: Some(core_path.to_string()),
            ..Default::default()
        }
    }
}

impl Runloop for ScriptedRunloop {
    fn iterate(&mut self, fork: &mut ForkState) -> RunloopStatus {
        if let Some(os) = &self.observed_os {
            self.calls_at_tick.push(os.calls());
        }
        self.ticks += 1;
        if self.ticks < self.frames {
            return RunloopStatus::Continue;
        }
        if let Some(mode) = self.fork {
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

    fn netplay_fork_args(&self) -> Option<Vec<String>> {
        self.netplay_args.clone()
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn position(calls: &[OsCall], call: &OsCall) -> usize {
    calls
        .iter()
        .position(|c| c == call)
        .unwrap_or_else(|| panic!("{:?} was never called", call))
}

#[test]
fn test_normal_launch_returns_to_menu() {
    init_logging();
    let os = HostedOs::new(HostedConfig::default());
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    assert_eq!(controller.context().launch_context(), LaunchContext::Normal);
    assert_eq!(
        controller.mounts(),
        MountState {
            sd_fat: true,
            usb_fat: true
        }
    );

    let mut runloop = ScriptedRunloop::frames(3);
    controller.run(&mut runloop);
    assert_eq!(runloop.ticks, 3);

    let report = controller.shutdown(&runloop);
    assert_eq!(report.disposition, ExitDisposition::ReturnToMenu);
    assert_eq!(report.relaunch, None);

    let calls = os.calls();
    assert_eq!(os.count(|c| *c == OsCall::LaunchMenu), 1);
    assert_eq!(os.count(|c| *c == OsCall::RelaunchTitle), 0);
    assert_eq!(os.count(|c| matches!(c, OsCall::EnableHomeButtonMenu(_))), 0);
    assert_eq!(calls.last(), Some(&OsCall::ProcUiShutdown));
}

#[test]
fn test_startup_order() {
    let os = HostedOs::new(HostedConfig::default());
    let _controller = ProcessController::setup(Config::default(), os.platform());

    assert_eq!(
        os.calls(),
        vec![
            OsCall::DynLoadAcquire("homebrew_rpx_loader".to_string()),
            OsCall::ProcUiInit,
            OsCall::LoaderInit,
            OsCall::MountFat(FatDevice::Usb),
            OsCall::MountFat(FatDevice::Sd),
            OsCall::InitPads,
        ]
    );
}

#[test]
fn test_teardown_precedes_menu_and_drain() {
    let os = HostedOs::new(HostedConfig::default());
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    let mut runloop = ScriptedRunloop::frames(1);
    controller.run(&mut runloop);
    controller.shutdown(&runloop);

    let calls = os.calls();
    let tail = &calls[position(&calls, &OsCall::DeinitPads)..];
    assert_eq!(
        tail,
        &[
            OsCall::DeinitPads,
            OsCall::UnmountFat(FatDevice::Usb),
            OsCall::UnmountFat(FatDevice::Sd),
            OsCall::LoaderDeinit,
            OsCall::LaunchMenu,
            OsCall::ProcessMessages(true),
            OsCall::SavesDoneReadyToRelease,
            OsCall::DrawDoneRelease,
            OsCall::ProcessMessages(true),
            OsCall::ProcUiShutdown,
        ]
    );
}

#[test]
fn test_title_loader_relaunches_title() {
    let os = HostedOs::new(HostedConfig {
        title_id: HBL_TITLE_ID,
        ..Default::default()
    });
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    assert_eq!(
        controller.context().launch_context(),
        LaunchContext::AlternateLoaderA
    );

    let mut runloop = ScriptedRunloop::frames(1);
    controller.run(&mut runloop);
    let report = controller.shutdown(&runloop);

    assert_eq!(report.disposition, ExitDisposition::RelaunchTitle);
    let calls = os.calls();
    assert!(
        position(&calls, &OsCall::EnableHomeButtonMenu(false))
            < position(&calls, &OsCall::ProcUiInit)
    );
    assert_eq!(os.count(|c| *c == OsCall::RelaunchTitle), 1);
    assert_eq!(os.count(|c| *c == OsCall::LaunchMenu), 0);
}

#[test]
fn test_module_loader_skips_sd_mount() {
    let os = HostedOs::new(HostedConfig {
        modules: vec!["homebrew_rpx_loader".to_string()],
        ..Default::default()
    });
    let mut controller = ProcessController::setup(Config::default(), os.platform());

    assert_eq!(
        controller.context().launch_context(),
        LaunchContext::AlternateLoaderB
    );
    assert_eq!(os.count(|c| *c == OsCall::MountFat(FatDevice::Sd)), 0);
    assert_eq!(os.count(|c| matches!(c, OsCall::DynLoadRelease(_))), 1);
    assert_eq!(controller.port_dir(), "fs:/vol/external01/retroarch/");
    assert_eq!(
        controller.drive_list(),
        vec!["fs:/vol/external01/".to_string(), "usb:/".to_string()]
    );

    let mut runloop = ScriptedRunloop::frames(1);
    controller.run(&mut runloop);
    let report = controller.shutdown(&runloop);

    assert_eq!(report.disposition, ExitDisposition::ReturnToMenu);
    assert_eq!(os.count(|c| *c == OsCall::UnmountFat(FatDevice::Sd)), 0);
    assert_eq!(os.count(|c| *c == OsCall::UnmountFat(FatDevice::Usb)), 1);
}

#[test]
fn test_loader_init_failure_skips_mounts() {
    let os = HostedOs::new(HostedConfig {
        loader_init_status: LOADER_ERROR_UNKNOWN,
        ..Default::default()
    });
    let controller = ProcessController::setup(Config::default(), os.platform());

    assert_eq!(controller.mounts(), MountState::default());
    assert_eq!(os.count(|c| matches!(c, OsCall::MountFat(_))), 0);
    assert_eq!(controller.port_dir(), "fs:/vol/external01/retroarch/");
    assert_eq!(controller.drive_list(), vec!["fs:/vol/external01/".to_string()]);
}

#[test]
fn test_fork_relaunches_with_content() {
    init_logging();
    let os = HostedOs::new(HostedConfig {
        title_id: HBL_TITLE_ID,
        ..Default::default()
    });
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    let mut runloop =
        ScriptedRunloop::forking(FrontendFork::CoreWithArgs, "sd:/retroarch/cores/core.rpx");
    runloop.content_path = Some("sd:/roms/game.nes".to_string());

    controller.run(&mut runloop);
    assert!(!controller.context().in_exec());
    let report = controller.shutdown(&runloop);

    assert_eq!(report.relaunch, Some(Ok(())));
    assert_eq!(report.disposition, ExitDisposition::Relaunched);
    assert_eq!(os.count(|c| *c == OsCall::RelaunchTitle), 0);
    assert_eq!(os.count(|c| *c == OsCall::LaunchMenu), 0);
    assert_eq!(
        os.count(|c| *c
            == OsCall::LoaderPrepare(LoadTarget::SdCard, "retroarch/cores/core.rpx".to_string())),
        1
    );
    assert_eq!(
        os.count(|c| *c
            == OsCall::LoaderLaunch(
                b"sd:/retroarch/cores/core.rpx\0sd:/roms/game.nes\0".to_vec()
            )),
        1
    );
    assert_eq!(os.calls().last(), Some(&OsCall::ProcUiShutdown));
}

#[test]
fn test_netplay_args_take_priority_over_content() {
    let os = HostedOs::new(HostedConfig::default());
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    let mut runloop = ScriptedRunloop::forking(
        FrontendFork::CoreWithArgs,
        "fs:/vol/external01/retroarch/cores/core.rpx",
    );
    runloop.content_path = Some("sd:/roms/game.nes".to_string());
    runloop.netplay_args = Some(vec!["-H".to_string(), "lan-host".to_string()]);

    controller.run(&mut runloop);
    controller.shutdown(&runloop);

    assert_eq!(
        os.count(|c| *c
            == OsCall::LoaderLaunch(
                b"fs:/vol/external01/retroarch/cores/core.rpx\0-H\0lan-host\0".to_vec()
            )),
        1
    );
}

#[test]
fn test_restart_fork_drops_content() {
    let os = HostedOs::new(HostedConfig::default());
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    let mut runloop = ScriptedRunloop::forking(FrontendFork::Restart, "sd:/retroarch.rpx");
    runloop.content_path = Some("sd:/roms/game.nes".to_string());

    controller.run(&mut runloop);
    assert_eq!(controller.fork().mode(), FrontendFork::Core);
    controller.shutdown(&runloop);

    assert_eq!(
        os.count(|c| *c == OsCall::LoaderLaunch(b"sd:/retroarch.rpx\0".to_vec())),
        1
    );
}

#[test]
fn test_failed_launch_reverts_and_falls_back() {
    init_logging();
    let os = HostedOs::new(HostedConfig {
        title_id: HBL_TITLE_ID,
        launch_status: LOADER_ERROR_UNKNOWN,
        ..Default::default()
    });
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    let mut runloop = ScriptedRunloop::forking(FrontendFork::Core, "sd:/retroarch/cores/core.rpx");

    controller.run(&mut runloop);
    let report = controller.shutdown(&runloop);

    assert_eq!(
        report.relaunch,
        Some(Err(RelaunchError::LaunchFailed(LOADER_ERROR_UNKNOWN)))
    );
    assert_eq!(report.disposition, ExitDisposition::RelaunchTitle);

    let calls = os.calls();
    let launch = calls
        .iter()
        .position(|c| matches!(c, OsCall::LoaderLaunch(_)))
        .unwrap();
    assert!(matches!(
        calls[launch + 1],
        OsCall::LoaderPrepare(LoadTarget::RevertPrepare, _)
    ));
    assert_eq!(os.count(|c| *c == OsCall::RelaunchTitle), 1);
}

#[test]
fn test_unsupported_fork_target_touches_no_loader() {
    let os = HostedOs::new(HostedConfig::default());
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    let mut runloop = ScriptedRunloop::forking(FrontendFork::Core, "usb:/cores/core.rpx");

    controller.run(&mut runloop);
    let loader_calls = os.loader_call_count();
    let report = controller.shutdown(&runloop);

    assert_eq!(
        report.relaunch,
        Some(Err(RelaunchError::UnsupportedTarget(
            "usb:/cores/core.rpx".to_string()
        )))
    );
    assert_eq!(report.disposition, ExitDisposition::ReturnToMenu);
    // Only the teardown deinit reaches the loader
    assert_eq!(os.loader_call_count(), loader_calls + 1);
}

#[test]
fn test_os_exit_during_loop_skips_drain() {
    let os = HostedOs::new(HostedConfig::default());
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    let mut runloop = ScriptedRunloop::frames(100);

    os.request_exit();
    controller.run(&mut runloop);
    assert_eq!(runloop.ticks, 0);
    assert_eq!(controller.foreground_state(), ForegroundState::ShuttingDown);
    let blocking_polls = os.count(|c| *c == OsCall::ProcessMessages(true));

    let report = controller.shutdown(&runloop);
    assert_eq!(report.disposition, ExitDisposition::ReturnToMenu);
    assert_eq!(
        os.count(|c| *c == OsCall::ProcessMessages(true)),
        blocking_polls
    );
    assert_eq!(os.count(|c| *c == OsCall::DrawDoneRelease), 1);
    assert_eq!(os.calls().last(), Some(&OsCall::ProcUiShutdown));
}

#[test]
fn test_no_ticks_while_foreground_is_released() {
    let os = HostedOs::new(HostedConfig::default());
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    let mut runloop = ScriptedRunloop {
        frames: 2,
        observed_os: Some(os.clone()),
        ..Default::default()
    };

    os.push_message(ProcStatus::ReleaseForeground);
    os.push_message(ProcStatus::InBackground);
    os.push_message(ProcStatus::InBackground);
    os.push_message(ProcStatus::InForeground);
    controller.run(&mut runloop);

    assert_eq!(runloop.ticks, 2);
    assert_eq!(controller.foreground_state(), ForegroundState::Foreground);

    // The first tick only runs once the foreground was handed back
    let first = &runloop.calls_at_tick[0];
    let polls: Vec<&OsCall> = first
        .iter()
        .filter(|c| matches!(c, OsCall::ProcessMessages(_) | OsCall::DrawDoneRelease))
        .collect();
    assert_eq!(
        polls,
        vec![
            &OsCall::ProcessMessages(false),
            &OsCall::DrawDoneRelease,
            &OsCall::ProcessMessages(true),
            &OsCall::ProcessMessages(true),
            &OsCall::ProcessMessages(true),
        ]
    );
}

#[test]
fn test_exit_while_released_runs_no_ticks() {
    let os = HostedOs::new(HostedConfig::default());
    let mut controller = ProcessController::setup(Config::default(), os.platform());
    let mut runloop = ScriptedRunloop::frames(5);

    os.push_message(ProcStatus::ReleaseForeground);
    os.push_message(ProcStatus::InBackground);
    os.push_message(ProcStatus::Exiting);
    controller.run(&mut runloop);

    assert_eq!(runloop.ticks, 0);
    assert_eq!(controller.foreground_state(), ForegroundState::ShuttingDown);
}

#[test]
fn test_save_flush_is_acknowledged_while_running() {
    let os = HostedOs::new(HostedConfig::default());
    let _controller = ProcessController::setup(Config::default(), os.platform());
    let before = os.calls().len();

    assert!(os.request_save_flush());
    assert_eq!(os.calls()[before..], [OsCall::SavesDoneReadyToRelease]);
}

#[test]
fn test_launch_arguments_are_unpacked() {
    let blob = PackedArgs::pack("sd:/retroarch/cores/core.rpx", &["-H", "lan-host"], 4096);
    let os = HostedOs::new(HostedConfig {
        standard_args: Some(blob.into_bytes()),
        ..Default::default()
    });

    let controller = ProcessController::setup(Config::default(), os.platform());
    assert_eq!(
        controller.arguments(),
        vec!["sd:/retroarch/cores/core.rpx", "-H", "lan-host"]
    );

    let mut config = Config::default();
    config.launch.max_forwarded_args = 1;
    let controller = ProcessController::setup(config, os.platform());
    assert_eq!(
        controller.arguments(),
        vec!["sd:/retroarch/cores/core.rpx", "-H"]
    );
}

#[test]
fn test_no_launch_arguments() {
    let os = HostedOs::new(HostedConfig::default());
    let controller = ProcessController::setup(Config::default(), os.platform());
    assert!(controller.arguments().is_empty());
}
