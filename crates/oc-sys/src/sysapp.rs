//! System application launching (SYS*)

/// System launcher
pub trait SysApp {
    /// Restart the title this process runs under
    fn relaunch_title(&mut self);

    /// Return to the system menu once this process exits
    fn launch_menu(&mut self);

    /// Anchor blob of the standard arguments this process was started with
    fn standard_args(&self) -> Option<Vec<u8>>;
}
