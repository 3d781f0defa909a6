//! Foreground process management (ProcUI*) and save acknowledgement

/// Result of one foreground message poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcStatus {
    /// Process holds the foreground
    InForeground,
    /// Process is in the background; nothing to do
    InBackground,
    /// OS wants the foreground back and waits for an acknowledgement
    ReleaseForeground,
    /// Process must exit
    Exiting,
}

/// Callback the OS invokes when it needs pending saves flushed
pub type SaveCallback = Box<dyn Fn() + Send + Sync>;

/// Foreground message channel
pub trait Foreground {
    /// Must be called before [`Foreground::init`] to take effect
    fn enable_home_button_menu(&mut self, enabled: bool);

    /// Register with the OS, installing the save-flush callback
    fn init(&mut self, on_save: SaveCallback);

    /// Receive the next foreground message. With `block` set the call waits
    /// until a message is available.
    fn process_messages(&mut self, block: bool) -> ProcStatus;

    /// Whether the OS already runs this process's shutdown sequence
    fn in_shutdown(&self) -> bool;

    /// Acknowledge a [`ProcStatus::ReleaseForeground`]
    fn draw_done_release(&mut self);

    fn shutdown(&mut self);
}

/// Save-flush acknowledgement (OSSavesDone_ReadyToRelease).
///
/// Called from whatever thread the OS delivers the save callback on.
pub trait SaveFlush: Send + Sync {
    fn saves_done_ready_to_release(&self);
}
