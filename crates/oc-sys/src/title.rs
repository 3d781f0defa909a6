//! Process identity and dynamic module loading (OSGetTitleID, OSDynLoad_*)

use crate::Status;

/// Source of the running title's identity
pub trait TitleInfo {
    /// 64-bit title ID of the running process; fixed for its lifetime
    fn title_id(&self) -> u64;
}

/// Handle to an acquired dynamic module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleHandle(pub u32);

/// Dynamic module loader
pub trait DynLoad {
    /// Acquire a loaded module by name
    fn acquire(&mut self, name: &str) -> Result<ModuleHandle, Status>;

    /// Release a module obtained from [`DynLoad::acquire`]
    fn release(&mut self, handle: ModuleHandle);
}
