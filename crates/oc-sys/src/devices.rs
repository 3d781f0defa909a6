//! Pads and removable storage

/// Removable storage mountable through the FAT driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatDevice {
    Sd,
    Usb,
}

impl FatDevice {
    /// Mount name used by the FAT driver
    pub fn mount_name(&self) -> &'static str {
        match self {
            Self::Sd => "sd",
            Self::Usb => "usb",
        }
    }
}

/// Controller libraries and FAT mounts
pub trait Peripherals {
    fn init_pads(&mut self);

    fn deinit_pads(&mut self);

    /// Mount `device`; returns whether the mount succeeded
    fn mount_fat(&mut self, device: FatDevice) -> bool;

    fn unmount_fat(&mut self, device: FatDevice);
}
