//! Storage roots and the paths derived from them

use oc_core::config::StorageConfig;

/// Ordered set of recognized storage-root prefixes; first match wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoots {
    roots: Vec<String>,
}

impl StorageRoots {
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Roots a relaunch target may live under
    pub fn relaunch(config: &StorageConfig) -> Self {
        Self::new(config.relaunch_roots.iter().cloned())
    }

    /// The first root `path` starts with
    pub fn root_of(&self, path: &str) -> Option<&str> {
        self.roots
            .iter()
            .map(String::as_str)
            .find(|root| path.starts_with(root))
    }

    /// `path` with its root stripped
    pub fn relative<'p>(&self, path: &'p str) -> Option<&'p str> {
        let root = self.root_of(path)?;
        path.strip_prefix(root)
    }
}

/// Which removable devices are mounted through the FAT driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MountState {
    pub sd_fat: bool,
    pub usb_fat: bool,
}

impl MountState {
    /// Root the SD card is reachable under
    pub fn sd_root<'c>(&self, config: &'c StorageConfig) -> &'c str {
        if self.sd_fat {
            &config.sd_fat_root
        } else {
            &config.sd_root
        }
    }

    /// Frontend base directory, with trailing separator
    pub fn port_dir(&self, config: &StorageConfig) -> String {
        format!("{}{}/", self.sd_root(config), config.port_dir_name)
    }

    /// Roots offered in the file browser
    pub fn drive_list(&self, config: &StorageConfig) -> Vec<String> {
        let mut drives = vec![self.sd_root(config).to_string()];
        if self.usb_fat {
            drives.push(config.usb_fat_root.clone());
        }
        drives
    }
}
