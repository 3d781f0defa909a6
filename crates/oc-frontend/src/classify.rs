//! Launch context detection
//!
//! Two independent probes run once at startup. The title ID is matched
//! against titles known to host the homebrew launcher, and the RPX loader
//! environment is detected by briefly acquiring its module.

use oc_core::config::LaunchConfig;
use oc_sys::{DynLoad, TitleInfo};
use tracing::{debug, info};

/// Who started this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchContext {
    /// Started by the system launcher
    Normal,
    /// Started from a title hosting the homebrew launcher
    AlternateLoaderA,
    /// Started through the RPX loader environment
    AlternateLoaderB,
}

/// Result of the startup probes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchClassification {
    /// Title ID matched a known loader title
    pub title_loader: bool,
    /// Loader module was present
    pub module_loader: bool,
}

impl LaunchClassification {
    pub fn context(&self) -> LaunchContext {
        if self.title_loader {
            LaunchContext::AlternateLoaderA
        } else if self.module_loader {
            LaunchContext::AlternateLoaderB
        } else {
            LaunchContext::Normal
        }
    }
}

/// Probe the launch context
pub fn classify(
    title: &dyn TitleInfo,
    dynload: &mut dyn DynLoad,
    config: &LaunchConfig,
) -> LaunchClassification {
    let title_id = title.title_id();
    let title_loader = config
        .title_loaders
        .iter()
        .find(|loader| loader.title_id == title_id);

    match title_loader {
        Some(loader) => info!("Launched from {} ({:016X})", loader.name, title_id),
        None => debug!("Title {:016X} is not a loader title", title_id),
    }

    // Any acquire failure counts as "not present"
    let module_loader = match dynload.acquire(&config.loader_module) {
        Ok(handle) => {
            dynload.release(handle);
            true
        }
        Err(status) => {
            debug!("{} not present (status {})", config.loader_module, status);
            false
        }
    };

    let classification = LaunchClassification {
        title_loader: title_loader.is_some(),
        module_loader,
    };
    info!("Launch context: {:?}", classification.context());
    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_core::config::{HBL_TITLE_ID, MII_MAKER_EUR_TITLE_ID};
    use oc_sys::{HostedConfig, HostedOs, OsCall};

    fn run(config: HostedConfig) -> (LaunchClassification, HostedOs) {
        let os = HostedOs::new(config);
        let mut dynload = os.clone();
        let result = classify(&os, &mut dynload, &LaunchConfig::default());
        (result, os)
    }

    #[test]
    fn test_normal_launch() {
        let (result, _) = run(HostedConfig::default());
        assert_eq!(result, LaunchClassification::default());
        assert_eq!(result.context(), LaunchContext::Normal);
    }

    #[test]
    fn test_loader_titles() {
        for title_id in [HBL_TITLE_ID, MII_MAKER_EUR_TITLE_ID] {
            let (result, _) = run(HostedConfig {
                title_id,
                ..Default::default()
            });
            assert!(result.title_loader);
            assert_eq!(result.context(), LaunchContext::AlternateLoaderA);
        }
    }

    #[test]
    fn test_module_probe_releases_module() {
        let (result, os) = run(HostedConfig {
            modules: vec!["homebrew_rpx_loader".to_string()],
            ..Default::default()
        });

        assert!(result.module_loader);
        assert_eq!(result.context(), LaunchContext::AlternateLoaderB);
        assert_eq!(os.count(|c| matches!(c, OsCall::DynLoadRelease(_))), 1);
    }

    #[test]
    fn test_both_probes_positive() {
        let (result, _) = run(HostedConfig {
            title_id: HBL_TITLE_ID,
            modules: vec!["homebrew_rpx_loader".to_string()],
            ..Default::default()
        });

        assert!(result.title_loader && result.module_loader);
        assert_eq!(result.context(), LaunchContext::AlternateLoaderA);
    }

    #[test]
    fn test_missing_module_is_not_released() {
        let (result, os) = run(HostedConfig::default());
        assert!(!result.module_loader);
        assert_eq!(os.count(|c| matches!(c, OsCall::DynLoadRelease(_))), 0);
    }
}
