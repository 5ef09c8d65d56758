//! Shared, swappable configuration snapshot.
//!
//! Evaluations take an `Arc` of the current [`AuditConfig`] and keep using
//! it even if a reload swaps in a new generation meanwhile.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use pgaudit_config::{AuditConfig, parse_config_file, parse_config_str};

use crate::engine::Auditor;
use crate::error::Result;

/// Holds the current configuration generation.
///
/// # Example
///
/// ```rust
/// use pgaudit_eval::ConfigHandle;
///
/// let handle = ConfigHandle::from_str("[rule]\nclass = 'READ'\n").unwrap();
/// let before = handle.snapshot();
///
/// handle.reload_str("[rule]\nclass = 'WRITE'\n[rule]\n").unwrap();
/// assert_eq!(before.rule_count(), 1);
/// assert_eq!(handle.snapshot().rule_count(), 2);
///
/// // A broken reload keeps the current generation.
/// assert!(handle.reload_str("[rule]\nclass = 'NOPE'\n").is_err());
/// assert_eq!(handle.snapshot().rule_count(), 2);
/// ```
#[derive(Debug)]
pub struct ConfigHandle {
    current: RwLock<Arc<AuditConfig>>,
}

impl ConfigHandle {
    pub fn new(config: AuditConfig) -> Self {
        ConfigHandle {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Parse configuration text into a new handle.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self> {
        Ok(Self::new(parse_config_str(text)?))
    }

    /// Load a configuration file into a new handle.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(parse_config_file(path)?))
    }

    /// The current generation. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<AuditConfig> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// An [`Auditor`] bound to the current generation.
    pub fn auditor(&self) -> Auditor {
        Auditor::new(self.snapshot())
    }

    /// Swap in a new generation.
    pub fn replace(&self, config: AuditConfig) {
        let rules = config.rule_count();
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(config);
        log::info!("audit configuration replaced ({rules} rule section(s))");
    }

    /// Re-read `path` and swap it in. On error the current generation stays.
    pub fn reload(&self, path: &Path) -> Result<()> {
        match parse_config_file(path) {
            Ok(config) => {
                self.replace(config);
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "reload of {} failed, keeping current configuration: {e}",
                    path.display()
                );
                Err(e.into())
            }
        }
    }

    /// Parse `text` and swap it in. On error the current generation stays.
    pub fn reload_str(&self, text: &str) -> Result<()> {
        match parse_config_str(text) {
            Ok(config) => {
                self.replace(config);
                Ok(())
            }
            Err(e) => {
                log::warn!("reload failed, keeping current configuration: {e}");
                Err(e.into())
            }
        }
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}
