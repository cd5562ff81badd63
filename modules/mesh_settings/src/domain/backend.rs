//! Collaborator traits for the dispatcher
//!
//! Implementations live in infra/sysfs.rs and infra/privilege.rs.

use crate::contract::{LegacyError, SettingsError};
use std::path::Path;

/// Legacy key-value access to the sysfs tree
pub trait LegacyBackend {
    /// Read `entry` under `dir`, without the trailing newline
    fn read(&self, dir: &Path, entry: &str) -> Result<String, LegacyError>;

    /// Write `value` (and `secondary`, space separated) to `entry` under `dir`
    fn write(
        &self,
        dir: &Path,
        entry: &str,
        value: &str,
        secondary: Option<&str>,
    ) -> Result<(), LegacyError>;
}

/// Gate checked before any mutation is attempted
pub trait PrivilegeGuard {
    fn ensure_can_write(&self, setting: &'static str) -> Result<(), SettingsError>;
}

