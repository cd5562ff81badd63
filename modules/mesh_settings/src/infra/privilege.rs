//! Root check for writes

use crate::contract::SettingsError;
use crate::domain::PrivilegeGuard;
use nix::unistd::{geteuid, Uid};

/// Allows writes only when the effective uid is 0
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveUidGuard {
    /// Fixed uid to check instead of the process' own
    uid: Option<Uid>,
}

impl EffectiveUidGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `uid` instead of the effective uid of this process
    pub fn with_uid(uid: u32) -> Self {
        Self {
            uid: Some(Uid::from_raw(uid)),
        }
    }

    fn effective_uid(&self) -> Uid {
        self.uid.unwrap_or_else(geteuid)
    }
}

impl PrivilegeGuard for EffectiveUidGuard {
    fn ensure_can_write(&self, setting: &'static str) -> Result<(), SettingsError> {
        let uid = self.effective_uid();
        if uid.is_root() {
            return Ok(());
        }
        tracing::debug!(setting, uid = uid.as_raw(), "refusing write for non-root user");
        Err(SettingsError::PermissionDenied { setting })
    }
}
