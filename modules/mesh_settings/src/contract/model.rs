//! Contract models for mesh settings access

use super::error::SettingsError;
use std::fmt;

/// Interface a setting operation addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Name of the batman-adv mesh interface (e.g. "bat0")
    pub mesh_iface: String,
    /// VLAN on top of the mesh interface; `None` addresses the interface itself.
    /// `Some(0)` is a real VLAN.
    pub vid: Option<u16>,
}

impl Target {
    /// Address the mesh interface itself
    pub fn mesh(mesh_iface: impl Into<String>) -> Self {
        Self {
            mesh_iface: mesh_iface.into(),
            vid: None,
        }
    }

    /// Address a VLAN on top of the mesh interface
    pub fn vlan(mesh_iface: impl Into<String>, vid: u16) -> Self {
        Self {
            mesh_iface: mesh_iface.into(),
            vid: Some(vid),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vid {
            Some(vid) => write!(f, "{} (vid {})", self.mesh_iface, vid),
            None => f.write_str(&self.mesh_iface),
        }
    }
}

/// Access direction of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Value handed to a protocol write operation
///
/// Settings without a parse hook receive the literal argument as `Raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Raw(String),
    Bool(bool),
    U8(u8),
    U32(u32),
    /// Firewall mark and mask pair
    Mark { value: u32, mask: u32 },
}

impl SettingValue {
    /// Interpret the value as an on/off switch
    pub fn as_bool(&self) -> Result<bool, SettingsError> {
        match self {
            Self::Bool(enabled) => Ok(*enabled),
            Self::Raw(raw) => crate::domain::validation::parse_bool(raw),
            other => Err(SettingsError::validation(format!(
                "expected a boolean value, got {other:?}"
            ))),
        }
    }
}

/// Why a backend did not serve a request
///
/// Both reasons trigger the sysfs fallback in exactly the same way; the
/// distinction only feeds diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// No netlink socket was available for the session
    NoTransport,
    /// The kernel declined the command (`EOPNOTSUPP`) or never answered with data
    Declined,
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTransport => f.write_str("no netlink transport"),
            Self::Declined => f.write_str("declined by kernel"),
        }
    }
}

/// Result of one protocol backend attempt
///
/// `Unsupported` is the only outcome that allows falling back to sysfs.
#[must_use]
#[derive(Debug)]
pub enum QueryOutcome<T = ()> {
    Success(T),
    Unsupported(UnsupportedReason),
    Failed(SettingsError),
}

impl<T> QueryOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryOutcome<U> {
        match self {
            Self::Success(value) => QueryOutcome::Success(f(value)),
            Self::Unsupported(reason) => QueryOutcome::Unsupported(reason),
            Self::Failed(err) => QueryOutcome::Failed(err),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Successful end of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// Usage text was requested and printed
    Help,
    /// Current value of the setting
    Value(String),
    /// The new value was accepted by a backend
    Written,
}
