//! Error types for mesh settings access
//!
//! "Not supported by the backend" has no variant here. It is carried by
//! [`QueryOutcome`](super::QueryOutcome) and never reaches a caller.

use super::model::Direction;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal failures of one settings invocation
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Malformed invocation (unknown option)
    #[error("Error - unrecognized option: -{flag}")]
    Usage {
        /// The offending option character
        flag: char,
    },

    /// Value is not part of the setting's allow-list
    #[error("Error - the supplied argument is invalid: {value}")]
    InvalidValue {
        /// Literal argument as supplied by the user
        value: String,
        /// Every accepted value in declaration order
        allowed: &'static [&'static str],
    },

    /// Value was rejected by the setting's parse hook
    #[error("Error - {message}")]
    Validation {
        /// Human readable reason
        message: String,
    },

    /// The kernel answered with a negative acknowledgement
    #[error("Error received: {reason}")]
    Transport {
        /// Negative errno carried by the acknowledgement
        code: i32,
        /// strerror() style description of `code`
        reason: String,
    },

    /// The netlink exchange itself broke (socket I/O, malformed message)
    #[error("Error - netlink exchange failed: {0}")]
    Protocol(String),

    /// A VLAN was addressed for a setting that only exists mesh-wide
    #[error("Error - '{setting}' is not a per-VLAN setting (vid {vid})")]
    VlanNotSupported {
        /// Setting name
        setting: &'static str,
        /// Requested VLAN id
        vid: u16,
    },

    /// The setting declares no backend for the requested direction
    #[error("Error - setting '{setting}' has no backend able to {direction}")]
    NotFound {
        /// Setting name
        setting: &'static str,
        /// Requested access direction
        direction: Direction,
    },

    /// Writes require root
    #[error("Error - you must be root to change '{setting}'")]
    PermissionDenied {
        /// Setting name
        setting: &'static str,
    },

    /// The sysfs fallback failed
    #[error(transparent)]
    Legacy(#[from] LegacyError),
}

impl SettingsError {
    /// Build a parse hook rejection
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a transport failure from a negative errno
    pub fn from_errno(code: i32) -> Self {
        let reason = std::io::Error::from_raw_os_error(code.saturating_neg()).to_string();
        Self::Transport { code, reason }
    }
}

/// Failures of the sysfs backend
#[derive(Debug, Error)]
pub enum LegacyError {
    /// The entry does not exist under the resolved directory
    #[error("Error - file does not exist: {}", path.display())]
    NotFound {
        /// Full path of the missing entry
        path: PathBuf,
    },

    /// Any other I/O failure
    #[error("Error - can't access '{}': {source}", path.display())]
    Io {
        /// Full path of the entry
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
