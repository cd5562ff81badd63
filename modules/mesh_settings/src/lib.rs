//! Mesh Settings Module
//!
//! Reads and writes batman-adv mesh interface settings. The generic netlink
//! family `batadv` is tried first; the sysfs tree under
//! `/sys/class/net/<iface>/mesh/` answers when the kernel reports the
//! operation as not supported.

// Public exports
pub mod contract;
pub use contract::{
    error::{LegacyError, SettingsError},
    Direction, QueryOutcome, Report, SettingValue, Target, UnsupportedReason,
};

pub mod catalog;
pub mod config;
pub use config::Config;

pub mod domain;
pub use domain::{
    LegacyBackend, PrivilegeGuard, SettingDescriptor, SettingsDispatcher, SysfsLayout,
};

pub mod infra;
pub use infra::netlink::{Session, Transport};
