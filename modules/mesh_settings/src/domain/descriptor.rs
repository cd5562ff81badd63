//! Per-setting capability descriptor

use crate::contract::{QueryOutcome, SettingValue, SettingsError, Target};
use crate::infra::netlink::Session;

/// Reads the current value over netlink
pub type ReadOp = fn(&mut Session, &Target) -> QueryOutcome<String>;

/// Writes a parsed value over netlink
pub type WriteOp = fn(&mut Session, &Target, &SettingValue) -> QueryOutcome;

/// Turns the value arguments into a [`SettingValue`] before anything is written
pub type ParseHook = fn(&[String]) -> Result<SettingValue, SettingsError>;

/// Static description of one setting
///
/// Every capability is optional; a setting without a netlink operation for a
/// direction goes straight to sysfs, a setting without either is a defect.
#[derive(Debug, Clone, Copy)]
pub struct SettingDescriptor {
    pub name: &'static str,
    pub abbr: &'static str,
    /// Parameter synopsis shown in the usage line
    pub usage: &'static str,
    pub protocol_read: Option<ReadOp>,
    pub protocol_write: Option<WriteOp>,
    /// Entry name under the sysfs mesh directory
    pub legacy_entry: Option<&'static str>,
    /// Whether the setting exists per VLAN; both backends then address the
    /// VLAN, otherwise a VLAN target is refused.
    pub vlan_aware: bool,
    /// Accepted literal values; `None` accepts anything
    pub allowed_values: Option<&'static [&'static str]>,
    pub parse: Option<ParseHook>,
}

impl SettingDescriptor {
    /// Descriptor with no capability at all
    pub const fn bare(name: &'static str, abbr: &'static str, usage: &'static str) -> Self {
        Self {
            name,
            abbr,
            usage,
            protocol_read: None,
            protocol_write: None,
            legacy_entry: None,
            vlan_aware: false,
            allowed_values: None,
            parse: None,
        }
    }

    pub fn matches(&self, command: &str) -> bool {
        self.name == command || self.abbr == command
    }
}
