//! Catalog of supported settings

pub mod mesh;

use crate::domain::SettingDescriptor;
use serde::Serialize;

/// Every supported setting, in listing order
pub static SETTINGS: [&SettingDescriptor; 11] = [
    &mesh::AGGREGATION,
    &mesh::AP_ISOLATION,
    &mesh::BONDING,
    &mesh::BRIDGE_LOOP_AVOIDANCE,
    &mesh::DISTRIBUTED_ARP_TABLE,
    &mesh::FRAGMENTATION,
    &mesh::HOP_PENALTY,
    &mesh::ISOLATION_MARK,
    &mesh::MULTICAST_FORCEFLOOD,
    &mesh::NETWORK_CODING,
    &mesh::ORIG_INTERVAL,
];

/// Look a setting up by name or abbreviation
pub fn find(command: &str) -> Option<&'static SettingDescriptor> {
    SETTINGS
        .iter()
        .copied()
        .find(|descriptor| descriptor.matches(command))
}

/// Backend capabilities of one setting, for listings
#[derive(Debug, Clone, Serialize)]
pub struct SettingSummary {
    pub name: &'static str,
    pub abbr: &'static str,
    pub netlink_read: bool,
    pub netlink_write: bool,
    pub sysfs_entry: Option<&'static str>,
    pub per_vlan: bool,
    pub allowed_values: Option<&'static [&'static str]>,
}

impl From<&SettingDescriptor> for SettingSummary {
    fn from(descriptor: &SettingDescriptor) -> Self {
        Self {
            name: descriptor.name,
            abbr: descriptor.abbr,
            netlink_read: descriptor.protocol_read.is_some(),
            netlink_write: descriptor.protocol_write.is_some(),
            sysfs_entry: descriptor.legacy_entry,
            per_vlan: descriptor.vlan_aware,
            allowed_values: descriptor.allowed_values,
        }
    }
}

pub fn summaries() -> Vec<SettingSummary> {
    SETTINGS.iter().map(|descriptor| SettingSummary::from(*descriptor)).collect()
}
