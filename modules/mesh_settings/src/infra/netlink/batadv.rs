//! batman-adv generic netlink commands and attributes (subset)
//!
//! Numbering follows `include/uapi/linux/batman_adv.h`.

/// Commands of the `batadv` family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    GetMesh = 1,
    SetMesh = 15,
    GetVlan = 17,
    SetVlan = 18,
}

impl Command {
    pub fn code(self) -> u8 {
        self as u8
    }
}

pub mod attr {
    pub const MESH_IFINDEX: u16 = 3;
    pub const VLANID: u16 = 40;
    pub const AGGREGATED_OGMS_ENABLED: u16 = 41;
    pub const AP_ISOLATION_ENABLED: u16 = 42;
    pub const ISOLATION_MARK: u16 = 43;
    pub const ISOLATION_MASK: u16 = 44;
    pub const BONDING_ENABLED: u16 = 45;
    pub const BRIDGE_LOOP_AVOIDANCE_ENABLED: u16 = 46;
    pub const DISTRIBUTED_ARP_TABLE_ENABLED: u16 = 47;
    pub const FRAGMENTATION_ENABLED: u16 = 48;
    pub const HOP_PENALTY: u16 = 53;
    pub const MULTICAST_FORCEFLOOD_ENABLED: u16 = 55;
    pub const NETWORK_CODING_ENABLED: u16 = 56;
    pub const ORIG_INTERVAL: u16 = 57;
}

/// errno reported when the kernel does not implement an operation
pub const EOPNOTSUPP: i32 = 95;
