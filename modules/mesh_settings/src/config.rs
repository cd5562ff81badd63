//! Configuration for mesh settings access

use serde::Deserialize;
use std::path::PathBuf;

/// Mesh settings configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding one entry per network interface
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,

    /// Generic netlink family registered by batman-adv
    #[serde(default = "default_family_name")]
    pub family_name: String,

    /// Mesh interface used when none is given on the command line
    #[serde(default = "default_mesh_iface")]
    pub mesh_iface: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sysfs_root: default_sysfs_root(),
            family_name: default_family_name(),
            mesh_iface: default_mesh_iface(),
        }
    }
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys/class/net")
}

fn default_family_name() -> String {
    "batadv".to_string()
}

fn default_mesh_iface() -> String {
    "bat0".to_string()
}
