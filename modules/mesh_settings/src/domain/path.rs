//! sysfs path resolution for mesh interfaces and their VLANs

use std::path::{Path, PathBuf};

/// Where the legacy backend finds mesh interfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsLayout {
    root: PathBuf,
}

impl SysfsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<iface>/mesh` for the interface itself,
    /// `<root>/<iface>/mesh/vlan<vid>` for one of its VLANs.
    pub fn resolve(&self, mesh_iface: &str, vid: Option<u16>) -> PathBuf {
        let mesh = self.root.join(mesh_iface).join("mesh");
        match vid {
            Some(vid) => mesh.join(format!("vlan{vid}")),
            None => mesh,
        }
    }
}

impl Default for SysfsLayout {
    fn default() -> Self {
        Self::new("/sys/class/net")
    }
}
