//! Infrastructure layer - kernel facing backends

pub mod netlink;
pub mod privilege;
pub mod sysfs;

pub use privilege::EffectiveUidGuard;
pub use sysfs::SysfsBackend;
