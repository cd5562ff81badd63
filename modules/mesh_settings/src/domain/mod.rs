//! Domain layer - backend arbitration for settings

pub mod backend;
pub mod descriptor;
pub mod dispatcher;
pub mod path;
pub mod validation;

pub use backend::{LegacyBackend, PrivilegeGuard};
pub use descriptor::{ParseHook, ReadOp, SettingDescriptor, WriteOp};
pub use dispatcher::SettingsDispatcher;
pub use path::SysfsLayout;
