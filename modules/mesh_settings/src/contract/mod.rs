//! Contract layer - backend-agnostic types shared by every layer
//!
//! Nothing in here knows about netlink or sysfs.

pub mod error;
pub mod model;

pub use error::{LegacyError, SettingsError};
pub use model::{Direction, QueryOutcome, Report, SettingValue, Target, UnsupportedReason};
