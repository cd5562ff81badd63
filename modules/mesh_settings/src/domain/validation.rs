//! Value validation for setting writes

use crate::contract::{SettingValue, SettingsError};

/// Values accepted by on/off settings, in the order they are listed to users
pub const BOOLEAN_VALUES: &[&str] = &["enable", "disable", "1", "0"];

/// Check `value` against an allow-list: literal, case-sensitive, whole-string.
pub fn check_allowed(value: &str, allowed: &'static [&'static str]) -> Result<(), SettingsError> {
    if allowed.iter().any(|candidate| *candidate == value) {
        return Ok(());
    }
    Err(SettingsError::InvalidValue {
        value: value.to_string(),
        allowed,
    })
}

/// Interpret an on/off argument
pub fn parse_bool(value: &str) -> Result<bool, SettingsError> {
    match value {
        "enable" | "enabled" | "1" => Ok(true),
        "disable" | "disabled" | "0" => Ok(false),
        other => Err(SettingsError::validation(format!(
            "the supplied argument is not a boolean: {other}"
        ))),
    }
}

/// Parse an unsigned integer, picking the base like strtoul(..., 0): `0x`
/// prefix for hex, leading `0` for octal, decimal otherwise. An optional `+`
/// may precede the prefix.
///
/// Stricter than strtoul: the whole string must be digits of the base, so
/// `0x` alone, trailing garbage and negative numbers are rejected.
pub fn parse_c_ulong(value: &str) -> Option<u64> {
    let value = value.trim();
    let value = value.strip_prefix('+').unwrap_or(value);
    let (digits, radix) = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None if value.len() > 1 && value.starts_with('0') => (&value[1..], 8),
        None => (value, 10),
    };
    // from_str_radix would take a second sign
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

pub fn parse_u8(name: &str, value: &str) -> Result<u8, SettingsError> {
    parse_c_ulong(value)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| {
            SettingsError::validation(format!("invalid {name} value '{value}' (0-255 expected)"))
        })
}

pub fn parse_u32(name: &str, value: &str) -> Result<u32, SettingsError> {
    parse_c_ulong(value)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| SettingsError::validation(format!("invalid {name} value '{value}'")))
}

/// Parse `value[/mask]`; a missing mask selects every bit.
pub fn parse_mark(value: &str) -> Result<SettingValue, SettingsError> {
    let (mark, mask) = match value.split_once('/') {
        Some((mark, mask)) => (mark, Some(mask)),
        None => (value, None),
    };
    let mark = parse_u32("isolation_mark", mark)?;
    let mask = match mask {
        Some(mask) => parse_u32("isolation_mark mask", mask)?,
        None => u32::MAX,
    };
    Ok(SettingValue::Mark { value: mark, mask })
}
