//! Settings dispatcher - one read or write of one setting
//!
//! States of an invocation:
//! 1. parse options (`-h` only)
//! 2. refuse VLAN targets for mesh-wide settings, resolve the sysfs path
//! 3. no value argument: read, otherwise write
//! 4. netlink first, sysfs only when netlink reports the operation unsupported
//! 5. report: diagnostics go to the sink, the result decides the exit status

use super::backend::{LegacyBackend, PrivilegeGuard};
use super::descriptor::SettingDescriptor;
use super::path::SysfsLayout;
use super::validation;
use crate::contract::{Direction, QueryOutcome, Report, SettingValue, SettingsError, Target};
use crate::infra::netlink::Session;
use std::io::Write;
use std::path::Path;

/// Result of option parsing
#[derive(Debug, PartialEq, Eq)]
enum Options {
    Help,
    /// Index of the first value argument
    Values(usize),
}

/// Drives one settings invocation against both backends
pub struct SettingsDispatcher<'a> {
    session: &'a mut Session,
    legacy: &'a dyn LegacyBackend,
    privileges: &'a dyn PrivilegeGuard,
    layout: &'a SysfsLayout,
    diagnostics: &'a mut dyn Write,
    program: &'a str,
}

impl<'a> SettingsDispatcher<'a> {
    pub fn new(
        session: &'a mut Session,
        legacy: &'a dyn LegacyBackend,
        privileges: &'a dyn PrivilegeGuard,
        layout: &'a SysfsLayout,
        diagnostics: &'a mut dyn Write,
    ) -> Self {
        Self {
            session,
            legacy,
            privileges,
            layout,
            diagnostics,
            program: "meshctl",
        }
    }

    /// Program name used in the usage line
    pub fn with_program(mut self, program: &'a str) -> Self {
        self.program = program;
        self
    }

    /// Run one invocation. `argv[0]` is the setting command as typed.
    ///
    /// Every failure has already been described on the diagnostics sink when
    /// this returns.
    pub fn handle(
        &mut self,
        descriptor: &SettingDescriptor,
        target: &Target,
        argv: &[String],
    ) -> Result<Report, SettingsError> {
        let result = self.run(descriptor, target, argv);
        match &result {
            Ok(report) => {
                tracing::debug!(setting = descriptor.name, %target, ?report, "setting handled");
            }
            Err(err) => self.report_failure(descriptor, err),
        }
        result
    }

    fn run(
        &mut self,
        descriptor: &SettingDescriptor,
        target: &Target,
        argv: &[String],
    ) -> Result<Report, SettingsError> {
        let first_value = match parse_options(argv)? {
            Options::Help => {
                self.print_usage(descriptor);
                return Ok(Report::Help);
            }
            Options::Values(index) => index,
        };

        if let Some(vid) = target.vid.filter(|_| !descriptor.vlan_aware) {
            return Err(SettingsError::VlanNotSupported {
                setting: descriptor.name,
                vid,
            });
        }

        let path = self.layout.resolve(&target.mesh_iface, target.vid);
        let values = argv.get(first_value..).unwrap_or_default();

        if values.is_empty() {
            self.read_setting(descriptor, target, &path)
        } else {
            self.write_setting(descriptor, target, &path, values)
        }
    }

    fn read_setting(
        &mut self,
        descriptor: &SettingDescriptor,
        target: &Target,
        path: &Path,
    ) -> Result<Report, SettingsError> {
        if let Some(read) = descriptor.protocol_read {
            match read(self.session, target) {
                QueryOutcome::Success(value) => return Ok(Report::Value(value)),
                QueryOutcome::Failed(err) => return Err(err),
                QueryOutcome::Unsupported(reason) => {
                    tracing::debug!(setting = descriptor.name, %reason, "netlink read unsupported, trying sysfs");
                }
            }
        }

        let Some(entry) = descriptor.legacy_entry else {
            return Err(SettingsError::NotFound {
                setting: descriptor.name,
                direction: Direction::Read,
            });
        };
        let value = self.legacy.read(path, entry)?;
        Ok(Report::Value(value))
    }

    fn write_setting(
        &mut self,
        descriptor: &SettingDescriptor,
        target: &Target,
        path: &Path,
        values: &[String],
    ) -> Result<Report, SettingsError> {
        self.privileges.ensure_can_write(descriptor.name)?;

        let literal = &values[0];
        let value = match descriptor.parse {
            Some(parse) => parse(values)?,
            None => SettingValue::Raw(literal.clone()),
        };

        if let Some(allowed) = descriptor.allowed_values.filter(|list| !list.is_empty()) {
            validation::check_allowed(literal, allowed)?;
        }

        if let Some(write) = descriptor.protocol_write {
            match write(self.session, target, &value) {
                QueryOutcome::Success(()) => return Ok(Report::Written),
                QueryOutcome::Failed(err) => return Err(err),
                QueryOutcome::Unsupported(reason) => {
                    tracing::debug!(setting = descriptor.name, %reason, "netlink write unsupported, trying sysfs");
                }
            }
        }

        let Some(entry) = descriptor.legacy_entry else {
            return Err(SettingsError::NotFound {
                setting: descriptor.name,
                direction: Direction::Write,
            });
        };
        let secondary = values.get(1).map(String::as_str);
        self.legacy.write(path, entry, literal, secondary)?;
        Ok(Report::Written)
    }

    fn print_usage(&mut self, descriptor: &SettingDescriptor) {
        let _ = writeln!(
            self.diagnostics,
            "Usage: {} [options] {}|{} [parameters] {}",
            self.program, descriptor.name, descriptor.abbr, descriptor.usage
        );
        let _ = writeln!(self.diagnostics, "parameters:");
        let _ = writeln!(self.diagnostics, " \t -h print this help");
    }

    fn report_failure(&mut self, descriptor: &SettingDescriptor, err: &SettingsError) {
        tracing::debug!(setting = descriptor.name, error = %err, "setting failed");
        match err {
            SettingsError::Usage { .. } | SettingsError::VlanNotSupported { .. } => {
                let _ = writeln!(self.diagnostics, "{err}");
                self.print_usage(descriptor);
            }
            SettingsError::InvalidValue { allowed, .. } => {
                let _ = writeln!(self.diagnostics, "{err}");
                let _ = writeln!(self.diagnostics, "The following values are allowed:");
                for value in allowed.iter() {
                    let _ = writeln!(self.diagnostics, " * {value}");
                }
            }
            _ => {
                let _ = writeln!(self.diagnostics, "{err}");
            }
        }
    }
}

/// getopt-style scan for `-h`; stops at the first value or after `--`.
fn parse_options(argv: &[String]) -> Result<Options, SettingsError> {
    for (index, arg) in argv.iter().enumerate().skip(1) {
        if arg == "--" {
            return Ok(Options::Values(index + 1));
        }
        let Some(flags) = arg.strip_prefix('-').filter(|flags| !flags.is_empty()) else {
            return Ok(Options::Values(index));
        };
        for flag in flags.chars() {
            match flag {
                'h' => return Ok(Options::Help),
                other => return Err(SettingsError::Usage { flag: other }),
            }
        }
    }
    Ok(Options::Values(argv.len().max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_options_read() {
        assert_eq!(parse_options(&args(&["bonding"])).unwrap(), Options::Values(1));
    }

    #[test]
    fn test_parse_options_value() {
        assert_eq!(
            parse_options(&args(&["bonding", "1"])).unwrap(),
            Options::Values(1)
        );
    }

    #[test]
    fn test_parse_options_help() {
        assert_eq!(
            parse_options(&args(&["bonding", "-h"])).unwrap(),
            Options::Help
        );
    }

    #[test]
    fn test_parse_options_unknown_flag() {
        assert!(matches!(
            parse_options(&args(&["bonding", "-x"])),
            Err(SettingsError::Usage { flag: 'x' })
        ));
    }

    #[test]
    fn test_parse_options_double_dash() {
        assert_eq!(
            parse_options(&args(&["bonding", "--", "-h"])).unwrap(),
            Options::Values(2)
        );
    }

    #[test]
    fn test_parse_options_stops_at_first_value() {
        assert_eq!(
            parse_options(&args(&["bonding", "1", "-h"])).unwrap(),
            Options::Values(1)
        );
    }

    #[test]
    fn test_parse_options_empty_argv() {
        assert_eq!(parse_options(&[]).unwrap(), Options::Values(1));
    }
}
