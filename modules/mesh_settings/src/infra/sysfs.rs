//! sysfs implementation of the legacy backend

use crate::contract::LegacyError;
use crate::domain::LegacyBackend;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Reads and writes plain files below a resolved mesh directory
#[derive(Debug, Default, Clone, Copy)]
pub struct SysfsBackend;

fn map_io(path: PathBuf, source: io::Error) -> LegacyError {
    if source.kind() == io::ErrorKind::NotFound {
        LegacyError::NotFound { path }
    } else {
        LegacyError::Io { path, source }
    }
}

impl LegacyBackend for SysfsBackend {
    fn read(&self, dir: &Path, entry: &str) -> Result<String, LegacyError> {
        let path = dir.join(entry);
        tracing::debug!(path = %path.display(), "reading sysfs entry");
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(contents.trim_end_matches('\n').to_string()),
            Err(source) => Err(map_io(path, source)),
        }
    }

    fn write(
        &self,
        dir: &Path,
        entry: &str,
        value: &str,
        secondary: Option<&str>,
    ) -> Result<(), LegacyError> {
        let path = dir.join(entry);
        let line = match secondary {
            Some(secondary) => format!("{value} {secondary}"),
            None => value.to_string(),
        };
        tracing::debug!(path = %path.display(), %line, "writing sysfs entry");

        // sysfs attributes exist or they don't; never create one
        let mut file = match OpenOptions::new().write(true).truncate(true).open(&path) {
            Ok(file) => file,
            Err(source) => return Err(map_io(path, source)),
        };
        match file.write_all(line.as_bytes()) {
            Ok(()) => Ok(()),
            Err(source) => Err(map_io(path, source)),
        }
    }
}
