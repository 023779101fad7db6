//! Phase record file adapter.
//!
//! Implements [`PhaseSource`] over the four-line `values.txt` written by
//! the reactor's remote-control tooling.  Reads are cheap, so the file is
//! re-read on every poll; the runtime rate-limits polling.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::app::ports::{ConfigError, PhaseSource};
use crate::photoperiod::{PhaseRecord, parse_record};

pub struct ValuesFile {
    path: PathBuf,
}

impl ValuesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Overwrite the record.
    pub fn write(&self, record: &PhaseRecord) -> Result<(), ConfigError> {
        record.validate()?;
        fs::write(&self.path, record.to_string()).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

impl PhaseSource for ValuesFile {
    fn read_phase(&mut self) -> Result<Option<PhaseRecord>, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Io(e.to_string())),
        };
        parse_record(&text)
            .map(Some)
            .map_err(|e| ConfigError::Corrupted(e.to_string()))
    }
}
