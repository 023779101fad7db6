//! Light/dark photoperiod and the persisted phase record.
//!
//! The record is four lines of text:
//!
//! ```text
//! on          phase switch: "on" alternates light and dark, "off" stays lit
//! 30          light minutes
//! 15          dark minutes
//! 2.5         picture interval minutes
//! ```
//!
//! Parsing lives here so any [`PhaseSource`](crate::app::ports::PhaseSource)
//! can reuse it.

use core::fmt;

use crate::config::validate_interval;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseRecord {
    pub phase_on: bool,
    pub light_minutes: f64,
    pub dark_minutes: f64,
    pub picture_minutes: f64,
}

impl PhaseRecord {
    /// Continuous light, picture interval in minutes.
    pub fn continuous(picture_minutes: f64) -> Self {
        Self {
            phase_on: false,
            light_minutes: 0.0,
            dark_minutes: 0.0,
            picture_minutes,
        }
    }

    /// Range-check every field.  Returns the picture interval in seconds.
    pub fn validate(&self) -> Result<f64, ValidationError> {
        if self.phase_on {
            let ok = |m: f64| m.is_finite() && m >= 0.0;
            if !ok(self.light_minutes) || !ok(self.dark_minutes) {
                return Err(ValidationError::Config("photoperiod minutes must be non-negative"));
            }
            if self.light_minutes + self.dark_minutes <= 0.0 {
                return Err(ValidationError::Config("photoperiod has zero length"));
            }
        }
        validate_interval(self.picture_minutes * 60.0)
    }

    /// Whether illumination should be lit `elapsed_secs` into a run.
    pub fn light_on_at(&self, elapsed_secs: f64) -> bool {
        if !self.phase_on {
            return true;
        }
        let light = self.light_minutes * 60.0;
        let period = light + self.dark_minutes * 60.0;
        if period <= 0.0 {
            return true;
        }
        elapsed_secs.max(0.0) % period < light
    }
}

impl fmt::Display for PhaseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}",
            if self.phase_on { "on" } else { "off" },
            self.light_minutes,
            self.dark_minutes,
            self.picture_minutes
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    MissingLine(usize),
    BadPhase,
    BadNumber(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLine(n) => write!(f, "phase record: line {n} missing"),
            Self::BadPhase => write!(f, "phase record: first line must be on or off"),
            Self::BadNumber(n) => write!(f, "phase record: line {n} is not a number"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse the four-line record.  Extra trailing lines are ignored.
pub fn parse_record(text: &str) -> Result<PhaseRecord, ParseError> {
    let mut lines = text.lines().map(str::trim);

    let phase_on = match lines.next() {
        Some(l) if l.eq_ignore_ascii_case("on") => true,
        Some(l) if l.eq_ignore_ascii_case("off") => false,
        Some(_) => return Err(ParseError::BadPhase),
        None => return Err(ParseError::MissingLine(1)),
    };

    let mut number = |n: usize| -> Result<f64, ParseError> {
        let line = lines.next().ok_or(ParseError::MissingLine(n))?;
        line.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(ParseError::BadNumber(n))
    };

    Ok(PhaseRecord {
        phase_on,
        light_minutes: number(2)?,
        dark_minutes: number(3)?,
        picture_minutes: number(4)?,
    })
}
