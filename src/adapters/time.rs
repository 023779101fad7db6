//! System time adapter.
//!
//! Provides the monotonic runtime clock the tick driver feeds into
//! [`ReactorRuntime::tick`](crate::app::runtime::ReactorRuntime::tick),
//! and local wall-clock time for artifact names.

use std::time::Instant;

use chrono::{Local, NaiveDateTime};

use crate::app::ports::ClockPort;

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since construction (monotonic).
    pub fn uptime_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl ClockPort for SystemClock {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
