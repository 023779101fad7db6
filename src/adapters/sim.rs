//! Simulated reactor hardware.
//!
//! Implements every hardware port in memory so the host binary can run a
//! full experiment without a relay board, camera or ADC.  The chemistry is
//! a first-order model: while the illumination is lit, dissolved oxygen
//! decays exponentially and headspace pressure follows it down.

use chrono::{Local, NaiveDateTime};
use log::debug;

use crate::app::ports::{ActuatorPort, Artifact, CameraPort, CaptureRequest, ClockPort, SensorPort};
use crate::error::IoError;
use crate::illumination::ChannelId;
use crate::sensors::SensorSample;
use crate::sensors::calibration::{ATMOSPHERIC_OXYGEN, PRESSURE_SPAN};

/// Per-second oxygen decay rate under illumination.
const DECAY_PER_SEC: f64 = 0.004;

pub struct SimulatedReactor {
    camera: Option<Box<dyn CameraPort>>,
    lit: Vec<ChannelId>,
    degas_open: bool,
    oxygen: f64,
    clock: f64,
    artifacts: Vec<String>,
    /// Fail the next N sensor polls (fault injection).
    pub sensor_faults: u32,
    /// Fail the next N captures (fault injection).
    pub capture_faults: u32,
}

impl Default for SimulatedReactor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedReactor {
    pub fn new() -> Self {
        Self {
            camera: None,
            lit: Vec::new(),
            degas_open: false,
            oxygen: ATMOSPHERIC_OXYGEN,
            clock: 0.0,
            artifacts: Vec::new(),
            sensor_faults: 0,
            capture_faults: 0,
        }
    }

    /// Hand captures to a real camera; the rest stays simulated.
    pub fn with_camera(mut self, camera: impl CameraPort + 'static) -> Self {
        self.camera = Some(Box::new(camera));
        self
    }

    /// Move the model forward by `secs`.
    pub fn advance(&mut self, secs: f64) {
        self.clock += secs;
        let illuminated = self
            .lit
            .iter()
            .any(|c| matches!(c, ChannelId::Illumination(_)));
        if illuminated {
            self.oxygen *= (-DECAY_PER_SEC * secs).exp();
            if self.oxygen < 0.005 {
                self.oxygen = 0.0;
            }
        }
    }

    pub fn oxygen(&self) -> f64 {
        self.oxygen
    }

    pub fn pressure(&self) -> f64 {
        PRESSURE_SPAN * self.oxygen / ATMOSPHERIC_OXYGEN
    }

    pub fn lit_channels(&self) -> &[ChannelId] {
        &self.lit
    }

    pub fn degas_open(&self) -> bool {
        self.degas_open
    }

    pub fn artifacts(&self) -> &[String] {
        &self.artifacts
    }
}

impl ActuatorPort for SimulatedReactor {
    fn set_channel(&mut self, channel: ChannelId, on: bool) {
        self.lit.retain(|c| *c != channel);
        if on {
            self.lit.push(channel);
        }
    }

    fn set_degas_valve(&mut self, open: bool) {
        self.degas_open = open;
    }
}

impl CameraPort for SimulatedReactor {
    fn capture(&mut self, request: &CaptureRequest) -> Result<Artifact, IoError> {
        if self.capture_faults > 0 {
            self.capture_faults -= 1;
            return Err(IoError::Timeout);
        }
        if let Some(camera) = self.camera.as_mut() {
            let artifact = camera.capture(request)?;
            self.artifacts.push(artifact.path.clone());
            return Ok(artifact);
        }
        debug!("sim capture {} [{}]", request.destination, request.annotation);
        self.artifacts.push(request.destination.clone());
        Ok(Artifact {
            path: request.destination.clone(),
        })
    }

    fn prepare_destination(&mut self, folder: &str) -> Result<(), IoError> {
        match self.camera.as_mut() {
            Some(camera) => camera.prepare_destination(folder),
            None => Ok(()),
        }
    }
}

impl SensorPort for SimulatedReactor {
    fn poll_sensors(&mut self) -> Result<SensorSample, IoError> {
        if self.sensor_faults > 0 {
            self.sensor_faults -= 1;
            return Err(IoError::Disconnected);
        }
        Ok(SensorSample {
            raw_pressure: self.pressure(),
            raw_oxygen: self.oxygen,
            timestamp: self.clock,
        })
    }

    fn reconnect(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}

impl ClockPort for SimulatedReactor {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
