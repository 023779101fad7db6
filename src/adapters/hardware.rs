//! Hardware adapter — bundles separate port implementations into one.
//!
//! The runtime takes a single `&mut impl Hardware`.  On a real reactor the
//! relay board, camera, ADC and clock are different adapters;
//! [`HardwareAdapter`] owns one of each and forwards every port call, so
//! any mix (relay board + simulated sensors, say) can drive the runtime.

use chrono::NaiveDateTime;

use crate::app::ports::{ActuatorPort, Artifact, CameraPort, CaptureRequest, ClockPort, SensorPort};
use crate::error::IoError;
use crate::illumination::ChannelId;
use crate::sensors::SensorSample;

pub struct HardwareAdapter<A, C, S, K> {
    pub actuators: A,
    pub camera: C,
    pub sensors: S,
    pub clock: K,
}

impl<A, C, S, K> HardwareAdapter<A, C, S, K> {
    pub fn new(actuators: A, camera: C, sensors: S, clock: K) -> Self {
        Self {
            actuators,
            camera,
            sensors,
            clock,
        }
    }
}

// ── ActuatorPort ──────────────────────────────────────────────

impl<A: ActuatorPort, C, S, K> ActuatorPort for HardwareAdapter<A, C, S, K> {
    fn set_channel(&mut self, channel: ChannelId, on: bool) {
        self.actuators.set_channel(channel, on);
    }

    fn set_degas_valve(&mut self, open: bool) {
        self.actuators.set_degas_valve(open);
    }
}

// ── CameraPort ────────────────────────────────────────────────

impl<A, C: CameraPort, S, K> CameraPort for HardwareAdapter<A, C, S, K> {
    fn capture(&mut self, request: &CaptureRequest) -> Result<Artifact, IoError> {
        self.camera.capture(request)
    }

    fn prepare_destination(&mut self, folder: &str) -> Result<(), IoError> {
        self.camera.prepare_destination(folder)
    }
}

// ── SensorPort ────────────────────────────────────────────────

impl<A, C, S: SensorPort, K> SensorPort for HardwareAdapter<A, C, S, K> {
    fn poll_sensors(&mut self) -> Result<SensorSample, IoError> {
        self.sensors.poll_sensors()
    }

    fn reconnect(&mut self) -> Result<(), IoError> {
        self.sensors.reconnect()
    }
}

// ── ClockPort ─────────────────────────────────────────────────

impl<A, C, S, K: ClockPort> ClockPort for HardwareAdapter<A, C, S, K> {
    fn local_now(&self) -> NaiveDateTime {
        self.clock.local_now()
    }
}
