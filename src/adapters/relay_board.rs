//! Relay board adapter.
//!
//! Implements [`ActuatorPort`] over any set of
//! [`embedded_hal::digital::OutputPin`]s.  The reactor's board is
//! active-low: driving a pin low energises its relay.
//!
//! One logical illumination channel may fan out to several pins (the
//! reactor's main light is two lamps switched together).  Default BCM
//! wiring:
//!
//! | Output               | Pins    |
//! |----------------------|---------|
//! | Illumination 0       | 4, 17   |
//! | Capture lights A..F  | 27, 22, 5, 6, 13, 19 |

use embedded_hal::digital::{Error as _, OutputPin};
use log::{info, warn};

use crate::app::ports::ActuatorPort;
use crate::config::PICTURE_LIGHT_COUNT;
use crate::illumination::{ChannelId, MAX_ILLUMINATION_CHANNELS};

/// BCM numbers driving the main illumination.
pub const ILLUMINATION_PINS: [u8; 2] = [4, 17];

/// BCM numbers driving capture lights A..F.
pub const CAPTURE_LIGHT_PINS: [u8; PICTURE_LIGHT_COUNT] = [27, 22, 5, 6, 13, 19];

pub struct RelayBoard<P> {
    illumination: Vec<Vec<P>>,
    capture: Vec<Option<P>>,
    degas: Option<P>,
    active_low: bool,
    write_errors: u32,
}

impl<P: OutputPin> RelayBoard<P> {
    pub fn new(active_low: bool) -> Self {
        Self {
            illumination: Vec::new(),
            capture: (0..PICTURE_LIGHT_COUNT).map(|_| None).collect(),
            degas: None,
            active_low,
            write_errors: 0,
        }
    }

    /// Add the next logical illumination channel, driven by `pins`.
    /// Channels beyond the supported count are ignored.
    pub fn with_illumination(mut self, pins: Vec<P>) -> Self {
        if self.illumination.len() < MAX_ILLUMINATION_CHANNELS {
            self.illumination.push(pins);
        } else {
            warn!("Relay board: extra illumination channel ignored");
        }
        self
    }

    pub fn with_capture_light(mut self, index: usize, pin: P) -> Self {
        if let Some(slot) = self.capture.get_mut(index) {
            *slot = Some(pin);
        }
        self
    }

    pub fn with_degas_valve(mut self, pin: P) -> Self {
        self.degas = Some(pin);
        self
    }

    /// Release every relay.  Call once after construction.
    pub fn release_all(&mut self) {
        let level = self.level(false);
        let mut errors = 0;
        for pin in self
            .illumination
            .iter_mut()
            .flatten()
            .chain(self.capture.iter_mut().flatten())
            .chain(self.degas.iter_mut())
        {
            if drive(pin, level).is_err() {
                errors += 1;
            }
        }
        self.write_errors += errors;
        info!("Relay board released ({} write errors)", errors);
    }

    /// Pin writes that failed since construction.
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    /// Electrical level for a logical state.  `true` = high.
    fn level(&self, on: bool) -> bool {
        on != self.active_low
    }

    fn note(&mut self, what: ChannelId, result: Result<(), embedded_hal::digital::ErrorKind>) {
        if let Err(kind) = result {
            self.write_errors = self.write_errors.saturating_add(1);
            warn!("Relay write {:?} failed: {:?}", what, kind);
        }
    }
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), embedded_hal::digital::ErrorKind> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|e| e.kind())
}

impl<P: OutputPin> ActuatorPort for RelayBoard<P> {
    fn set_channel(&mut self, channel: ChannelId, on: bool) {
        let level = self.level(on);
        let result = match channel {
            ChannelId::Illumination(i) => match self.illumination.get_mut(i as usize) {
                Some(pins) => pins.iter_mut().try_for_each(|pin| drive(pin, level)),
                None => Ok(()),
            },
            ChannelId::CaptureLight(i) => match self.capture.get_mut(i as usize) {
                Some(Some(pin)) => drive(pin, level),
                _ => Ok(()),
            },
        };
        self.note(channel, result);
    }

    fn set_degas_valve(&mut self, open: bool) {
        let level = self.level(open);
        if let Some(pin) = self.degas.as_mut() {
            if let Err(kind) = drive(pin, level) {
                self.write_errors = self.write_errors.saturating_add(1);
                warn!("Degas valve write failed: {:?}", kind);
            }
        }
    }
}
