//! Illumination and capture-light output control.
//!
//! The relay board allows exactly one light to be energised at a time.
//! [`IlluminationController`] mirrors every output's state and enforces
//! that rule: switching any channel on first switches every other channel
//! off, so the hardware never sees two lights on together.
//!
//! ```text
//!  Illumination(0..n)   main reactor light(s)
//!  CaptureLight(0..6)   A=White B=Blue C=Green D=Yellow E=Red F=UV
//! ```

use heapless::Vec;
use log::{debug, info, warn};

use crate::app::ports::ActuatorPort;
use crate::config::PICTURE_LIGHT_COUNT;
use crate::error::{ReactorError, Result};

/// Upper bound on illumination-role channels.
pub const MAX_ILLUMINATION_CHANNELS: usize = 4;

const LETTERS: [char; PICTURE_LIGHT_COUNT] = ['A', 'B', 'C', 'D', 'E', 'F'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    Illumination,
    CaptureLight,
}

/// Address of one output on the relay board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Illumination(u8),
    CaptureLight(u8),
}

impl ChannelId {
    pub fn role(self) -> ChannelRole {
        match self {
            Self::Illumination(_) => ChannelRole::Illumination,
            Self::CaptureLight(_) => ChannelRole::CaptureLight,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Illumination(i) | Self::CaptureLight(i) => i as usize,
        }
    }

    /// Artifact letter for a capture light, `None` for illumination.
    pub fn letter(self) -> Option<char> {
        match self {
            Self::CaptureLight(i) => LETTERS.get(i as usize).copied(),
            Self::Illumination(_) => None,
        }
    }
}

/// Static description of one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub index: usize,
    pub role: ChannelRole,
    /// For capture lights: takes part in a capture batch.
    /// Illumination channels are always enabled.
    pub enabled: bool,
}

/// Result of a manual capture-light toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    SwitchedOn,
    SwitchedOff,
    /// A run is active; nothing changed.
    Rejected,
}

pub struct IlluminationController {
    illumination_on: Vec<bool, MAX_ILLUMINATION_CHANNELS>,
    capture_on: [bool; PICTURE_LIGHT_COUNT],
    capture_enabled: [bool; PICTURE_LIGHT_COUNT],
    /// Which illumination channel `set_illumination` drives.
    selected: usize,
}

impl IlluminationController {
    pub fn new(illumination_channels: usize, picture_lights: [bool; PICTURE_LIGHT_COUNT]) -> Self {
        let count = illumination_channels.clamp(1, MAX_ILLUMINATION_CHANNELS);
        let mut illumination_on = Vec::new();
        for _ in 0..count {
            let _ = illumination_on.push(false);
        }
        Self {
            illumination_on,
            capture_on: [false; PICTURE_LIGHT_COUNT],
            capture_enabled: picture_lights,
            selected: 0,
        }
    }

    // ── Illumination ──────────────────────────────────────────

    /// Switch the selected illumination channel.  Switching on forces
    /// every other channel (illumination and capture) off first.
    pub fn set_illumination(&mut self, on: bool, hw: &mut impl ActuatorPort) {
        self.switch_selected(on, hw);
    }

    /// Choose which illumination channel `set_illumination` drives.  A lit
    /// reactor moves over to the new channel at once.
    pub fn select_illumination(&mut self, index: usize, hw: &mut impl ActuatorPort) -> Result<()> {
        let limit = self.illumination_on.len();
        if index >= limit {
            return Err(ReactorError::InvalidChannel { index, limit });
        }
        if index == self.selected {
            return Ok(());
        }
        let lit = self.illumination_is_on();
        self.selected = index;
        if lit {
            self.switch_selected(true, hw);
        }
        Ok(())
    }

    /// Whether any illumination channel is energised.
    pub fn illumination_is_on(&self) -> bool {
        self.illumination_on.iter().any(|on| *on)
    }

    pub fn illumination_channel_count(&self) -> usize {
        self.illumination_on.len()
    }

    // ── Capture lights ────────────────────────────────────────

    /// Manual toggle of capture light `index`.  Refused while a run is
    /// active so it cannot interfere with scheduled batches.
    pub fn toggle_capture_light(
        &mut self,
        index: usize,
        running: bool,
        hw: &mut impl ActuatorPort,
    ) -> Result<ToggleOutcome> {
        if index >= PICTURE_LIGHT_COUNT {
            return Err(ReactorError::InvalidChannel {
                index,
                limit: PICTURE_LIGHT_COUNT,
            });
        }
        if running {
            warn!("Capture light {} toggle rejected: run active", LETTERS[index]);
            return Ok(ToggleOutcome::Rejected);
        }
        let id = ChannelId::CaptureLight(index as u8);
        if self.capture_on[index] {
            self.switch(id, false, hw);
            Ok(ToggleOutcome::SwitchedOff)
        } else {
            self.exclusive_on(id, hw);
            Ok(ToggleOutcome::SwitchedOn)
        }
    }

    /// Energise capture light `index` alone (used by capture batches).
    pub(crate) fn capture_light_on(&mut self, index: usize, hw: &mut impl ActuatorPort) {
        if index < PICTURE_LIGHT_COUNT {
            self.exclusive_on(ChannelId::CaptureLight(index as u8), hw);
        }
    }

    pub(crate) fn capture_light_off(&mut self, index: usize, hw: &mut impl ActuatorPort) {
        if index < PICTURE_LIGHT_COUNT {
            self.switch(ChannelId::CaptureLight(index as u8), false, hw);
        }
    }

    /// Capture lights taking part in a batch, in fixed A..F order.
    pub fn enabled_capture_lights(&self) -> impl Iterator<Item = usize> + '_ {
        self.capture_enabled
            .iter()
            .enumerate()
            .filter_map(|(i, enabled)| enabled.then_some(i))
    }

    pub fn set_picture_lights(&mut self, mask: [bool; PICTURE_LIGHT_COUNT]) {
        self.capture_enabled = mask;
    }

    // ── Whole board ───────────────────────────────────────────

    /// Release every output, whatever its mirrored state.
    pub fn all_off(&mut self, hw: &mut impl ActuatorPort) {
        for i in 0..self.illumination_on.len() {
            hw.set_channel(ChannelId::Illumination(i as u8), false);
            self.illumination_on[i] = false;
        }
        for i in 0..PICTURE_LIGHT_COUNT {
            hw.set_channel(ChannelId::CaptureLight(i as u8), false);
            self.capture_on[i] = false;
        }
        debug!("All channels off");
    }

    pub fn is_on(&self, id: ChannelId) -> bool {
        match id {
            ChannelId::Illumination(i) => self.illumination_on.get(i as usize).copied().unwrap_or(false),
            ChannelId::CaptureLight(i) => self.capture_on.get(i as usize).copied().unwrap_or(false),
        }
    }

    /// Number of energised outputs (0 or 1 by construction).
    pub fn active_count(&self) -> usize {
        self.illumination_on.iter().filter(|on| **on).count()
            + self.capture_on.iter().filter(|on| **on).count()
    }

    /// Static channel table, illumination first.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        let illumination = (0..self.illumination_on.len()).map(|index| Channel {
            index,
            role: ChannelRole::Illumination,
            enabled: true,
        });
        let capture = self.capture_enabled.iter().enumerate().map(|(index, enabled)| Channel {
            index,
            role: ChannelRole::CaptureLight,
            enabled: *enabled,
        });
        illumination.chain(capture)
    }

    // ── Internal ──────────────────────────────────────────────

    fn exclusive_on(&mut self, id: ChannelId, hw: &mut impl ActuatorPort) {
        for i in 0..self.illumination_on.len() {
            let other = ChannelId::Illumination(i as u8);
            if other != id && self.illumination_on[i] {
                self.switch(other, false, hw);
            }
        }
        for i in 0..PICTURE_LIGHT_COUNT {
            let other = ChannelId::CaptureLight(i as u8);
            if other != id && self.capture_on[i] {
                self.switch(other, false, hw);
            }
        }
        self.switch(id, true, hw);
        info!("Channel {:?} on", id);
    }

    /// `selected` only changes through `select_illumination`, which
    /// checks it against the channel count.
    fn switch_selected(&mut self, on: bool, hw: &mut impl ActuatorPort) {
        let id = ChannelId::Illumination(self.selected as u8);
        if on {
            self.exclusive_on(id, hw);
        } else {
            self.switch(id, false, hw);
        }
    }

    fn switch(&mut self, id: ChannelId, on: bool, hw: &mut impl ActuatorPort) {
        hw.set_channel(id, on);
        match id {
            ChannelId::Illumination(i) => self.illumination_on[i as usize] = on,
            ChannelId::CaptureLight(i) => self.capture_on[i as usize] = on,
        }
    }
}
