//! Block-average oxygen smoothing.
//!
//! Raw oxygen readings are accumulated into a fixed window.  When the
//! window fills, the estimate becomes the window mean (rounded to two
//! decimals) and the window empties.  Between fills the previous estimate
//! stays valid.  Non-overlapping blocks keep memory fixed and reject
//! sensor noise at the cost of responsiveness.

use heapless::Vec;

/// Readings per block.
pub const OXYGEN_WINDOW: usize = 15;

pub struct OxygenSmoother {
    window: Vec<f64, OXYGEN_WINDOW>,
    estimate: Option<f64>,
}

impl Default for OxygenSmoother {
    fn default() -> Self {
        Self::new()
    }
}

impl OxygenSmoother {
    pub fn new() -> Self {
        Self {
            window: Vec::new(),
            estimate: None,
        }
    }

    /// Add one reading.  Returns the new estimate when this reading
    /// completed a block.
    pub fn push(&mut self, oxygen: f64) -> Option<f64> {
        if !oxygen.is_finite() {
            return None;
        }
        // The window is drained whenever it fills, so there is always room.
        let _ = self.window.push(oxygen);
        if !self.window.is_full() {
            return None;
        }
        let mean = self.window.iter().sum::<f64>() / OXYGEN_WINDOW as f64;
        let rounded = (mean * 100.0).round() / 100.0;
        self.window.clear();
        self.estimate = Some(rounded);
        self.estimate
    }

    /// Latest completed block mean, if any block has completed.
    pub fn estimate(&self) -> Option<f64> {
        self.estimate
    }

    /// Readings waiting in the current block.
    pub fn pending(&self) -> usize {
        self.window.len()
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.estimate = None;
    }
}
