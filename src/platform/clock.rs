//! Frame timing

use crate::consts::MAX_FRAME_DT;

/// Nominal frame time used for the first frame
pub const NOMINAL_FRAME_DT: f32 = 1.0 / 60.0;

const FPS_WINDOW: usize = 60;

/// Converts host frame timestamps (ms) into clamped deltas and tracks FPS
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_time: Option<f64>,
    frame_times: [f64; FPS_WINDOW],
    frame_index: usize,
    fps: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_time: None,
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            fps: 0,
        }
    }

    /// Seconds since the previous frame, clamped to `[0, MAX_FRAME_DT]`
    pub fn frame(&mut self, time_ms: f64) -> f32 {
        let dt = match self.last_time {
            Some(last) => ((time_ms - last) / 1000.0) as f32,
            None => NOMINAL_FRAME_DT,
        };
        self.last_time = Some(time_ms);

        self.frame_times[self.frame_index] = time_ms;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;
        // Oldest sample sits at the next write position once the ring is full
        let oldest = self.frame_times[self.frame_index];
        if oldest > 0.0 && time_ms > oldest {
            self.fps = ((FPS_WINDOW - 1) as f64 * 1000.0 / (time_ms - oldest)).round() as u32;
        }

        dt.clamp(0.0, MAX_FRAME_DT)
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Forget the last timestamp (e.g. after the tab was hidden)
    pub fn reset(&mut self) {
        self.last_time = None;
    }
}
