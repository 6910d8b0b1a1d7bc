//! Platform adapters
//!
//! Thin glue between a host (browser, terminal, test harness) and the
//! simulation:
//! - Key state to [`TickInput`](crate::sim::TickInput) snapshots
//! - Frame timestamps to clamped deltas

pub mod clock;
pub mod input;

pub use clock::FrameClock;
pub use input::{InputSource, KeyboardState};
