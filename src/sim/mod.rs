//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module draws, plays sound
//! or touches storage:
//! - Seeded RNG only
//! - Stable iteration order (insertion order)
//! - Time advances only through `tick`

pub mod collision;
pub mod entity;
pub mod factory;
pub mod progression;
pub mod state;
pub mod tick;

pub use collision::{CombatReport, PickupEffect, resolve};
pub use entity::{
    Body, DamageOutcome, Enemy, EnemyKind, Entity, Owner, Player, PowerUp, PowerUpKind, Projectile,
};
pub use factory::Formation;
pub use progression::{LevelInfo, ProgressionPhase, WaveDirector, WaveTick};
pub use state::{GamePhase, GameState};
pub use tick::{TickInput, TickSummary, tick};
