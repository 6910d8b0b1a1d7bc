//! Star Runner - wave-based arcade shooter core
//!
//! Core modules:
//! - `sim`: Simulation (entities, factory, collisions, wave progression, tick)
//! - `levels`: Level data, validation, async loading and caching
//! - `session`: Session orchestrator (menu/loading/playing/paused/game over)
//! - `events`: Notification bus for UI/audio collaborators
//! - `persistence`: Save/load of settings, scores and statistics
//! - `render`: Read-only render snapshot for an external renderer
//! - `platform`: Input snapshot and frame clock adapters

pub mod error;
pub mod events;
pub mod highscores;
pub mod levels;
pub mod persistence;
pub mod platform;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{LevelError, SessionError, StorageError, ValidationError};
pub use events::{EventBus, EventKind, GameEvent, SubscriptionId};
pub use highscores::HighScores;
pub use levels::{CatalogSource, LevelData, LevelLibrary, LevelSource, PreloadOutcome, WaveSpec};
pub use persistence::Persistence;
pub use platform::{FrameClock, InputSource, KeyboardState};
pub use session::Session;
pub use settings::{QualityPreset, Settings};
pub use sim::{GamePhase, TickInput, TickSummary};

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions (pixels)
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;
    /// Entities further than this outside the playfield are culled
    pub const CULL_MARGIN: f32 = 50.0;

    /// Largest frame delta fed to the simulation (tab switches, hitches)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Player defaults
    pub const PLAYER_START_X: f32 = 385.0;
    pub const PLAYER_START_Y: f32 = 500.0;
    pub const PLAYER_WIDTH: f32 = 30.0;
    pub const PLAYER_HEIGHT: f32 = 40.0;
    pub const PLAYER_SPEED: f32 = 300.0;
    pub const PLAYER_MAX_HEALTH: i32 = 3;
    pub const PLAYER_FIRE_COOLDOWN: f32 = 0.2;
    pub const RAPID_FIRE_COOLDOWN: f32 = 0.1;
    /// Grace window after a hit
    pub const INVULNERABILITY_SECS: f32 = 2.0;

    /// Projectiles
    pub const PROJECTILE_WIDTH: f32 = 4.0;
    pub const PROJECTILE_HEIGHT: f32 = 10.0;
    pub const PLAYER_SHOT_SPEED: f32 = -500.0;
    pub const ENEMY_SHOT_SPEED: f32 = 300.0;
    /// Horizontal spread of the multi-shot side barrels
    pub const MULTI_SHOT_SPREAD: f32 = 0.3;

    /// Power-ups
    pub const POWER_UP_SIZE: f32 = 20.0;
    pub const POWER_UP_FALL_SPEED: f32 = 100.0;
    pub const POWER_UP_DURATION: f32 = 10.0;
    /// Seconds between random power-up spawn attempts
    pub const POWER_UP_SPAWN_INTERVAL: f32 = 15.0;
    pub const POWER_UP_SPAWN_Y: f32 = -20.0;
    /// Drop chance used when a wave doesn't specify one
    pub const DEFAULT_POWER_UP_CHANCE: f32 = 0.1;

    /// Enemy spawn line (above the visible playfield)
    pub const ENEMY_SPAWN_Y: f32 = -50.0;
    /// Range for formation centres
    pub const FORMATION_MIN_X: f32 = 100.0;
    pub const FORMATION_MAX_X: f32 = 700.0;
    /// Range for single-enemy spawns
    pub const SINGLE_SPAWN_MAX_X: f32 = 750.0;
}
