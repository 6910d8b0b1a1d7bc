//! Game state
//!
//! Everything one session simulates lives here: the player, the live entity
//! collections, score counters and the seeded RNG.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Enemy, PowerUp, PowerUpKind, Player, Projectile};
use super::factory;
use crate::consts::*;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    /// Title screen, nothing simulated
    #[default]
    Menu,
    /// Level fetch outstanding; ticks are no-ops
    Loading,
    Playing,
    Paused,
    /// Run ended (see [`GameState::victory`])
    GameOver,
}

/// Authoritative simulation state for one session
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub score: u64,
    /// Seconds of simulated play
    pub elapsed: f32,
    pub player: Player,
    /// Live enemies in spawn order
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub power_ups: Vec<PowerUp>,
    pub enemies_defeated: u32,
    pub power_ups_collected: u32,
    /// Seconds since the last random power-up spawn
    pub power_up_timer: f32,
    /// Set when the run ends
    pub victory: Option<bool>,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            phase: GamePhase::Menu,
            score: 0,
            elapsed: 0.0,
            player: factory::create_player(PLAYER_START_X, PLAYER_START_Y),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            power_ups: Vec::new(),
            enemies_defeated: 0,
            power_ups_collected: 0,
            power_up_timer: 0.0,
            victory: None,
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Fresh run with the same seed; keeps the phase
    pub fn reset(&mut self) {
        let phase = self.phase;
        *self = Self::new(self.seed);
        self.phase = phase;
    }

    /// Lives shown on the HUD (the player's health)
    pub fn lives(&self) -> i32 {
        self.player.health().max(0)
    }

    /// Active timed power-ups with remaining seconds
    pub fn power_up_timers(&self) -> Vec<(PowerUpKind, f32)> {
        self.player
            .power_ups
            .iter()
            .map(|(kind, remaining)| (*kind, *remaining))
            .collect()
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}
