//! Render snapshot
//!
//! The core never draws. Each frame the external renderer asks for a
//! [`RenderSnapshot`]: a flat list of GPU-friendly sprite instances plus the
//! HUD values.

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use crate::sim::entity::{Body, Enemy, EnemyKind, Entity, Owner, Player, PowerUp, PowerUpKind, Projectile};
use crate::sim::progression::LevelInfo;
use crate::sim::state::{GamePhase, GameState};

/// Player is in its post-hit grace window (draw flashing)
pub const FLAG_FLASHING: u32 = 1 << 0;
/// Player has an active shield
pub const FLAG_SHIELDED: u32 = 1 << 1;

/// Sprite type tag stored in [`SpriteInstance::kind`]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Player = 0,
    EnemyBasic = 1,
    EnemyFast = 2,
    EnemyBoss = 3,
    EnemyHeavy = 4,
    EnemyAlien = 5,
    EnemyElite = 6,
    PlayerShot = 7,
    EnemyShot = 8,
    PowerUpRapidFire = 9,
    PowerUpMultiShot = 10,
    PowerUpHealth = 11,
    PowerUpShield = 12,
}

/// One drawable entity, laid out for an instance buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Top-left corner
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub color: [f32; 4],
    /// Remaining health fraction (0-1) for health bars
    pub health: f32,
    /// Animation phase (power-up bob)
    pub phase: f32,
    pub kind: u32,
    pub flags: u32,
}

impl SpriteInstance {
    pub fn from_body(body: &Body, kind: SpriteKind, color: [f32; 4]) -> Self {
        Self {
            position: body.pos.to_array(),
            size: body.size.to_array(),
            color,
            health: 1.0,
            phase: 0.0,
            kind: kind as u32,
            flags: 0,
        }
    }

    pub fn with_health(mut self, fraction: f32) -> Self {
        self.health = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

impl From<&Player> for SpriteInstance {
    fn from(player: &Player) -> Self {
        let mut flags = 0;
        if player.invulnerable_timer > 0.0 {
            flags |= FLAG_FLASHING;
        }
        if player.has_power_up(PowerUpKind::Shield) {
            flags |= FLAG_SHIELDED;
        }
        Self::from_body(&player.body, SpriteKind::Player, colors::PLAYER)
            .with_health(player.body.health as f32 / player.max_health as f32)
            .with_flags(flags)
    }
}

impl From<&Enemy> for SpriteInstance {
    fn from(enemy: &Enemy) -> Self {
        let (kind, color) = match enemy.kind {
            EnemyKind::Basic => (SpriteKind::EnemyBasic, colors::ENEMY_BASIC),
            EnemyKind::Fast => (SpriteKind::EnemyFast, colors::ENEMY_FAST),
            EnemyKind::Boss => (SpriteKind::EnemyBoss, colors::ENEMY_BOSS),
            EnemyKind::Heavy => (SpriteKind::EnemyHeavy, colors::ENEMY_HEAVY),
            EnemyKind::Alien => (SpriteKind::EnemyAlien, colors::ENEMY_ALIEN),
            EnemyKind::Elite => (SpriteKind::EnemyElite, colors::ENEMY_ELITE),
        };
        Self::from_body(&enemy.body, kind, color)
            .with_health(enemy.body.health.max(0) as f32 / enemy.max_health as f32)
    }
}

impl From<&Projectile> for SpriteInstance {
    fn from(projectile: &Projectile) -> Self {
        let (kind, color) = match projectile.owner {
            Owner::Player => (SpriteKind::PlayerShot, colors::PLAYER_SHOT),
            Owner::Enemy => (SpriteKind::EnemyShot, colors::ENEMY_SHOT),
        };
        Self::from_body(&projectile.body, kind, color)
    }
}

impl From<&PowerUp> for SpriteInstance {
    fn from(power_up: &PowerUp) -> Self {
        let kind = match power_up.kind {
            PowerUpKind::RapidFire => SpriteKind::PowerUpRapidFire,
            PowerUpKind::MultiShot => SpriteKind::PowerUpMultiShot,
            PowerUpKind::Health => SpriteKind::PowerUpHealth,
            PowerUpKind::Shield => SpriteKind::PowerUpShield,
        };
        Self::from_body(&power_up.body, kind, colors::POWER_UP).with_phase(power_up.bob)
    }
}

/// HUD values shown next to the playfield
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub phase: GamePhase,
    pub score: u64,
    pub lives: i32,
    pub level: Option<LevelInfo>,
    /// Active power-ups with remaining seconds
    pub power_ups: Vec<(PowerUpKind, f32)>,
}

/// Read-only view of everything on screen
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    /// Draw order: enemies, projectiles, power-ups, player
    pub sprites: Vec<SpriteInstance>,
    pub hud: Hud,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState, level: Option<LevelInfo>) -> Self {
        let mut sprites = Vec::with_capacity(
            state.enemies.len() + state.projectiles.len() + state.power_ups.len() + 1,
        );
        sprites.extend(state.enemies.iter().map(SpriteInstance::from));
        sprites.extend(state.projectiles.iter().map(SpriteInstance::from));
        sprites.extend(state.power_ups.iter().map(SpriteInstance::from));
        if state.player.is_active() {
            sprites.push(SpriteInstance::from(&state.player));
        }

        Self {
            sprites,
            hud: Hud {
                phase: state.phase,
                score: state.score,
                lives: state.lives(),
                level,
                power_ups: state.power_up_timers(),
            },
        }
    }

    /// Raw instance buffer contents
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sprites)
    }
}

/// Colors for game elements
pub mod colors {
    pub const PLAYER: [f32; 4] = [0.0, 1.0, 0.53, 1.0];
    pub const ENEMY_BASIC: [f32; 4] = [1.0, 0.27, 0.27, 1.0];
    pub const ENEMY_FAST: [f32; 4] = [1.0, 0.67, 0.0, 1.0];
    pub const ENEMY_BOSS: [f32; 4] = [0.67, 0.0, 1.0, 1.0];
    pub const ENEMY_HEAVY: [f32; 4] = [0.53, 0.27, 1.0, 1.0];
    pub const ENEMY_ALIEN: [f32; 4] = [0.27, 1.0, 0.53, 1.0];
    pub const ENEMY_ELITE: [f32; 4] = [1.0, 1.0, 0.27, 1.0];
    pub const PLAYER_SHOT: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
    pub const ENEMY_SHOT: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    pub const POWER_UP: [f32; 4] = [1.0, 0.42, 0.21, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.0, 0.0, 0.07, 1.0];
}
