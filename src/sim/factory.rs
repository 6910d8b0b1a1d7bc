//! Entity factory
//!
//! Pure construction helpers. Unknown names never fail: an unrecognised enemy
//! type becomes a basic enemy, an unknown formation becomes a single basic
//! enemy, and an invalid power-up kind is replaced by a random valid one.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::entity::{Enemy, EnemyKind, Owner, Player, PowerUp, PowerUpKind, Projectile};

/// Named spatial arrangements for formation spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formation {
    Diamond,
    Line,
    VFormation,
    Single,
}

impl Formation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Formation::Diamond => "diamond",
            Formation::Line => "line",
            Formation::VFormation => "v-formation",
            Formation::Single => "single",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "diamond" => Some(Formation::Diamond),
            "line" => Some(Formation::Line),
            "v-formation" | "v" => Some(Formation::VFormation),
            "single" => Some(Formation::Single),
            _ => None,
        }
    }

    /// Enemy placements as (kind, offset from centre)
    pub fn placements(&self) -> Vec<(EnemyKind, Vec2)> {
        match self {
            Formation::Diamond => vec![
                (EnemyKind::Basic, Vec2::new(0.0, -40.0)),
                (EnemyKind::Basic, Vec2::new(-30.0, 0.0)),
                (EnemyKind::Fast, Vec2::new(0.0, 0.0)),
                (EnemyKind::Basic, Vec2::new(30.0, 0.0)),
                (EnemyKind::Basic, Vec2::new(0.0, 40.0)),
            ],
            Formation::Line => (0..5)
                .map(|i| (EnemyKind::Basic, Vec2::new((i as f32 - 2.0) * 40.0, 0.0)))
                .collect(),
            Formation::VFormation => (0..5)
                .map(|i| {
                    let offset = (i as f32 - 2.0).abs() * 30.0;
                    (EnemyKind::Fast, Vec2::new((i as f32 - 2.0) * 40.0, offset))
                })
                .collect(),
            Formation::Single => vec![(EnemyKind::Basic, Vec2::ZERO)],
        }
    }
}

pub fn create_player(x: f32, y: f32) -> Player {
    Player::new(x, y)
}

/// Create an enemy by type name, falling back to `basic`
pub fn create_enemy(kind: &str, x: f32, y: f32) -> Enemy {
    let kind = EnemyKind::from_name(kind).unwrap_or_else(|| {
        log::debug!("Unknown enemy type '{}', spawning basic", kind);
        EnemyKind::Basic
    });
    Enemy::new(kind, x, y)
}

/// Expand a named formation around a centre point
pub fn create_enemy_formation(pattern: &str, center_x: f32, center_y: f32) -> Vec<Enemy> {
    let formation = Formation::from_name(pattern).unwrap_or(Formation::Single);
    let center = Vec2::new(center_x, center_y);
    formation
        .placements()
        .into_iter()
        .map(|(kind, offset)| {
            let pos = center + offset;
            Enemy::new(kind, pos.x, pos.y)
        })
        .collect()
}

/// Horizontal row of `count` enemies starting at (x, y)
pub fn create_enemy_row(kind: &str, count: u32, x: f32, y: f32, spacing: f32) -> Vec<Enemy> {
    (0..count)
        .map(|i| create_enemy(kind, x + i as f32 * spacing, y))
        .collect()
}

/// Create a power-up, substituting a random valid kind for an invalid name
pub fn create_power_up(kind: &str, x: f32, y: f32, rng: &mut impl Rng) -> PowerUp {
    let kind = PowerUpKind::from_name(kind).unwrap_or_else(|| random_power_up_kind(rng));
    PowerUp::new(kind, x, y)
}

pub fn random_power_up_kind(rng: &mut impl Rng) -> PowerUpKind {
    PowerUpKind::ALL
        .choose(rng)
        .copied()
        .unwrap_or(PowerUpKind::Health)
}

pub fn create_projectile(x: f32, y: f32, direction: f32, speed: f32, owner: Owner) -> Projectile {
    Projectile::new(x, y, direction, speed, owner)
}
