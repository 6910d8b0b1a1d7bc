//! Entity model
//!
//! Every entity shares one [`Body`] record (bounds, velocity, health, active
//! flag). The closed set of variants (player, enemy, projectile, power-up)
//! implements [`Entity`] for update and damage. Drawing lives in
//! [`crate::render`].

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::tick::TickInput;
use crate::consts::*;

/// Spatial/health record shared by all entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub health: i32,
    pub active: bool,
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Entity was invulnerable; nothing changed
    Ignored,
    /// Health dropped but the entity is still alive (or was already inactive)
    Damaged { health: i32 },
    /// This hit took the entity from active to inactive
    Destroyed,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
            vel: Vec2::ZERO,
            health: 1,
            active: true,
        }
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = health;
        self
    }

    /// Move by velocity * dt
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict AABB overlap; touching edges don't collide
    pub fn overlaps(&self, other: &Body) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && self.pos.x + self.size.x > other.pos.x
            && self.pos.y < other.pos.y + other.size.y
            && self.pos.y + self.size.y > other.pos.y
    }

    /// Subtract health, deactivating at or below zero. Never reactivates.
    pub fn apply_damage(&mut self, amount: i32) -> DamageOutcome {
        self.health -= amount;
        if self.health <= 0 {
            let was_active = self.active;
            self.active = false;
            if was_active {
                return DamageOutcome::Destroyed;
            }
        }
        DamageOutcome::Damaged {
            health: self.health,
        }
    }

    /// Fell past the bottom edge by more than `margin`
    pub fn below_playfield(&self, margin: f32) -> bool {
        self.pos.y >= PLAYFIELD_HEIGHT + margin
    }

    /// Left the playfield on any side by more than `margin`
    pub fn outside_playfield(&self, margin: f32) -> bool {
        self.pos.x <= -margin
            || self.pos.x >= PLAYFIELD_WIDTH + margin
            || self.pos.y <= -margin
            || self.pos.y >= PLAYFIELD_HEIGHT + margin
    }
}

/// Side effects produced while an entity advances one tick
#[derive(Debug, Default)]
pub struct UpdateEffects {
    /// Projectiles fired this tick
    pub projectiles: Vec<Projectile>,
    /// Timed power-ups that ran out this tick
    pub expired: Vec<PowerUpKind>,
}

/// Capabilities shared by every entity variant
pub trait Entity {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    /// Advance one tick
    fn update(&mut self, dt: f32) -> UpdateEffects {
        self.body_mut().integrate(dt);
        UpdateEffects::default()
    }

    fn is_active(&self) -> bool {
        self.body().active
    }

    fn deactivate(&mut self) {
        self.body_mut().active = false;
    }

    /// Symmetric AABB overlap test
    fn check_collision(&self, other: &dyn Entity) -> bool {
        self.body().overlaps(other.body())
    }

    fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        self.body_mut().apply_damage(amount)
    }

    /// Whether cleanup should drop this entity
    fn is_out_of_bounds(&self) -> bool {
        self.body().below_playfield(CULL_MARGIN)
    }
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub max_health: i32,
    pub speed: f32,
    /// Base cooldown between shots
    pub fire_cooldown: f32,
    /// Seconds since the last shot
    pub since_last_shot: f32,
    /// Remaining grace window after a hit
    pub invulnerable_timer: f32,
    /// Active timed power-ups and their remaining seconds
    pub power_ups: BTreeMap<PowerUpKind, f32>,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            body: Body::new(x, y, PLAYER_WIDTH, PLAYER_HEIGHT).with_health(PLAYER_MAX_HEALTH),
            max_health: PLAYER_MAX_HEALTH,
            speed: PLAYER_SPEED,
            fire_cooldown: PLAYER_FIRE_COOLDOWN,
            since_last_shot: 0.0,
            invulnerable_timer: 0.0,
            power_ups: BTreeMap::new(),
        }
    }

    pub fn health(&self) -> i32 {
        self.body.health
    }

    /// Set velocity from the held directions
    pub fn steer(&mut self, input: &TickInput) {
        let mut vel = Vec2::ZERO;
        if input.left {
            vel.x = -self.speed;
        }
        if input.right {
            vel.x = self.speed;
        }
        if input.up {
            vel.y = -self.speed;
        }
        if input.down {
            vel.y = self.speed;
        }
        self.body.vel = vel;
    }

    /// In the post-hit grace window or shielded
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0 || self.power_ups.contains_key(&PowerUpKind::Shield)
    }

    pub fn has_power_up(&self, kind: PowerUpKind) -> bool {
        self.power_ups.contains_key(&kind)
    }

    pub fn power_up_remaining(&self, kind: PowerUpKind) -> Option<f32> {
        self.power_ups.get(&kind).copied()
    }

    /// Start or refresh a timed power-up, returning its duration
    pub fn add_power_up(&mut self, kind: PowerUpKind) -> f32 {
        self.power_ups.insert(kind, POWER_UP_DURATION);
        POWER_UP_DURATION
    }

    /// Restore one point of health. Returns false at full health.
    pub fn heal(&mut self) -> bool {
        if self.body.health < self.max_health {
            self.body.health += 1;
            true
        } else {
            false
        }
    }

    /// Current cooldown (halved under rapid fire)
    pub fn current_fire_cooldown(&self) -> f32 {
        if self.has_power_up(PowerUpKind::RapidFire) {
            RAPID_FIRE_COOLDOWN
        } else {
            self.fire_cooldown
        }
    }

    /// Fire if the cooldown has elapsed
    pub fn shoot(&mut self) -> Vec<Projectile> {
        if self.since_last_shot < self.current_fire_cooldown() {
            return Vec::new();
        }
        self.since_last_shot = 0.0;

        let x = self.body.pos.x + self.body.size.x / 2.0 - PROJECTILE_WIDTH / 2.0;
        let y = self.body.pos.y;
        let directions: &[f32] = if self.has_power_up(PowerUpKind::MultiShot) {
            &[0.0, -MULTI_SHOT_SPREAD, MULTI_SHOT_SPREAD]
        } else {
            &[0.0]
        };

        directions
            .iter()
            .map(|&dir| Projectile::new(x, y, dir, PLAYER_SHOT_SPEED, Owner::Player))
            .collect()
    }
}

impl Entity for Player {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, dt: f32) -> UpdateEffects {
        self.body.integrate(dt);
        self.body.pos.x = self.body.pos.x.clamp(0.0, PLAYFIELD_WIDTH - self.body.size.x);
        self.body.pos.y = self.body.pos.y.clamp(0.0, PLAYFIELD_HEIGHT - self.body.size.y);

        self.since_last_shot += dt;
        self.invulnerable_timer = (self.invulnerable_timer - dt).max(0.0);

        let mut expired = Vec::new();
        for (kind, remaining) in self.power_ups.iter_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                expired.push(*kind);
            }
        }
        for kind in &expired {
            self.power_ups.remove(kind);
        }

        UpdateEffects {
            expired,
            ..Default::default()
        }
    }

    /// Ignored silently while invulnerable; otherwise opens a new grace window
    fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if self.is_invulnerable() {
            return DamageOutcome::Ignored;
        }
        let outcome = self.body.apply_damage(amount);
        self.invulnerable_timer = INVULNERABILITY_SECS;
        outcome
    }
}

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnemyKind {
    #[default]
    Basic,
    Fast,
    Boss,
    Heavy,
    Alien,
    Elite,
}

/// Per-kind constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    /// Square side length
    pub size: f32,
    pub health: i32,
    pub speed: f32,
    pub points: u32,
    /// Seconds between shots (None = never fires)
    pub fire_interval: Option<f32>,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Basic,
        EnemyKind::Fast,
        EnemyKind::Boss,
        EnemyKind::Heavy,
        EnemyKind::Alien,
        EnemyKind::Elite,
    ];

    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Basic => EnemyStats {
                size: 25.0,
                health: 1,
                speed: 100.0,
                points: 100,
                fire_interval: None,
            },
            EnemyKind::Fast => EnemyStats {
                size: 20.0,
                health: 1,
                speed: 200.0,
                points: 200,
                fire_interval: None,
            },
            EnemyKind::Boss => EnemyStats {
                size: 60.0,
                health: 10,
                speed: 50.0,
                points: 1000,
                fire_interval: Some(1.0),
            },
            EnemyKind::Heavy => EnemyStats {
                size: 35.0,
                health: 3,
                speed: 60.0,
                points: 300,
                fire_interval: Some(2.0),
            },
            EnemyKind::Alien => EnemyStats {
                size: 25.0,
                health: 2,
                speed: 130.0,
                points: 200,
                fire_interval: None,
            },
            EnemyKind::Elite => EnemyStats {
                size: 30.0,
                health: 4,
                speed: 80.0,
                points: 350,
                fire_interval: Some(1.5),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Basic => "basic",
            EnemyKind::Fast => "fast",
            EnemyKind::Boss => "boss",
            EnemyKind::Heavy => "heavy",
            EnemyKind::Alien => "alien",
            EnemyKind::Elite => "elite",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Some(EnemyKind::Basic),
            "fast" => Some(EnemyKind::Fast),
            "boss" => Some(EnemyKind::Boss),
            "heavy" => Some(EnemyKind::Heavy),
            "alien" => Some(EnemyKind::Alien),
            "elite" => Some(EnemyKind::Elite),
            _ => None,
        }
    }
}

/// Alien sway amplitude (px/s) and frequency (rad/s)
const ALIEN_SWAY_SPEED: f32 = 80.0;
const ALIEN_SWAY_FREQ: f32 = 3.0;

/// An enemy ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub body: Body,
    pub max_health: i32,
    pub points: u32,
    /// Horizontal heading for bouncing movers (+1 / -1)
    pub direction: f32,
    /// Seconds since the last shot
    pub fire_timer: f32,
    /// Seconds alive (drives sway)
    pub age: f32,
}

impl Enemy {
    pub fn new(kind: EnemyKind, x: f32, y: f32) -> Self {
        let stats = kind.stats();
        let mut body = Body::new(x, y, stats.size, stats.size).with_health(stats.health);
        body.vel.y = stats.speed;
        Self {
            kind,
            body,
            max_health: stats.health,
            points: stats.points,
            direction: 1.0,
            fire_timer: 0.0,
            age: 0.0,
        }
    }

    fn fire(&self) -> Projectile {
        Projectile::new(
            self.body.pos.x + self.body.size.x / 2.0 - PROJECTILE_WIDTH / 2.0,
            self.body.pos.y + self.body.size.y,
            0.0,
            ENEMY_SHOT_SPEED,
            Owner::Enemy,
        )
    }
}

impl Entity for Enemy {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, dt: f32) -> UpdateEffects {
        let stats = self.kind.stats();

        match self.kind {
            EnemyKind::Boss => {
                // Bounce between the side walls
                let max_x = PLAYFIELD_WIDTH - self.body.size.x;
                if self.body.pos.x <= 0.0 && self.direction < 0.0 {
                    self.direction = 1.0;
                } else if self.body.pos.x >= max_x && self.direction > 0.0 {
                    self.direction = -1.0;
                }
                self.body.vel.x = self.direction * stats.speed;
            }
            EnemyKind::Alien => {
                self.body.vel.x = (self.age * ALIEN_SWAY_FREQ).sin() * ALIEN_SWAY_SPEED;
            }
            _ => {}
        }

        self.body.integrate(dt);
        self.age += dt;

        let mut effects = UpdateEffects::default();
        if let Some(interval) = stats.fire_interval {
            self.fire_timer += dt;
            if self.fire_timer >= interval {
                self.fire_timer = 0.0;
                effects.projectiles.push(self.fire());
            }
        }
        effects
    }
}

/// Who fired a projectile (decides what it can hit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub body: Body,
    pub owner: Owner,
}

impl Projectile {
    /// `direction` scales the horizontal component: vel = (direction * |speed|, speed)
    pub fn new(x: f32, y: f32, direction: f32, speed: f32, owner: Owner) -> Self {
        let mut body = Body::new(x, y, PROJECTILE_WIDTH, PROJECTILE_HEIGHT);
        body.vel = Vec2::new(direction * speed.abs(), speed);
        Self { body, owner }
    }
}

impl Entity for Projectile {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn is_out_of_bounds(&self) -> bool {
        self.body.outside_playfield(CULL_MARGIN)
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    RapidFire,
    MultiShot,
    Health,
    Shield,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::RapidFire,
        PowerUpKind::MultiShot,
        PowerUpKind::Health,
        PowerUpKind::Shield,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::RapidFire => "rapidFire",
            PowerUpKind::MultiShot => "multiShot",
            PowerUpKind::Health => "health",
            PowerUpKind::Shield => "shield",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "rapidFire" => Some(PowerUpKind::RapidFire),
            "multiShot" => Some(PowerUpKind::MultiShot),
            "health" => Some(PowerUpKind::Health),
            "shield" => Some(PowerUpKind::Shield),
            _ => None,
        }
    }

    /// Timed buffs (everything except the instant heal)
    pub fn is_timed(&self) -> bool {
        !matches!(self, PowerUpKind::Health)
    }
}

/// Falling pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub body: Body,
    /// Bob animation phase
    pub bob: f32,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, x: f32, y: f32) -> Self {
        let mut body = Body::new(x, y, POWER_UP_SIZE, POWER_UP_SIZE);
        body.vel.y = POWER_UP_FALL_SPEED;
        Self { kind, body, bob: 0.0 }
    }
}

impl Entity for PowerUp {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn update(&mut self, dt: f32) -> UpdateEffects {
        self.body.integrate(dt);
        self.bob += dt * 5.0;
        UpdateEffects::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_deactivates_at_zero() {
        let mut enemy = Enemy::new(EnemyKind::Basic, 0.0, 0.0);
        assert_eq!(enemy.take_damage(1), DamageOutcome::Destroyed);
        assert!(!enemy.is_active());
        assert_eq!(enemy.body.health, 0);

        // Further damage never revives it or reports a second kill
        assert_eq!(enemy.take_damage(1), DamageOutcome::Damaged { health: -1 });
        assert!(!enemy.is_active());
    }

    #[test]
    fn test_boss_survives_partial_damage() {
        let mut boss = Enemy::new(EnemyKind::Boss, 100.0, 0.0);
        assert_eq!(boss.take_damage(3), DamageOutcome::Damaged { health: 7 });
        assert!(boss.is_active());
    }

    #[test]
    fn test_player_invulnerability_window() {
        let mut player = Player::new(100.0, 100.0);
        assert_eq!(player.take_damage(1), DamageOutcome::Damaged { health: 2 });
        assert!(player.is_invulnerable());

        // Second hit inside the grace window changes nothing
        assert_eq!(player.take_damage(1), DamageOutcome::Ignored);
        assert_eq!(player.health(), 2);

        player.update(INVULNERABILITY_SECS + 0.01);
        assert!(!player.is_invulnerable());
        assert_eq!(player.take_damage(1), DamageOutcome::Damaged { health: 1 });
    }

    #[test]
    fn test_shield_blocks_damage() {
        let mut player = Player::new(100.0, 100.0);
        player.add_power_up(PowerUpKind::Shield);
        assert_eq!(player.take_damage(5), DamageOutcome::Ignored);
        assert_eq!(player.health(), PLAYER_MAX_HEALTH);
        assert_eq!(player.invulnerable_timer, 0.0);
    }

    #[test]
    fn test_power_up_expires_after_duration() {
        let mut player = Player::new(100.0, 100.0);
        player.add_power_up(PowerUpKind::RapidFire);

        let effects = player.update(POWER_UP_DURATION - 1.0);
        assert!(effects.expired.is_empty());
        assert!((player.power_up_remaining(PowerUpKind::RapidFire).unwrap() - 1.0).abs() < 1e-4);

        let effects = player.update(1.5);
        assert_eq!(effects.expired, vec![PowerUpKind::RapidFire]);
        assert!(!player.has_power_up(PowerUpKind::RapidFire));
    }

    #[test]
    fn test_player_clamped_to_playfield() {
        let mut player = Player::new(5.0, 5.0);
        player.steer(&TickInput {
            left: true,
            up: true,
            ..Default::default()
        });
        player.update(1.0);
        assert_eq!(player.body.pos, Vec2::ZERO);

        player.steer(&TickInput {
            right: true,
            down: true,
            ..Default::default()
        });
        player.update(10.0);
        assert_eq!(player.body.pos.x, PLAYFIELD_WIDTH - PLAYER_WIDTH);
        assert_eq!(player.body.pos.y, PLAYFIELD_HEIGHT - PLAYER_HEIGHT);
    }

    #[test]
    fn test_shoot_respects_cooldown() {
        let mut player = Player::new(100.0, 300.0);
        assert!(player.shoot().is_empty());

        player.update(PLAYER_FIRE_COOLDOWN);
        let shots = player.shoot();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].owner, Owner::Player);
        assert!(shots[0].body.vel.y < 0.0);
        assert!(player.shoot().is_empty());
    }

    #[test]
    fn test_multi_shot_and_rapid_fire() {
        let mut player = Player::new(100.0, 300.0);
        player.add_power_up(PowerUpKind::MultiShot);
        player.add_power_up(PowerUpKind::RapidFire);

        player.update(RAPID_FIRE_COOLDOWN);
        let shots = player.shoot();
        assert_eq!(shots.len(), 3);
        let spreads: Vec<f32> = shots.iter().map(|p| p.body.vel.x).collect();
        assert!(spreads.contains(&0.0));
        assert!(spreads.iter().any(|&vx| vx < 0.0));
        assert!(spreads.iter().any(|&vx| vx > 0.0));
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut player = Player::new(0.0, 0.0);
        assert!(!player.heal());
        player.body.health = 1;
        assert!(player.heal());
        assert_eq!(player.health(), 2);
    }

    #[test]
    fn test_boss_fires_on_interval() {
        let mut boss = Enemy::new(EnemyKind::Boss, 300.0, 0.0);
        assert!(boss.update(0.5).projectiles.is_empty());
        let effects = boss.update(0.5);
        assert_eq!(effects.projectiles.len(), 1);
        assert_eq!(effects.projectiles[0].owner, Owner::Enemy);
        assert!(effects.projectiles[0].body.vel.y > 0.0);
        assert_eq!(boss.fire_timer, 0.0);
    }

    #[test]
    fn test_boss_bounces_off_walls() {
        let mut boss = Enemy::new(EnemyKind::Boss, PLAYFIELD_WIDTH - 60.0, 0.0);
        boss.update(0.1);
        assert_eq!(boss.direction, -1.0);
        assert!(boss.body.pos.x < PLAYFIELD_WIDTH - 60.0);

        // Doesn't get stuck flipping at the wall
        boss.update(0.1);
        assert_eq!(boss.direction, -1.0);
    }

    #[test]
    fn test_basic_enemy_never_fires() {
        let mut enemy = Enemy::new(EnemyKind::Basic, 0.0, 0.0);
        for _ in 0..100 {
            assert!(enemy.update(0.1).projectiles.is_empty());
        }
        assert!((enemy.body.pos.y - 1000.0).abs() < 0.1);
    }

    #[test]
    fn test_projectile_culling_on_all_sides() {
        let mut shot = Projectile::new(400.0, 300.0, 0.0, -500.0, Owner::Player);
        assert!(!shot.is_out_of_bounds());
        shot.body.pos.y = -CULL_MARGIN - 1.0;
        assert!(shot.is_out_of_bounds());
        shot.body.pos = Vec2::new(PLAYFIELD_WIDTH + CULL_MARGIN + 1.0, 300.0);
        assert!(shot.is_out_of_bounds());
    }

    #[test]
    fn test_enemy_above_playfield_is_kept() {
        let enemy = Enemy::new(EnemyKind::Basic, 100.0, -90.0);
        assert!(!enemy.is_out_of_bounds());
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EnemyKind::ALL {
            assert_eq!(EnemyKind::from_name(kind.as_str()), Some(kind));
        }
        for kind in PowerUpKind::ALL {
            assert_eq!(PowerUpKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(EnemyKind::from_name("mothership"), None);
        assert_eq!(PowerUpKind::from_name("megaBlast"), None);
    }
}
