//! Combat resolution
//!
//! Four passes run in a fixed order each tick, each only seeing what earlier
//! passes mutated:
//! 1. player shots vs enemies
//! 2. enemy shots vs player
//! 3. enemy bodies vs player (rams)
//! 4. player vs power-ups
//!
//! Collections iterate in insertion order and the first overlap wins.
//! Inactive entities take no part, so a kill is scored exactly once.

use super::entity::{DamageOutcome, Enemy, Entity, Owner, Player, PowerUp, PowerUpKind, Projectile};

/// Effect of collecting a power-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickupEffect {
    /// Health restored to the given value
    Healed { health: i32 },
    /// Health pickup at full health
    NoEffect,
    /// Timed buff started or refreshed
    Activated { duration: f32 },
}

/// Everything combat changed this tick
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CombatReport {
    /// Points earned from kills
    pub points: u64,
    pub kills: u32,
    /// Player health after each hit that landed
    pub player_hits: Vec<i32>,
    pub player_destroyed: bool,
    pub pickups: Vec<(PowerUpKind, PickupEffect)>,
}

/// Run all collision passes
pub fn resolve(
    player: &mut Player,
    enemies: &mut [Enemy],
    projectiles: &mut [Projectile],
    power_ups: &mut [PowerUp],
) -> CombatReport {
    let mut report = CombatReport::default();

    player_shots_vs_enemies(enemies, projectiles, &mut report);
    enemy_shots_vs_player(player, projectiles, &mut report);
    rams_vs_player(player, enemies, &mut report);
    player_vs_power_ups(player, power_ups, &mut report);

    report
}

fn player_shots_vs_enemies(
    enemies: &mut [Enemy],
    projectiles: &mut [Projectile],
    report: &mut CombatReport,
) {
    for shot in projectiles
        .iter_mut()
        .filter(|p| p.owner == Owner::Player && p.is_active())
    {
        let Some(enemy) = enemies
            .iter_mut()
            .find(|e| e.is_active() && shot.check_collision(&**e))
        else {
            continue;
        };

        shot.deactivate();
        if enemy.take_damage(1) == DamageOutcome::Destroyed {
            report.points += u64::from(enemy.points);
            report.kills += 1;
        }
    }
}

fn damage_player(player: &mut Player, report: &mut CombatReport) {
    match player.take_damage(1) {
        DamageOutcome::Ignored => {}
        DamageOutcome::Damaged { health } => report.player_hits.push(health),
        DamageOutcome::Destroyed => {
            report.player_hits.push(player.health());
            report.player_destroyed = true;
        }
    }
}

fn enemy_shots_vs_player(
    player: &mut Player,
    projectiles: &mut [Projectile],
    report: &mut CombatReport,
) {
    for shot in projectiles
        .iter_mut()
        .filter(|p| p.owner == Owner::Enemy && p.is_active())
    {
        if !player.is_active() {
            return;
        }
        if shot.check_collision(&*player) {
            shot.deactivate();
            damage_player(player, report);
        }
    }
}

fn rams_vs_player(player: &mut Player, enemies: &mut [Enemy], report: &mut CombatReport) {
    for enemy in enemies.iter_mut().filter(|e| e.is_active()) {
        if !player.is_active() {
            return;
        }
        // Rams destroy the enemy without scoring
        if enemy.check_collision(&*player) {
            enemy.deactivate();
            damage_player(player, report);
        }
    }
}

fn player_vs_power_ups(player: &mut Player, power_ups: &mut [PowerUp], report: &mut CombatReport) {
    if !player.is_active() {
        return;
    }
    for power_up in power_ups.iter_mut().filter(|p| p.is_active()) {
        if !power_up.check_collision(&*player) {
            continue;
        }
        power_up.deactivate();

        let effect = if power_up.kind.is_timed() {
            PickupEffect::Activated {
                duration: player.add_power_up(power_up.kind),
            }
        } else if player.heal() {
            PickupEffect::Healed {
                health: player.health(),
            }
        } else {
            PickupEffect::NoEffect
        };
        report.pickups.push((power_up.kind, effect));
    }
}
