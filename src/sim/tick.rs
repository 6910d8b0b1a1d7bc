//! Per-frame simulation tick
//!
//! Advances every subsystem once, in a fixed order, and reports what happened
//! through the event bus.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::collision::{self, PickupEffect};
use super::entity::Entity;
use super::factory;
use super::progression::WaveDirector;
use super::state::{GamePhase, GameState};
use crate::consts::*;
use crate::events::{EventBus, GameEvent};

/// Logical input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
    /// Pause toggle (edge, not held)
    pub pause: bool,
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    /// Enemies spawned by the progression machine
    pub spawned: usize,
    pub kills: u32,
    pub points: u64,
    /// Set when the run ended this tick (true = victory)
    pub ended: Option<bool>,
}

/// Advance the game by `dt` seconds
pub fn tick(
    state: &mut GameState,
    director: &mut WaveDirector,
    input: &TickInput,
    dt: f32,
    events: &mut EventBus,
) -> TickSummary {
    let mut summary = TickSummary::default();

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                log::info!("Paused");
                state.phase = GamePhase::Paused;
                return summary;
            }
            GamePhase::Paused => {
                log::info!("Resumed");
                state.phase = GamePhase::Playing;
            }
            _ => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return summary;
    }

    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    state.elapsed += dt;

    // Player
    state.player.steer(input);
    let effects = state.player.update(dt);
    for kind in effects.expired {
        events.emit(GameEvent::PowerUpExpired { kind });
    }
    if input.fire {
        state.projectiles.extend(state.player.shoot());
    }

    // Enemies, then everything they fired
    for enemy in &mut state.enemies {
        let effects = enemy.update(dt);
        state.projectiles.extend(effects.projectiles);
    }
    for projectile in &mut state.projectiles {
        projectile.update(dt);
    }
    for power_up in &mut state.power_ups {
        power_up.update(dt);
    }

    // Progression
    let wave = director.advance(dt, state.enemies.len(), &mut state.rng);
    summary.spawned = wave.spawned.len();
    state.enemies.extend(wave.spawned);
    if let Some(number) = wave.wave_started {
        let total = director.level_info().map_or(number, |info| info.total_waves);
        events.emit(GameEvent::WaveStarted {
            wave: number,
            total,
        });
    }

    // Combat
    let report = collision::resolve(
        &mut state.player,
        &mut state.enemies,
        &mut state.projectiles,
        &mut state.power_ups,
    );
    for health in report.player_hits {
        events.emit(GameEvent::PlayerHit { health });
    }
    for (kind, effect) in report.pickups {
        state.power_ups_collected += 1;
        match effect {
            PickupEffect::Healed { health } => events.emit(GameEvent::PlayerHealed { health }),
            PickupEffect::Activated { duration } => {
                events.emit(GameEvent::PowerUpActivated { kind, duration })
            }
            PickupEffect::NoEffect => {}
        }
    }
    if report.points > 0 {
        state.score += report.points;
        events.emit(GameEvent::ScoreChanged { score: state.score });
    }
    state.enemies_defeated += report.kills;
    summary.kills = report.kills;
    summary.points = report.points;

    cleanup(state);
    spawn_random_power_up(state, director, dt);

    // End of run: death wins over a simultaneous level clear
    if !state.player.is_active() {
        finish(state, events, false);
        summary.ended = Some(false);
    } else if director.is_level_complete() && state.enemies.is_empty() {
        if let Some(level) = director.current_level() {
            events.emit(GameEvent::LevelComplete { level });
        }
        finish(state, events, true);
        summary.ended = Some(true);
    }

    summary
}

/// Drop inactive and off-screen entities
fn cleanup(state: &mut GameState) {
    state.enemies.retain(|e| e.is_active() && !e.is_out_of_bounds());
    state.projectiles.retain(|p| p.is_active() && !p.is_out_of_bounds());
    state.power_ups.retain(|p| p.is_active() && !p.is_out_of_bounds());
}

/// Random power-up drop: once the timer passes the interval, roll against the
/// active wave's chance each tick. The timer only resets on a spawn.
fn spawn_random_power_up(state: &mut GameState, director: &WaveDirector, dt: f32) -> bool {
    state.power_up_timer += dt;
    if state.power_up_timer < POWER_UP_SPAWN_INTERVAL {
        return false;
    }

    let chance = f64::from(director.power_up_chance()).clamp(0.0, 1.0);
    if !state.rng.random_bool(chance) {
        return false;
    }
    let Some(name) = director.available_power_ups().choose(&mut state.rng) else {
        return false;
    };

    let x = state.rng.random_range(0.0..PLAYFIELD_WIDTH - POWER_UP_SIZE);
    let power_up = factory::create_power_up(name, x, POWER_UP_SPAWN_Y, &mut state.rng);
    log::debug!("Spawned {} power-up at x={:.0}", power_up.kind.as_str(), x);
    state.power_ups.push(power_up);
    state.power_up_timer = 0.0;
    true
}

fn finish(state: &mut GameState, events: &mut EventBus, victory: bool) {
    log::info!(
        "Game over ({}), score {}",
        if victory { "victory" } else { "defeat" },
        state.score
    );
    state.phase = GamePhase::GameOver;
    state.victory = Some(victory);
    events.emit(GameEvent::GameOver {
        score: state.score,
        victory,
    });
}
