//! Wave/level progression
//!
//! [`WaveDirector`] walks the waves of the loaded level, handing freshly
//! spawned enemies to the caller. It never keeps references to them: the
//! caller reports how many enemies are still alive and a wave ends once its
//! quota is spawned and that count reaches zero.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use super::entity::Enemy;
use super::factory;
use crate::consts::*;
use crate::error::LevelError;
use crate::levels::{LevelData, LevelLibrary, WaveSpec};

/// Progression state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionPhase {
    /// No level loaded yet
    Idle,
    /// Fetch in flight
    Loading { level: u32 },
    Active { level: u32, wave_index: usize },
    LevelComplete { level: u32 },
}

/// Position within the current level; reset on every load
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cursor {
    pub level: u32,
    pub wave_index: usize,
    pub spawn_timer: f32,
    /// Enemies spawned so far in the current wave
    pub spawned: u32,
}

/// What happened during one [`WaveDirector::advance`]
#[derive(Debug, Default)]
pub struct WaveTick {
    pub spawned: Vec<Enemy>,
    /// 1-based number of the wave that just started
    pub wave_started: Option<usize>,
    /// The last wave just finished
    pub level_complete: bool,
}

/// Descriptor of the loaded level for HUDs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelInfo {
    pub id: u32,
    pub name: String,
    pub description: String,
    /// 1-based
    pub current_wave: usize,
    pub total_waves: usize,
    pub difficulty: f32,
}

/// Drives wave spawning for one level at a time
#[derive(Debug)]
pub struct WaveDirector {
    library: LevelLibrary,
    phase: ProgressionPhase,
    cursor: Cursor,
    current: Option<Arc<LevelData>>,
}

impl WaveDirector {
    pub fn new(library: LevelLibrary) -> Self {
        Self {
            library,
            phase: ProgressionPhase::Idle,
            cursor: Cursor::default(),
            current: None,
        }
    }

    pub fn library(&self) -> &LevelLibrary {
        &self.library
    }

    pub fn phase(&self) -> ProgressionPhase {
        self.phase
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn level_data(&self) -> Option<&Arc<LevelData>> {
        self.current.as_ref()
    }

    /// Make `level` current and start at its first wave.
    ///
    /// A cached level activates without suspending. Otherwise the phase is
    /// `Loading` until the fetch settles; on failure the previous phase is
    /// restored and nothing else changes.
    pub async fn load_level(&mut self, level: u32) -> Result<(), LevelError> {
        let data = match self.library.cached(level) {
            Some(data) => data,
            None => {
                let previous = std::mem::replace(&mut self.phase, ProgressionPhase::Loading { level });
                match self.library.load(level).await {
                    Ok(data) => data,
                    Err(e) => {
                        log::warn!("Failed to load level {}: {}", level, e);
                        self.phase = previous;
                        return Err(e);
                    }
                }
            }
        };

        log::info!("Level {} loaded: {} ({} waves)", level, data.name, data.waves.len());
        self.current = Some(data);
        self.cursor = Cursor {
            level,
            ..Default::default()
        };
        self.phase = ProgressionPhase::Active {
            level,
            wave_index: 0,
        };
        Ok(())
    }

    fn current_wave(&self) -> Option<&WaveSpec> {
        match self.phase {
            ProgressionPhase::Active { wave_index, .. } => {
                self.current.as_ref().and_then(|data| data.waves.get(wave_index))
            }
            _ => None,
        }
    }

    /// Advance spawn timing by `dt`.
    ///
    /// At most one batch spawns per call, however far `dt` overshoots the
    /// interval. A wave only completes on a call that spawned nothing.
    pub fn advance(&mut self, dt: f32, live_enemies: usize, rng: &mut impl Rng) -> WaveTick {
        let mut tick = WaveTick::default();
        let ProgressionPhase::Active { level, wave_index } = self.phase else {
            return tick;
        };
        let Some(data) = self.current.clone() else {
            return tick;
        };
        let Some(wave) = data.waves.get(wave_index) else {
            return tick;
        };

        self.cursor.spawn_timer += dt;

        if self.cursor.spawn_timer >= wave.interval && self.cursor.spawned < wave.count {
            tick.spawned = spawn_batch(wave, rng);
            self.cursor.spawned += tick.spawned.len() as u32;
            self.cursor.spawn_timer = 0.0;
            log::debug!(
                "Spawned {} enemies ({}/{}) in wave {}",
                tick.spawned.len(),
                self.cursor.spawned,
                wave.count,
                wave_index + 1
            );
        } else if self.cursor.spawned >= wave.count && live_enemies == 0 {
            let next = wave_index + 1;
            self.cursor.wave_index = next;
            self.cursor.spawned = 0;
            self.cursor.spawn_timer = 0.0;

            if next >= data.waves.len() {
                log::info!("Level {} complete", level);
                self.phase = ProgressionPhase::LevelComplete { level };
                tick.level_complete = true;
            } else {
                log::info!("Advanced to wave {} of {}", next + 1, data.waves.len());
                self.phase = ProgressionPhase::Active {
                    level,
                    wave_index: next,
                };
                tick.wave_started = Some(next + 1);
            }
        }

        tick
    }

    pub fn is_level_complete(&self) -> bool {
        matches!(self.phase, ProgressionPhase::LevelComplete { .. })
    }

    pub fn level_info(&self) -> Option<LevelInfo> {
        let data = self.current.as_ref()?;
        let total_waves = data.waves.len();
        Some(LevelInfo {
            id: data.id,
            name: data.name.clone(),
            description: data.description.clone(),
            current_wave: (self.cursor.wave_index + 1).min(total_waves),
            total_waves,
            difficulty: data.difficulty,
        })
    }

    /// Drop chance of the active wave; zero without one
    pub fn power_up_chance(&self) -> f32 {
        self.current_wave()
            .map(|wave| wave.power_up_chance.unwrap_or(DEFAULT_POWER_UP_CHANCE))
            .unwrap_or(0.0)
    }

    /// Power-up names the current level may spawn
    pub fn available_power_ups(&self) -> &[String] {
        self.current
            .as_ref()
            .map(|data| data.power_ups.as_slice())
            .unwrap_or(&[])
    }

    pub fn current_level(&self) -> Option<u32> {
        match self.phase {
            ProgressionPhase::Idle => None,
            ProgressionPhase::Loading { .. } => self.current.as_ref().map(|data| data.id),
            ProgressionPhase::Active { level, .. } | ProgressionPhase::LevelComplete { level } => {
                Some(level)
            }
        }
    }

    pub fn next_level(&self) -> u32 {
        self.current_level().map_or(1, |level| level + 1)
    }

    pub fn has_next_level(&self) -> bool {
        self.library.contains(self.next_level())
    }

    pub fn total_levels(&self) -> u32 {
        self.library.level_count()
    }

    /// Completed waves as a rounded percentage
    pub fn level_progress(&self) -> u32 {
        let Some(data) = &self.current else {
            return 0;
        };
        let completed = self.cursor.wave_index.min(data.waves.len());
        ((completed as f32 / data.waves.len() as f32) * 100.0).round() as u32
    }

    /// Spawn quota progress of the active wave (100 once past the last wave)
    pub fn wave_progress(&self) -> u32 {
        match self.current_wave() {
            Some(wave) => {
                let fraction = (self.cursor.spawned as f32 / wave.count as f32).min(1.0);
                (fraction * 100.0).round() as u32
            }
            None if self.current.is_some() => 100,
            None => 0,
        }
    }

    pub fn remaining_in_wave(&self) -> u32 {
        self.current_wave()
            .map_or(0, |wave| wave.count.saturating_sub(self.cursor.spawned))
    }

    pub fn clear_cache(&self) {
        self.library.clear_cache();
    }

    /// Back to `Idle`, forgetting the current level
    pub fn reset(&mut self) {
        self.phase = ProgressionPhase::Idle;
        self.cursor = Cursor::default();
        self.current = None;
    }
}

/// One spawn batch: a formation centred at a random x, or a single enemy of
/// the wave's type
fn spawn_batch(wave: &WaveSpec, rng: &mut impl Rng) -> Vec<Enemy> {
    if wave.uses_formation() {
        let center_x = rng.random_range(FORMATION_MIN_X..FORMATION_MAX_X);
        factory::create_enemy_formation(&wave.formation, center_x, ENEMY_SPAWN_Y)
    } else {
        let x = rng.random_range(0.0..SINGLE_SPAWN_MAX_X);
        vec![factory::create_enemy(&wave.enemy, x, ENEMY_SPAWN_Y)]
    }
}
