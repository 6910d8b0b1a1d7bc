//! Persisted aggregate records

use serde::{Deserialize, Serialize};

use super::{Persistence, keys, now_millis};

/// Lifetime statistics across all runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub games_played: u32,
    pub total_score: u64,
    pub enemies_defeated: u32,
    pub power_ups_collected: u32,
    /// Seconds
    pub time_spent_playing: f64,
    pub levels_completed: u32,
    /// Unix timestamp (ms) of the last save
    pub last_updated: f64,
}

impl Statistics {
    pub fn load(persistence: &Persistence) -> Self {
        persistence.load_or_default(keys::STATISTICS)
    }

    pub fn save(&mut self, persistence: &mut Persistence) -> bool {
        self.last_updated = now_millis();
        persistence.save(keys::STATISTICS, self)
    }

    /// Fold a finished run into the totals
    pub fn record_run(&mut self, score: u64, enemies_defeated: u32, power_ups_collected: u32, seconds: f32) {
        self.total_score += score;
        self.enemies_defeated += enemies_defeated;
        self.power_ups_collected += power_ups_collected;
        self.time_spent_playing += f64::from(seconds);
    }
}

/// Campaign progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerProgress {
    /// Highest level reached
    pub level: u32,
    pub experience: u64,
    pub unlocked_levels: Vec<u32>,
    pub achievements: Vec<String>,
    /// Seconds
    pub play_time: f64,
    pub last_played: f64,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            unlocked_levels: vec![1],
            achievements: Vec::new(),
            play_time: 0.0,
            last_played: 0.0,
        }
    }
}

impl PlayerProgress {
    pub fn load(persistence: &Persistence) -> Self {
        persistence.load_or_default(keys::PLAYER_DATA)
    }

    pub fn save(&mut self, persistence: &mut Persistence) -> bool {
        self.last_played = now_millis();
        persistence.save(keys::PLAYER_DATA, self)
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        self.unlocked_levels.contains(&level)
    }

    /// Returns false if it was already unlocked
    pub fn unlock(&mut self, level: u32) -> bool {
        if self.is_unlocked(level) {
            return false;
        }
        self.unlocked_levels.push(level);
        self.unlocked_levels.sort_unstable();
        self.level = self.level.max(level);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_accumulate() {
        let mut stats = Statistics::default();
        stats.record_run(1500, 12, 2, 90.0);
        stats.record_run(500, 3, 0, 30.0);
        assert_eq!(stats.total_score, 2000);
        assert_eq!(stats.enemies_defeated, 15);
        assert_eq!(stats.time_spent_playing, 120.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let stats: Statistics = serde_json::from_str(r#"{"gamesPlayed": 4}"#).unwrap();
        assert_eq!(stats.games_played, 4);
        assert_eq!(stats.total_score, 0);

        let progress: PlayerProgress = serde_json::from_str(r#"{"experience": 10}"#).unwrap();
        assert_eq!(progress.unlocked_levels, vec![1]);
        assert_eq!(progress.level, 1);
    }

    #[test]
    fn test_unlock() {
        let mut progress = PlayerProgress::default();
        assert!(progress.unlock(3));
        assert!(progress.unlock(2));
        assert!(!progress.unlock(2));
        assert_eq!(progress.unlocked_levels, vec![1, 2, 3]);
        assert_eq!(progress.level, 3);
    }

    #[test]
    fn test_save_and_load() {
        let mut persistence = Persistence::in_memory();
        let mut stats = Statistics {
            games_played: 2,
            ..Default::default()
        };
        assert!(stats.save(&mut persistence));
        assert!(stats.last_updated > 0.0);
        assert_eq!(Statistics::load(&persistence), stats);
    }
}
