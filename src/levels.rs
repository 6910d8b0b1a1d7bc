//! Level data, validation and async loading
//!
//! Levels arrive through a [`LevelSource`] (a simulated network fetch for the
//! built-in catalog), are validated once, and then live in a write-once cache
//! shared by every [`LevelLibrary`] handle.

use std::collections::HashMap;
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LevelError, ValidationError};

/// Built-in level catalog (JSON array of level objects)
pub const BUILTIN_LEVELS: &str = include_str!("../assets/levels.json");

/// Simulated fetch latency for the built-in catalog (ms)
pub const DEFAULT_LATENCY_MS: Range<u64> = 500..1500;

fn default_difficulty() -> f32 {
    1.0
}

/// One timed spawn directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveSpec {
    /// Enemy type name (unknown names spawn basic enemies)
    #[serde(rename = "type", default)]
    pub enemy: String,
    /// Spawn quota for the wave
    pub count: u32,
    /// Seconds between spawn batches
    pub interval: f32,
    /// Formation name; empty or "single" spawns one enemy per batch
    #[serde(default)]
    pub formation: String,
    /// Random power-up drop chance while this wave is active
    #[serde(default)]
    pub power_up_chance: Option<f32>,
}

impl WaveSpec {
    /// Whether batches spawn as a formation rather than a single enemy
    pub fn uses_formation(&self) -> bool {
        !self.formation.is_empty() && self.formation != "single"
    }
}

/// A level definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub waves: Vec<WaveSpec>,
    /// Power-up kinds eligible for random spawns
    #[serde(default)]
    pub power_ups: Vec<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: f32,
}

impl LevelData {
    /// A level is valid iff it has waves and every wave has a positive count
    /// and interval
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.waves.is_empty() {
            return Err(ValidationError::EmptyWaves);
        }
        for (wave, spec) in self.waves.iter().enumerate() {
            if spec.enemy.trim().is_empty() {
                return Err(ValidationError::MissingEnemyType { wave });
            }
            if spec.count == 0 {
                return Err(ValidationError::ZeroCount { wave });
            }
            // Written this way so NaN fails too
            if !(spec.interval > 0.0) {
                return Err(ValidationError::NonPositiveInterval {
                    wave,
                    interval: spec.interval,
                });
            }
        }
        Ok(())
    }
}

/// Boxed fetch future so sources stay object-safe
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<LevelData, LevelError>> + Send + 'static>>;

/// Where level definitions come from
pub trait LevelSource: Send + Sync {
    /// Fetch the raw definition for a level (not yet validated)
    fn fetch(&self, level: u32) -> FetchFuture;

    /// Whether the source knows this level number
    fn contains(&self, level: u32) -> bool;
}

/// JSON catalog with simulated network latency and failures
#[derive(Debug, Clone)]
pub struct CatalogSource {
    json: Arc<str>,
    latency_ms: Range<u64>,
    failure_rate: f64,
}

impl CatalogSource {
    /// The built-in five-level campaign
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_LEVELS)
    }

    /// Catalog from a JSON array of level objects, served without delay
    pub fn from_json(json: &str) -> Self {
        Self {
            json: Arc::from(json),
            latency_ms: 0..0,
            failure_rate: 0.0,
        }
    }

    /// Random delay per fetch (empty range = no delay)
    pub fn with_latency(mut self, latency_ms: Range<u64>) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Probability that a fetch fails with a transient error
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn lookup(&self, level: u32) -> Result<Option<Value>, LevelError> {
        let entries: Vec<Value> = serde_json::from_str(&self.json).map_err(|e| LevelError::Fetch {
            level,
            reason: format!("catalog unreadable: {e}"),
        })?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.get("id").and_then(Value::as_u64) == Some(u64::from(level))))
    }
}

impl LevelSource for CatalogSource {
    fn fetch(&self, level: u32) -> FetchFuture {
        let mut rng = rand::rng();
        let delay = if self.latency_ms.is_empty() {
            0
        } else {
            rng.random_range(self.latency_ms.clone())
        };
        let fail = self.failure_rate > 0.0 && rng.random_bool(self.failure_rate);
        let source = self.clone();

        Box::pin(async move {
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if fail {
                return Err(LevelError::Fetch {
                    level,
                    reason: "simulated network failure".to_string(),
                });
            }
            let entry = source.lookup(level)?.ok_or(LevelError::NotFound(level))?;
            serde_json::from_value(entry).map_err(|e| LevelError::Invalid {
                level,
                source: ValidationError::Malformed(e.to_string()),
            })
        })
    }

    fn contains(&self, level: u32) -> bool {
        matches!(self.lookup(level), Ok(Some(_)))
    }
}

/// Outcome of one level in a preload batch
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadOutcome {
    pub level: u32,
    pub error: Option<LevelError>,
}

impl PreloadOutcome {
    pub fn loaded(&self) -> bool {
        self.error.is_none()
    }
}

type LevelCache = HashMap<u32, Arc<LevelData>>;

/// Cloneable handle to a level source plus the shared validated-level cache
#[derive(Clone)]
pub struct LevelLibrary {
    source: Arc<dyn LevelSource>,
    cache: Arc<RwLock<LevelCache>>,
}

impl std::fmt::Debug for LevelLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached: Vec<u32> = {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            let mut levels: Vec<u32> = cache.keys().copied().collect();
            levels.sort_unstable();
            levels
        };
        f.debug_struct("LevelLibrary").field("cached", &cached).finish()
    }
}

impl LevelLibrary {
    pub fn new(source: impl LevelSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Built-in catalog with simulated latency
    pub fn builtin() -> Self {
        Self::new(CatalogSource::builtin().with_latency(DEFAULT_LATENCY_MS))
    }

    pub fn cached(&self, level: u32) -> Option<Arc<LevelData>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&level)
            .cloned()
    }

    pub fn is_cached(&self, level: u32) -> bool {
        self.cached(level).is_some()
    }

    /// Whether the level exists (cached or known to the source)
    pub fn contains(&self, level: u32) -> bool {
        self.is_cached(level) || self.source.contains(level)
    }

    /// Number of consecutive levels starting at 1
    pub fn level_count(&self) -> u32 {
        let mut count = 0;
        while self.contains(count + 1) {
            count += 1;
        }
        count
    }

    /// Load, validate and cache a level. Cached levels return immediately
    /// with the same `Arc`; failures leave the cache untouched.
    pub async fn load(&self, level: u32) -> Result<Arc<LevelData>, LevelError> {
        if let Some(data) = self.cached(level) {
            return Ok(data);
        }

        let data = self.source.fetch(level).await?;
        data.validate()
            .map_err(|source| LevelError::Invalid { level, source })?;

        Ok(self.insert(level, data))
    }

    /// First insertion wins; concurrent duplicates get the existing entry
    fn insert(&self, level: u32, data: LevelData) -> Arc<LevelData> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.entry(level).or_insert_with(|| {
            log::info!("Cached level {} ({})", level, data.name);
            Arc::new(data)
        });
        Arc::clone(entry)
    }

    /// Load several levels concurrently. Every level settles independently;
    /// outcomes come back in input order.
    pub async fn preload(&self, levels: &[u32]) -> Vec<PreloadOutcome> {
        let handles: Vec<_> = levels
            .iter()
            .map(|&level| {
                let library = self.clone();
                (level, tokio::spawn(async move { library.load(level).await }))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (level, handle) in handles {
            let error = match handle.await {
                Ok(Ok(_)) => None,
                Ok(Err(e)) => Some(e),
                Err(e) => Some(LevelError::Fetch {
                    level,
                    reason: format!("preload task failed: {e}"),
                }),
            };
            if let Some(e) = &error {
                log::warn!("Preload of level {} failed: {}", level, e);
            }
            outcomes.push(PreloadOutcome { level, error });
        }
        outcomes
    }

    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    struct CountingSource {
        inner: CatalogSource,
        fetches: Arc<AtomicUsize>,
    }

    impl LevelSource for CountingSource {
        fn fetch(&self, level: u32) -> FetchFuture {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(level)
        }

        fn contains(&self, level: u32) -> bool {
            self.inner.contains(level)
        }
    }

    fn wave(count: u32, interval: f32) -> WaveSpec {
        WaveSpec {
            enemy: "basic".to_string(),
            count,
            interval,
            formation: "line".to_string(),
            power_up_chance: None,
        }
    }

    fn level(waves: Vec<WaveSpec>) -> LevelData {
        LevelData {
            id: 1,
            name: "Test".to_string(),
            description: String::new(),
            waves,
            power_ups: vec![],
            difficulty: 1.0,
        }
    }

    #[test]
    fn test_validation_rules() {
        assert_eq!(level(vec![]).validate(), Err(ValidationError::EmptyWaves));
        assert_eq!(
            level(vec![wave(5, 1.0), wave(0, 1.0)]).validate(),
            Err(ValidationError::ZeroCount { wave: 1 })
        );
        assert!(matches!(
            level(vec![wave(5, 0.0)]).validate(),
            Err(ValidationError::NonPositiveInterval { wave: 0, .. })
        ));
        assert!(level(vec![wave(5, f32::NAN)]).validate().is_err());
        assert!(level(vec![wave(5, 1.0)]).validate().is_ok());
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let source = CatalogSource::builtin();
        let entries: Vec<LevelData> = serde_json::from_str(BUILTIN_LEVELS).unwrap();
        assert_eq!(entries.len(), 5);
        for data in &entries {
            assert!(data.validate().is_ok(), "level {} invalid", data.id);
            assert!(source.contains(data.id));
        }
        assert!(!source.contains(6));
        assert_eq!(entries[0].waves[0].power_up_chance, Some(0.08));
    }

    #[test]
    fn test_builtin_wave_table() {
        let entries: Vec<LevelData> = serde_json::from_str(BUILTIN_LEVELS).unwrap();
        let shape = |level: usize, wave: usize| {
            let spec = &entries[level - 1].waves[wave - 1];
            (spec.enemy.as_str(), spec.formation.as_str())
        };
        assert_eq!(shape(2, 4), ("heavy", "line"));
        assert_eq!(shape(3, 3), ("heavy", "v-formation"));
        assert_eq!(shape(4, 1), ("alien", "swarm"));
        assert_eq!(shape(5, 2), ("elite", "diamond"));
        assert_eq!(shape(5, 4), ("boss", "twin"));
        assert_eq!(shape(5, 5), ("finalBoss", "single"));
        assert!(entries[2].waves[2].uses_formation());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_caches_and_returns_same_arc() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let library = LevelLibrary::new(CountingSource {
            inner: CatalogSource::builtin().with_latency(DEFAULT_LATENCY_MS),
            fetches: Arc::clone(&fetches),
        });

        let start = Instant::now();
        let first = library.load(1).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(first.name, "Asteroid Field");

        let second = library.load(1).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_level_not_found() {
        let library = LevelLibrary::builtin();
        assert_eq!(library.load(99).await, Err(LevelError::NotFound(99)));
        assert!(!library.is_cached(99));
    }

    #[tokio::test]
    async fn test_invalid_level_rejected_and_not_cached() {
        let library = LevelLibrary::new(CatalogSource::from_json(
            r#"[
                {"id": 1, "name": "Empty", "waves": []},
                {"id": 2, "name": "Zero", "waves": [{"type": "basic", "count": 0, "interval": 1.0}]},
                {"id": 3, "name": "Negative", "waves": [{"type": "basic", "count": -2, "interval": 1.0}]}
            ]"#,
        ));

        assert!(matches!(
            library.load(1).await,
            Err(LevelError::Invalid {
                level: 1,
                source: ValidationError::EmptyWaves
            })
        ));
        assert!(matches!(
            library.load(2).await,
            Err(LevelError::Invalid {
                source: ValidationError::ZeroCount { wave: 0 },
                ..
            })
        ));
        assert!(matches!(
            library.load(3).await,
            Err(LevelError::Invalid {
                source: ValidationError::Malformed(_),
                ..
            })
        ));
        assert!(!library.is_cached(1));
        assert!(!library.is_cached(2));
    }

    #[tokio::test]
    async fn test_transient_failure_leaves_cache_untouched() {
        let library = LevelLibrary::new(CatalogSource::builtin().with_failure_rate(1.0));
        let err = library.load(1).await.unwrap_err();
        assert!(matches!(err, LevelError::Fetch { level: 1, .. }));
        assert!(!library.is_cached(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_isolates_failures() {
        let library = LevelLibrary::builtin();
        let outcomes = library.preload(&[1, 99]).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].level, 1);
        assert!(outcomes[0].loaded());
        assert_eq!(outcomes[1].level, 99);
        assert_eq!(outcomes[1].error, Some(LevelError::NotFound(99)));
        assert!(library.is_cached(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_preload_of_same_level_fetches_once_per_task() {
        let library = LevelLibrary::builtin();
        let outcomes = library.preload(&[2, 2, 3]).await;
        assert!(outcomes.iter().all(PreloadOutcome::loaded));

        let a = library.cached(2).unwrap();
        let b = library.load(2).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_level_count() {
        assert_eq!(LevelLibrary::builtin().level_count(), 5);
    }
}
