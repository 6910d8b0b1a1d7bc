//! Error types
//!
//! Level loading errors surface to whoever asked for the load. Storage errors
//! never leave the persistence layer.

use thiserror::Error;

/// Why a level definition was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("level has no waves")]
    EmptyWaves,
    #[error("wave {wave} has a zero enemy count")]
    ZeroCount { wave: usize },
    #[error("wave {wave} has non-positive spawn interval {interval}")]
    NonPositiveInterval { wave: usize, interval: f32 },
    #[error("wave {wave} has no enemy type")]
    MissingEnemyType { wave: usize },
    #[error("malformed level data: {0}")]
    Malformed(String),
}

/// Level loading errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LevelError {
    #[error("level {0} not found")]
    NotFound(u32),

    #[error("invalid data for level {level}: {source}")]
    Invalid {
        level: u32,
        #[source]
        source: ValidationError,
    },

    /// Transient failure while fetching (simulated network error)
    #[error("failed to fetch level {level}: {reason}")]
    Fetch { level: u32, reason: String },
}

impl LevelError {
    /// Level number the error refers to
    pub fn level(&self) -> u32 {
        match self {
            LevelError::NotFound(level) => *level,
            LevelError::Invalid { level, .. } | LevelError::Fetch { level, .. } => *level,
        }
    }
}

/// Storage backend errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Session orchestration errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Level(#[from] LevelError),

    #[error("cannot {action} while {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: crate::sim::GamePhase,
    },
}
