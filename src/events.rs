//! Notification boundary
//!
//! The session owns an [`EventBus`] handed in at construction. Listeners are
//! plain closures; each subscription returns a [`SubscriptionId`] used to
//! unsubscribe.

use serde::Serialize;

use crate::sim::entity::PowerUpKind;

/// Something the outside world may want to react to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    /// Player lost health
    PlayerHit { health: i32 },
    PlayerHealed { health: i32 },
    PowerUpActivated { kind: PowerUpKind, duration: f32 },
    PowerUpExpired { kind: PowerUpKind },
    ScoreChanged { score: u64 },
    /// 1-based wave number
    WaveStarted { wave: usize, total: usize },
    LevelComplete { level: u32 },
    NewHighScore { score: u64 },
    GameOver { score: u64, victory: bool },
}

/// Discriminant of [`GameEvent`] for filtered subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayerHit,
    PlayerHealed,
    PowerUpActivated,
    PowerUpExpired,
    ScoreChanged,
    WaveStarted,
    LevelComplete,
    NewHighScore,
    GameOver,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::PlayerHit { .. } => EventKind::PlayerHit,
            GameEvent::PlayerHealed { .. } => EventKind::PlayerHealed,
            GameEvent::PowerUpActivated { .. } => EventKind::PowerUpActivated,
            GameEvent::PowerUpExpired { .. } => EventKind::PowerUpExpired,
            GameEvent::ScoreChanged { .. } => EventKind::ScoreChanged,
            GameEvent::WaveStarted { .. } => EventKind::WaveStarted,
            GameEvent::LevelComplete { .. } => EventKind::LevelComplete,
            GameEvent::NewHighScore { .. } => EventKind::NewHighScore,
            GameEvent::GameOver { .. } => EventKind::GameOver,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PlayerHit => "playerHit",
            EventKind::PlayerHealed => "playerHealed",
            EventKind::PowerUpActivated => "powerUpActivated",
            EventKind::PowerUpExpired => "powerUpExpired",
            EventKind::ScoreChanged => "scoreChanged",
            EventKind::WaveStarted => "waveStarted",
            EventKind::LevelComplete => "levelComplete",
            EventKind::NewHighScore => "newHighScore",
            EventKind::GameOver => "gameOver",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&GameEvent)>;

struct Subscription {
    id: SubscriptionId,
    /// None = every event
    filter: Option<EventKind>,
    listener: Listener,
}

/// Fan-out of game events to any number of listeners
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, filter: Option<EventKind>, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription {
            id,
            filter,
            listener,
        });
        id
    }

    /// Listen to every event
    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.add(None, Box::new(listener))
    }

    /// Listen to one kind of event
    pub fn subscribe_to(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        self.add(Some(kind), Box::new(listener))
    }

    /// Returns false if the id was unknown (already removed or cleared)
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver to matching listeners in subscription order
    pub fn emit(&mut self, event: GameEvent) {
        log::trace!("event {}", event.name());
        let kind = event.kind();
        for subscription in &mut self.subscriptions {
            if subscription.filter.is_none_or(|filter| filter == kind) {
                (subscription.listener)(&event);
            }
        }
    }

    /// Listeners that would receive an event of `kind`
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions
            .iter()
            .filter(|s| s.filter.is_none_or(|filter| filter == kind))
            .count()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
