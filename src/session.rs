//! Game session
//!
//! A [`Session`] owns everything one player's game needs: simulation state,
//! the wave director, the injected event bus and the persisted records. It
//! enforces the session state machine
//! `Menu -> Loading -> Playing <-> Paused -> GameOver`.

use crate::error::SessionError;
use crate::events::{EventBus, GameEvent};
use crate::highscores::HighScores;
use crate::levels::{LevelLibrary, PreloadOutcome};
use crate::persistence::{Persistence, PlayerProgress, Statistics, now_millis};
use crate::render::RenderSnapshot;
use crate::settings::Settings;
use crate::sim::entity::PowerUpKind;
use crate::sim::{GamePhase, GameState, LevelInfo, TickInput, TickSummary, WaveDirector, tick};

#[derive(Debug)]
pub struct Session {
    state: GameState,
    director: WaveDirector,
    events: EventBus,
    persistence: Persistence,
    settings: Settings,
    statistics: Statistics,
    high_scores: HighScores,
    progress: PlayerProgress,
}

impl Session {
    /// New session in `Menu`, with records loaded from `persistence`
    pub fn new(library: LevelLibrary, events: EventBus, persistence: Persistence, seed: u64) -> Self {
        if !persistence.is_available() {
            log::warn!("Storage unavailable, progress will not be saved");
        }
        Self {
            state: GameState::new(seed),
            director: WaveDirector::new(library),
            events,
            settings: Settings::load(&persistence),
            statistics: Statistics::load(&persistence),
            high_scores: HighScores::load(&persistence),
            progress: PlayerProgress::load(&persistence),
            persistence,
        }
    }

    /// Warm the level cache; each level settles independently
    pub async fn initialize(&self, preload: &[u32]) -> Vec<PreloadOutcome> {
        let outcomes = self.director.library().preload(preload).await;
        let loaded = outcomes.iter().filter(|o| o.loaded()).count();
        log::info!("Preloaded {}/{} levels", loaded, outcomes.len());
        outcomes
    }

    /// Start a fresh run on `level`.
    ///
    /// Allowed from `Menu` and `GameOver` (and from an abandoned `Loading`).
    /// Ticks are no-ops until the level is ready. A failed load returns to
    /// `Menu`.
    pub async fn start(&mut self, level: u32) -> Result<(), SessionError> {
        match self.state.phase {
            GamePhase::Menu | GamePhase::GameOver | GamePhase::Loading => {}
            phase => {
                return Err(SessionError::InvalidTransition {
                    action: "start",
                    phase,
                });
            }
        }

        self.state.phase = GamePhase::Loading;
        if let Err(e) = self.director.load_level(level).await {
            self.state.phase = GamePhase::Menu;
            return Err(e.into());
        }

        self.state.reset();
        self.state.phase = GamePhase::Playing;
        self.statistics.games_played += 1;
        self.statistics.save(&mut self.persistence);

        if let Some(info) = self.director.level_info() {
            log::info!("Starting level {}: {}", info.id, info.name);
            self.events.emit(GameEvent::WaveStarted {
                wave: info.current_wave,
                total: info.total_waves,
            });
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.transition("pause", GamePhase::Playing, GamePhase::Paused)
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.transition("resume", GamePhase::Paused, GamePhase::Playing)
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: GamePhase,
        to: GamePhase,
    ) -> Result<(), SessionError> {
        if self.state.phase != from {
            return Err(SessionError::InvalidTransition {
                action,
                phase: self.state.phase,
            });
        }
        log::info!("Session {:?} -> {:?}", from, to);
        self.state.phase = to;
        Ok(())
    }

    /// Leave a finished run. A paused run must be resumed first.
    pub fn go_to_menu(&mut self) -> Result<(), SessionError> {
        match self.state.phase {
            GamePhase::GameOver | GamePhase::Menu => {
                self.state.phase = GamePhase::Menu;
                self.state.reset();
                self.director.reset();
                Ok(())
            }
            phase => Err(SessionError::InvalidTransition {
                action: "return to menu",
                phase,
            }),
        }
    }

    /// Advance one frame. Records are saved when the run ends.
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> TickSummary {
        let summary = tick(
            &mut self.state,
            &mut self.director,
            input,
            dt,
            &mut self.events,
        );
        if let Some(victory) = summary.ended {
            self.record_run(victory);
        }
        summary
    }

    fn record_run(&mut self, victory: bool) {
        let state = &self.state;
        let level = self.director.current_level().unwrap_or(1);

        self.statistics.record_run(
            state.score,
            state.enemies_defeated,
            state.power_ups_collected,
            state.elapsed,
        );
        self.progress.play_time += f64::from(state.elapsed);
        if victory {
            self.statistics.levels_completed += 1;
            let next = self.director.next_level();
            if self.director.has_next_level() && self.progress.unlock(next) {
                log::info!("Unlocked level {}", next);
            }
        }

        if self.high_scores.add_score(state.score, level, now_millis()) == Some(1) {
            log::info!("New high score: {}", state.score);
            self.events.emit(GameEvent::NewHighScore { score: state.score });
        }

        self.statistics.save(&mut self.persistence);
        self.progress.save(&mut self.persistence);
        self.high_scores.save(&mut self.persistence);
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn director(&self) -> &WaveDirector {
        &self.director
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn lives(&self) -> i32 {
        self.state.lives()
    }

    pub fn level_info(&self) -> Option<LevelInfo> {
        self.director.level_info()
    }

    pub fn power_up_timers(&self) -> Vec<(PowerUpKind, f32)> {
        self.state.power_up_timers()
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(&self.state, self.director.level_info())
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace and persist settings
    pub fn update_settings(&mut self, settings: Settings) -> bool {
        self.settings = settings;
        self.settings.save(&mut self.persistence)
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn high_score(&self) -> u64 {
        self.high_scores.top_score().unwrap_or(0)
    }

    pub fn progress(&self) -> &PlayerProgress {
        &self.progress
    }

    pub fn export_data(&self) -> Option<String> {
        self.persistence.export()
    }

    /// Import a bundle and reload every record from storage
    pub fn import_data(&mut self, json: &str) -> bool {
        let imported = self.persistence.import(json);
        if imported {
            self.reload_records();
        }
        imported
    }

    /// Wipe persisted data and reset in-memory records to defaults
    pub fn clear_saved_data(&mut self) -> bool {
        let cleared = self.persistence.clear_all();
        self.reload_records();
        cleared
    }

    fn reload_records(&mut self) {
        self.settings = Settings::load(&self.persistence);
        self.statistics = Statistics::load(&self.persistence);
        self.high_scores = HighScores::load(&self.persistence);
        self.progress = PlayerProgress::load(&self.persistence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LevelError;
    use crate::levels::CatalogSource;
    use crate::persistence::{FileStorage, MemoryStorage};
    use crate::sim::entity::{Owner, Projectile};
    use crate::consts::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const LEVELS: &str = r#"[
        {"id": 1, "name": "Short", "waves": [
            {"type": "basic", "count": 1, "interval": 0.01, "formation": "single"}
        ], "powerUps": ["health"]},
        {"id": 2, "name": "Long", "waves": [
            {"type": "basic", "count": 5, "interval": 1.0, "formation": "line"},
            {"type": "fast", "count": 5, "interval": 1.0, "formation": "v-formation"}
        ]}
    ]"#;

    fn session_with(persistence: Persistence) -> (Session, Rc<RefCell<Vec<GameEvent>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut events = EventBus::new();
        events.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let library = LevelLibrary::new(CatalogSource::from_json(LEVELS));
        (Session::new(library, events, persistence, 99), log)
    }

    fn session() -> (Session, Rc<RefCell<Vec<GameEvent>>>) {
        session_with(Persistence::in_memory())
    }

    fn kill_player(session: &mut Session) {
        let player = &mut session.state.player;
        player.body.health = 1;
        player.invulnerable_timer = 0.0;
        player.power_ups.clear();
        session.state.projectiles.push(Projectile::new(
            session.state.player.body.pos.x + 5.0,
            session.state.player.body.pos.y + 5.0,
            0.0,
            ENEMY_SHOT_SPEED,
            Owner::Enemy,
        ));
        session.tick(&TickInput::default(), 0.001);
    }

    #[tokio::test]
    async fn test_start_enters_playing() {
        let (mut session, log) = session();
        assert_eq!(session.phase(), GamePhase::Menu);

        session.start(2).await.unwrap();
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.level_info().unwrap().name, "Long");
        assert_eq!(session.lives(), PLAYER_MAX_HEALTH);
        assert_eq!(session.statistics().games_played, 1);
        assert_eq!(*log.borrow(), vec![GameEvent::WaveStarted { wave: 1, total: 2 }]);
    }

    #[tokio::test]
    async fn test_failed_start_returns_to_menu() {
        let (mut session, _) = session();
        let err = session.start(99).await.unwrap_err();
        assert!(matches!(err, SessionError::Level(LevelError::NotFound(99))));
        assert_eq!(session.phase(), GamePhase::Menu);
        assert_eq!(session.statistics().games_played, 0);
    }

    #[tokio::test]
    async fn test_illegal_transitions_rejected() {
        let (mut session, _) = session();
        assert!(session.pause().is_err());
        assert!(session.resume().is_err());

        session.start(2).await.unwrap();
        assert!(matches!(
            session.start(1).await,
            Err(SessionError::InvalidTransition {
                action: "start",
                phase: GamePhase::Playing
            })
        ));
        assert!(session.go_to_menu().is_err());
        assert!(session.resume().is_err());
    }

    #[tokio::test]
    async fn test_pause_freezes_ticks() {
        let (mut session, _) = session();
        session.start(2).await.unwrap();

        session.pause().unwrap();
        session.tick(&TickInput::default(), 0.05);
        assert_eq!(session.state().elapsed, 0.0);

        session.resume().unwrap();
        session.tick(&TickInput::default(), 0.05);
        assert!(session.state().elapsed > 0.0);
    }

    #[tokio::test]
    async fn test_defeat_records_high_score() {
        let (mut session, log) = session();
        session.start(2).await.unwrap();
        session.state.score = 700;

        kill_player(&mut session);
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(session.lives(), 0);
        assert_eq!(session.high_score(), 700);
        assert_eq!(session.statistics().total_score, 700);
        assert!(log.borrow().contains(&GameEvent::NewHighScore { score: 700 }));
        assert!(log.borrow().contains(&GameEvent::GameOver {
            score: 700,
            victory: false
        }));
        assert!(!session.progress().is_unlocked(3));
    }

    #[tokio::test]
    async fn test_victory_unlocks_next_level() {
        let (mut session, log) = session();
        session.start(1).await.unwrap();

        session.tick(&TickInput::default(), 0.02);
        assert_eq!(session.state().enemies.len(), 1);
        session.state.enemies.clear();
        let summary = session.tick(&TickInput::default(), 0.02);

        assert_eq!(summary.ended, Some(true));
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(session.statistics().levels_completed, 1);
        assert!(session.progress().is_unlocked(2));
        assert!(log.borrow().contains(&GameEvent::LevelComplete { level: 1 }));
    }

    #[tokio::test]
    async fn test_restart_resets_run() {
        let (mut session, _) = session();
        session.start(2).await.unwrap();
        for _ in 0..30 {
            session.tick(&TickInput::default(), 0.05);
        }
        assert!(!session.state().enemies.is_empty());
        kill_player(&mut session);
        assert_eq!(session.phase(), GamePhase::GameOver);

        session.start(2).await.unwrap();
        assert!(session.state().enemies.is_empty());
        assert!(session.state().projectiles.is_empty());
        assert_eq!(session.score(), 0);
        assert_eq!(session.lives(), PLAYER_MAX_HEALTH);
        assert_eq!(session.director().cursor().spawned, 0);
        assert_eq!(session.statistics().games_played, 2);
    }

    #[tokio::test]
    async fn test_go_to_menu_from_game_over() {
        let (mut session, _) = session();
        session.start(2).await.unwrap();
        kill_player(&mut session);

        session.go_to_menu().unwrap();
        assert_eq!(session.phase(), GamePhase::Menu);
        assert!(session.level_info().is_none());
    }

    #[tokio::test]
    async fn test_go_to_menu_rejected_while_paused() {
        let (mut session, _) = session();
        session.start(1).await.unwrap();
        session.pause().unwrap();

        assert!(matches!(
            session.go_to_menu(),
            Err(SessionError::InvalidTransition {
                phase: GamePhase::Paused,
                ..
            })
        ));
        assert_eq!(session.phase(), GamePhase::Paused);

        session.resume().unwrap();
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[tokio::test]
    async fn test_initialize_preloads() {
        let (session, _) = session();
        let outcomes = session.initialize(&[1, 99]).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].loaded());
        assert!(!outcomes[1].loaded());
        assert!(session.director().library().is_cached(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_builtin_campaign_starts() {
        let mut session = Session::new(
            LevelLibrary::builtin(),
            EventBus::new(),
            Persistence::in_memory(),
            1,
        );
        session.start(1).await.unwrap();
        let info = session.level_info().unwrap();
        assert_eq!(info.total_waves, 3);
        assert_eq!(session.director().total_levels(), 5);

        let snapshot = session.render_snapshot();
        assert_eq!(snapshot.sprites.len(), 1);
        assert_eq!(snapshot.hud.phase, GamePhase::Playing);
        assert_eq!(snapshot.hud.level, Some(info));
    }

    #[tokio::test]
    async fn test_unavailable_storage_does_not_break_play() {
        let (mut session, _) = session_with(Persistence::new(MemoryStorage::unavailable()));
        session.start(2).await.unwrap();
        session.state.score = 100;
        kill_player(&mut session);
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(session.high_score(), 100);
        assert!(!session.update_settings(Settings::default()));
    }

    #[tokio::test]
    async fn test_records_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (mut session, _) = session_with(Persistence::new(FileStorage::new(dir.path())));
            session.start(2).await.unwrap();
            session.state.score = 4200;
            kill_player(&mut session);
        }

        let (session, _) = session_with(Persistence::new(FileStorage::new(dir.path())));
        assert_eq!(session.high_score(), 4200);
        assert_eq!(session.statistics().games_played, 1);
        assert!(session.progress().play_time > 0.0);
    }

    #[tokio::test]
    async fn test_export_then_clear_then_import() {
        let (mut session, _) = session();
        session.start(2).await.unwrap();
        session.state.score = 300;
        kill_player(&mut session);

        let bundle = session.export_data().unwrap();
        assert!(session.clear_saved_data());
        assert_eq!(session.high_score(), 0);

        assert!(session.import_data(&bundle));
        assert_eq!(session.high_score(), 300);
        assert_eq!(session.statistics().games_played, 1);
    }
}
