//! Star Runner headless runner
//!
//! Plays one level with a simple autopilot and logs the run. Useful for
//! smoke-testing level data and balancing without a renderer.
//!
//! Usage: `star-runner [level] [seed]`
//! Set `STAR_RUNNER_DATA=<dir>` to persist scores between runs.

use star_runner::consts::*;
use star_runner::persistence::{FileStorage, Persistence};
use star_runner::platform::{FrameClock, InputSource};
use star_runner::sim::{GamePhase, GameState, TickInput};
use star_runner::{EventBus, LevelLibrary, Session};

/// Simulated frame length fed to the clock
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Give up after this many simulated seconds
const MAX_RUN_SECS: f64 = 600.0;

/// Steers under the lowest enemy and keeps firing
#[derive(Debug, Default)]
struct Autopilot {
    player_x: f32,
    target_x: Option<f32>,
}

impl Autopilot {
    fn observe(&mut self, state: &GameState) {
        self.player_x = state.player.body.center().x;
        self.target_x = state
            .enemies
            .iter()
            .filter(|e| e.body.active && e.body.pos.y > 0.0)
            .max_by(|a, b| a.body.pos.y.total_cmp(&b.body.pos.y))
            .map(|e| e.body.center().x);
    }
}

impl InputSource for Autopilot {
    fn poll(&mut self) -> TickInput {
        let target = self.target_x.unwrap_or(PLAYFIELD_WIDTH / 2.0);
        let offset = target - self.player_x;
        TickInput {
            left: offset < -4.0,
            right: offset > 4.0,
            fire: self.target_x.is_some(),
            ..Default::default()
        }
    }
}

fn persistence() -> Persistence {
    match std::env::var("STAR_RUNNER_DATA") {
        Ok(dir) => {
            log::info!("Saving to {}", dir);
            Persistence::new(FileStorage::new(dir))
        }
        Err(_) => Persistence::in_memory(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let level: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(rand::random);

    log::info!("Star Runner starting (level {}, seed {})", level, seed);

    let mut events = EventBus::new();
    events.subscribe(|event| match serde_json::to_string(event) {
        Ok(json) => log::info!("event {}", json),
        Err(e) => log::warn!("Unserializable event {}: {}", event.name(), e),
    });

    let mut session = Session::new(LevelLibrary::builtin(), events, persistence(), seed);
    // Warm the next level too so a victory can roll straight into it
    session.initialize(&[level, level + 1]).await;

    if let Err(e) = session.start(level).await {
        log::error!("Could not start level {}: {}", level, e);
        std::process::exit(1);
    }

    let mut autopilot = Autopilot::default();
    let mut clock = FrameClock::new();
    let mut time_ms = 0.0;

    while session.phase() != GamePhase::GameOver && time_ms < MAX_RUN_SECS * 1000.0 {
        autopilot.observe(session.state());
        let input = autopilot.poll();
        let dt = clock.frame(time_ms);
        session.tick(&input, dt);
        time_ms += FRAME_MS;

        if (time_ms as u64) % 10_000 < FRAME_MS as u64 {
            let snapshot = session.render_snapshot();
            log::debug!(
                "t={:.0}s score={} lives={} sprites={} fps={}",
                time_ms / 1000.0,
                snapshot.hud.score,
                snapshot.hud.lives,
                snapshot.sprites.len(),
                clock.fps()
            );
        }
    }

    let state = session.state();
    match state.victory {
        Some(true) => log::info!("Level {} cleared", level),
        Some(false) => log::info!("Ship destroyed"),
        None => log::warn!("Run stopped after {:.0}s without finishing", MAX_RUN_SECS),
    }
    log::info!(
        "Score {} | enemies {} | power-ups {} | {:.1}s | best {}",
        state.score,
        state.enemies_defeated,
        state.power_ups_collected,
        state.elapsed,
        session.high_score()
    );
}
