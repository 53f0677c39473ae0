use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use slither_arena::game::constants::clock::FRAME_SECONDS;
use slither_arena::game::constants::progression::LEADERBOARD_SIZE;
use slither_arena::game::constants::world::DEFAULT_SKIN;
use slither_arena::game::events::{WorldEvent, DEFAULT_EVENT_CAPACITY};
use slither_arena::game::input::InputLatch;
use slither_arena::game::state::AgentId;
use slither_arena::metrics::{self, Metrics};
use slither_arena::{FrameClock, SimConfig, Simulation};

/// Simulated seconds the player stays dead before the driver respawns it
const RESPAWN_DELAY_SECS: f32 = 3.0;
/// How often the stand-in input source steers the player
const STEER_INTERVAL: Duration = Duration::from_millis(250);
/// How often the leaderboard is logged
const LEADERBOARD_INTERVAL: Duration = Duration::from_secs(10);
const PLAYER_COLOR: &str = "#00ff88";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Slither Arena v{}", env!("CARGO_PKG_VERSION"));

    let config = SimConfig::load_or_default();
    info!(
        "Configuration loaded: {}x{} map, food_target={}, bots={}, tick_rate={}",
        config.map_width, config.map_height, config.food_target, config.bot_count, config.tick_rate
    );

    let mut sim = Simulation::new(&config, &config.player_name, PLAYER_COLOR, DEFAULT_SKIN)?;
    let metrics = Arc::new(Metrics::new());

    #[cfg(feature = "metrics_server")]
    if config.metrics_enabled {
        let metrics_clone = metrics.clone();
        let port = config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = metrics::start_metrics_server(metrics_clone, port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    // Events are consumed off the step loop; the thread ends when the sink drops
    let events = sim.subscribe(DEFAULT_EVENT_CAPACITY);
    let logger = std::thread::Builder::new()
        .name("event-log".to_string())
        .spawn(move || {
            while let Some(event) = events.recv() {
                log_event(&event);
            }
        })?;

    let steering = tokio::spawn(steer_player(sim.input(), config.seed));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        _ = run(&mut sim, &metrics, &config) => {}
        _ = shutdown => {
            info!("Shutting down...");
        }
    }

    steering.abort();
    info!(
        "Stopped after {} steps, {} events dropped",
        sim.world().tick,
        sim.dropped_events()
    );
    drop(sim);
    if logger.join().is_err() {
        warn!("Event logger thread panicked");
    }

    Ok(())
}

/// Step the world at the configured rate until cancelled
async fn run(sim: &mut Simulation, metrics: &Metrics, config: &SimConfig) {
    let mut clock = FrameClock::new(config.tick_rate);
    let mut dead_frames: Option<f32> = None;
    let mut last_board = std::time::Instant::now();

    loop {
        let dt = clock.next_delta().await;
        let report = sim.step(dt);
        metrics.observe_step(sim, &report);

        if report
            .events
            .iter()
            .any(|e| matches!(e, WorldEvent::PlayerDied { .. }))
        {
            dead_frames = Some(0.0);
        }

        if let Some(frames) = dead_frames.as_mut() {
            *frames += report.delta_frames;
            if *frames * FRAME_SECONDS >= RESPAWN_DELAY_SECS
                && sim.respawn(&config.player_name, PLAYER_COLOR, DEFAULT_SKIN)
            {
                dead_frames = None;
            }
        }

        if last_board.elapsed() >= LEADERBOARD_INTERVAL {
            last_board = std::time::Instant::now();
            let board: Vec<String> = sim
                .leaderboard(LEADERBOARD_SIZE)
                .iter()
                .map(|e| format!("{}:{}", e.username, e.score))
                .collect();
            info!(
                "Leaderboard [{}] ({})",
                board.join(", "),
                sim.monitor().status_message()
            );
        }
    }
}

/// Stand-in for a pointer: drifts the player's heading and toggles boost now and then
async fn steer_player(input: InputLatch, seed: Option<u64>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };
    let mut heading: f32 = 0.0;
    let mut ticker = tokio::time::interval(STEER_INTERVAL);

    loop {
        ticker.tick().await;
        heading += rng.gen_range(-0.6..0.6);
        input.set_desired_heading(AgentId::PLAYER, heading);
        input.set_boost_intent(AgentId::PLAYER, rng.gen_bool(0.1));
    }
}

fn log_event(event: &WorldEvent) {
    match event {
        WorldEvent::PlayerDied { stats } => {
            info!(
                "Player died: score={} kills={} rank={} time_alive={}s xp={}",
                stats.score,
                stats.kills,
                stats.rank,
                stats.time_alive_secs,
                stats.xp_gained()
            );
        }
        WorldEvent::PlayerKilledSomeone { kills } => info!("Player kill #{}", kills),
        other => debug!("{:?}", other),
    }
}
