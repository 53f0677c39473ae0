//! Prometheus-compatible metrics endpoint
//!
//! Exposes simulation metrics in Prometheus format.
//! Default endpoint: http://localhost:9090/metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::game::engine::{Simulation, StepReport};
use crate::game::events::{DeathCause, WorldEvent};
use crate::game::state::World;

/// Samples kept for percentile calculation
const TICK_HISTORY: usize = 1000;

/// Metrics registry for the simulation
#[derive(Debug)]
pub struct Metrics {
    // Population
    pub agents_total: AtomicU64,
    pub agents_alive: AtomicU64,
    pub bots: AtomicU64,
    pub food_count: AtomicU64,

    // Player
    pub player_alive: AtomicU64,
    pub player_mass: AtomicU64,
    pub player_score: AtomicU64,
    pub player_kills: AtomicU64,

    // Lifetime counters
    pub deaths_total: AtomicU64,
    pub boundary_deaths_total: AtomicU64,
    pub kills_credited_total: AtomicU64,
    pub food_eaten_total: AtomicU64,
    pub bots_replaced_total: AtomicU64,
    pub events_dropped_total: AtomicU64,

    // Step timing (microseconds)
    pub tick_time_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,
    pub tick_time_p99_us: AtomicU64,
    pub tick_time_max_us: AtomicU64,
    pub tick_count: AtomicU64,

    // Performance status (0=Excellent, 1=Good, 2=Warning, 3=Critical, 4=Catastrophic)
    pub performance_status: AtomicU64,
    pub budget_usage_percent: AtomicU64,

    start_time: Instant,
    tick_history: RwLock<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            agents_total: AtomicU64::new(0),
            agents_alive: AtomicU64::new(0),
            bots: AtomicU64::new(0),
            food_count: AtomicU64::new(0),
            player_alive: AtomicU64::new(0),
            player_mass: AtomicU64::new(0),
            player_score: AtomicU64::new(0),
            player_kills: AtomicU64::new(0),
            deaths_total: AtomicU64::new(0),
            boundary_deaths_total: AtomicU64::new(0),
            kills_credited_total: AtomicU64::new(0),
            food_eaten_total: AtomicU64::new(0),
            bots_replaced_total: AtomicU64::new(0),
            events_dropped_total: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            tick_time_p99_us: AtomicU64::new(0),
            tick_time_max_us: AtomicU64::new(0),
            tick_count: AtomicU64::new(0),
            performance_status: AtomicU64::new(0),
            budget_usage_percent: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(TICK_HISTORY)),
        }
    }

    /// Record a step time and update percentiles
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);
        self.tick_count.fetch_add(1, Ordering::Relaxed);

        let mut history = self.tick_history.write();
        history.push_back(us);
        while history.len() > TICK_HISTORY {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();

            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            let p99_idx = (sorted.len() as f32 * 0.99) as usize;

            self.tick_time_p95_us.store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.tick_time_p99_us.store(sorted[p99_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.tick_time_max_us.store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    /// Refresh population and player gauges from the world
    pub fn observe_world(&self, world: &World) {
        self.agents_total.store(world.agents.len() as u64, Ordering::Relaxed);
        self.agents_alive.store(world.alive_count() as u64, Ordering::Relaxed);
        self.bots.store(world.autonomous_count() as u64, Ordering::Relaxed);
        self.food_count.store(world.foods.len() as u64, Ordering::Relaxed);

        match world.player() {
            Some(player) => {
                self.player_alive.store(player.is_alive() as u64, Ordering::Relaxed);
                self.player_mass.store(player.mass.max(0.0) as u64, Ordering::Relaxed);
                self.player_score.store(player.score as u64, Ordering::Relaxed);
                self.player_kills.store(player.kills as u64, Ordering::Relaxed);
            }
            None => self.player_alive.store(0, Ordering::Relaxed),
        }
    }

    /// Fold one step into the counters and gauges
    pub fn observe_step(&self, sim: &Simulation, report: &StepReport) {
        self.observe_world(sim.world());

        self.deaths_total.fetch_add(report.deaths as u64, Ordering::Relaxed);
        let mut boundary = 0;
        let mut credited = 0;
        for event in &report.events {
            match event {
                WorldEvent::AgentDied {
                    cause: DeathCause::OutOfBounds,
                    ..
                } => boundary += 1,
                // Credit only goes to whoever ran into the player
                WorldEvent::AgentDied {
                    id,
                    cause: DeathCause::BodyCollision { .. },
                } if id.is_player() => credited += 1,
                _ => {}
            }
        }
        self.boundary_deaths_total.fetch_add(boundary, Ordering::Relaxed);
        self.kills_credited_total.fetch_add(credited, Ordering::Relaxed);
        self.food_eaten_total.fetch_add(report.food_eaten as u64, Ordering::Relaxed);
        self.bots_replaced_total.fetch_add(report.bots_replaced as u64, Ordering::Relaxed);
        self.events_dropped_total.store(sim.dropped_events(), Ordering::Relaxed);

        if let Some(duration) = report.duration {
            self.record_tick_time(duration);
        }
        let monitor = sim.monitor();
        self.performance_status.store(monitor.status().level(), Ordering::Relaxed);
        self.budget_usage_percent.store(monitor.budget_usage_percent() as u64, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    fn status_name(&self) -> &'static str {
        match self.performance_status.load(Ordering::Relaxed) {
            0 => "excellent",
            1 => "good",
            2 => "warning",
            3 => "critical",
            _ => "catastrophic",
        }
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(4096);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("slither_agents_total", "Agents in the world (dead player included)", "gauge",
            self.agents_total.load(Ordering::Relaxed));
        metric!("slither_agents_alive", "Live agents", "gauge",
            self.agents_alive.load(Ordering::Relaxed));
        metric!("slither_bots", "Autonomous agents", "gauge",
            self.bots.load(Ordering::Relaxed));
        metric!("slither_food", "Food items in the world", "gauge",
            self.food_count.load(Ordering::Relaxed));

        metric!("slither_player_alive", "Player alive (0/1)", "gauge",
            self.player_alive.load(Ordering::Relaxed));
        metric!("slither_player_mass", "Player mass (floored)", "gauge",
            self.player_mass.load(Ordering::Relaxed));
        metric!("slither_player_score", "Player score", "gauge",
            self.player_score.load(Ordering::Relaxed));
        metric!("slither_player_kills", "Player kills", "gauge",
            self.player_kills.load(Ordering::Relaxed));

        metric!("slither_deaths_total", "Agent deaths", "counter",
            self.deaths_total.load(Ordering::Relaxed));
        metric!("slither_boundary_deaths_total", "Agent deaths from leaving the map", "counter",
            self.boundary_deaths_total.load(Ordering::Relaxed));
        metric!("slither_kills_credited_total", "Kills credited for taking out the player", "counter",
            self.kills_credited_total.load(Ordering::Relaxed));
        metric!("slither_food_eaten_total", "Food items eaten", "counter",
            self.food_eaten_total.load(Ordering::Relaxed));
        metric!("slither_bots_replaced_total", "Dead bots replaced", "counter",
            self.bots_replaced_total.load(Ordering::Relaxed));
        metric!("slither_events_dropped_total", "Events dropped on full subscriber queues", "counter",
            self.events_dropped_total.load(Ordering::Relaxed));

        metric!("slither_tick_time_microseconds", "Current step time in microseconds", "gauge",
            self.tick_time_us.load(Ordering::Relaxed));
        metric!("slither_tick_time_p95_microseconds", "95th percentile step time", "gauge",
            self.tick_time_p95_us.load(Ordering::Relaxed));
        metric!("slither_tick_time_p99_microseconds", "99th percentile step time", "gauge",
            self.tick_time_p99_us.load(Ordering::Relaxed));
        metric!("slither_tick_time_max_microseconds", "Maximum step time", "gauge",
            self.tick_time_max_us.load(Ordering::Relaxed));
        metric!("slither_tick_count", "Total steps processed", "counter",
            self.tick_count.load(Ordering::Relaxed));

        metric!("slither_performance_status", "Performance status (0=Excellent, 4=Catastrophic)", "gauge",
            self.performance_status.load(Ordering::Relaxed));
        metric!("slither_budget_usage_percent", "Step budget usage percentage", "gauge",
            self.budget_usage_percent.load(Ordering::Relaxed));
        output.push_str(&format!(
            "# HELP slither_performance_state Human-readable performance state\n# TYPE slither_performance_state gauge\nslither_performance_state{{state=\"{}\"}} 1\n",
            self.status_name()
        ));

        metric!("slither_uptime_seconds", "Process uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }

    /// JSON form of the same metrics
    pub fn to_json(&self) -> String {
        let load = |v: &AtomicU64| v.load(Ordering::Relaxed);
        serde_json::json!({
            "population": {
                "agents": load(&self.agents_total),
                "alive": load(&self.agents_alive),
                "bots": load(&self.bots),
                "food": load(&self.food_count),
            },
            "player": {
                "alive": load(&self.player_alive) == 1,
                "mass": load(&self.player_mass),
                "score": load(&self.player_score),
                "kills": load(&self.player_kills),
            },
            "totals": {
                "deaths": load(&self.deaths_total),
                "boundary_deaths": load(&self.boundary_deaths_total),
                "kills_credited": load(&self.kills_credited_total),
                "food_eaten": load(&self.food_eaten_total),
                "bots_replaced": load(&self.bots_replaced_total),
                "events_dropped": load(&self.events_dropped_total),
            },
            "performance": {
                "tick_time_us": load(&self.tick_time_us),
                "tick_time_p95_us": load(&self.tick_time_p95_us),
                "tick_time_p99_us": load(&self.tick_time_p99_us),
                "tick_time_max_us": load(&self.tick_time_max_us),
                "tick_count": load(&self.tick_count),
                "status": load(&self.performance_status),
                "status_name": self.status_name(),
                "budget_percent": load(&self.budget_usage_percent),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
        .to_string()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn http_response(content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    )
}

/// Start the metrics HTTP server
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on http://{}/metrics", addr);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);

                    // More specific paths first
                    let response = if request.starts_with("GET /metrics/json") {
                        http_response("application/json", &metrics.to_json())
                    } else if request.starts_with("GET /metrics") {
                        http_response("text/plain; version=0.0.4", &metrics.to_prometheus())
                    } else if request.starts_with("GET /health") {
                        http_response("text/plain", "OK")
                    } else {
                        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
                    };

                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}
