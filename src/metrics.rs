//! Prometheus-compatible metrics endpoint
//!
//! Exposes simulation counters and tick timing in Prometheus text format.
//! The runner serves them on http://localhost:<METRICS_PORT>/metrics when
//! a port is configured.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::game::performance::PerformanceStatus;
use crate::game::simulation::TickReport;
use crate::game::systems::collision::CollisionEvent;
use crate::game::systems::player::PlayerEvent;

/// Samples kept for percentile calculation
const TICK_HISTORY_LEN: usize = 1000;

/// Metrics registry for one simulation
#[derive(Debug)]
pub struct SimulationMetrics {
    // Tick counter
    pub tick_count: AtomicU64,
    pub score: AtomicU64,
    pub lives: AtomicU64,

    // Entity counts
    pub obstacle_count: AtomicU64,
    pub power_up_count: AtomicU64,
    pub bullet_count: AtomicU64,

    // Event counters
    pub waves_spawned: AtomicU64,
    pub obstacles_spawned: AtomicU64,
    pub power_ups_spawned: AtomicU64,
    pub bullets_fired: AtomicU64,
    pub obstacles_destroyed: AtomicU64,
    pub power_ups_collected: AtomicU64,
    pub lives_lost: AtomicU64,
    pub games_over: AtomicU64,

    // Input
    pub commands_applied: AtomicU64,
    pub commands_debounced: AtomicU64,
    pub commands_ignored: AtomicU64,

    // Tick timing (microseconds)
    pub tick_time_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,
    pub tick_time_p99_us: AtomicU64,
    pub tick_time_max_us: AtomicU64,

    // Performance status (0=Good, 1=Warning, 2=Critical)
    pub performance_status: AtomicU64,
    pub budget_usage_percent: AtomicU64,

    start_time: Instant,

    // Rolling tick times for percentile calculation
    tick_history: RwLock<VecDeque<u64>>,
}

impl SimulationMetrics {
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            score: AtomicU64::new(0),
            lives: AtomicU64::new(0),
            obstacle_count: AtomicU64::new(0),
            power_up_count: AtomicU64::new(0),
            bullet_count: AtomicU64::new(0),
            waves_spawned: AtomicU64::new(0),
            obstacles_spawned: AtomicU64::new(0),
            power_ups_spawned: AtomicU64::new(0),
            bullets_fired: AtomicU64::new(0),
            obstacles_destroyed: AtomicU64::new(0),
            power_ups_collected: AtomicU64::new(0),
            lives_lost: AtomicU64::new(0),
            games_over: AtomicU64::new(0),
            commands_applied: AtomicU64::new(0),
            commands_debounced: AtomicU64::new(0),
            commands_ignored: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            tick_time_p99_us: AtomicU64::new(0),
            tick_time_max_us: AtomicU64::new(0),
            performance_status: AtomicU64::new(0),
            budget_usage_percent: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(TICK_HISTORY_LEN)),
        }
    }

    /// Fold one tick's report into the counters
    pub fn record_tick(&self, report: &TickReport) {
        if report.idle {
            self.commands_ignored
                .fetch_add(report.commands_ignored as u64, Ordering::Relaxed);
            return;
        }

        self.tick_count.fetch_add(1, Ordering::Relaxed);
        self.commands_applied
            .fetch_add(report.commands_applied as u64, Ordering::Relaxed);
        self.commands_debounced
            .fetch_add(report.commands_debounced as u64, Ordering::Relaxed);
        self.commands_ignored
            .fetch_add(report.commands_ignored as u64, Ordering::Relaxed);

        if let Some(wave) = &report.spawned.wave {
            self.waves_spawned.fetch_add(1, Ordering::Relaxed);
            self.obstacles_spawned
                .fetch_add(wave.ids.len() as u64, Ordering::Relaxed);
        }
        if report.spawned.power_up.is_some() {
            self.power_ups_spawned.fetch_add(1, Ordering::Relaxed);
        }

        for event in &report.events {
            let counter = match event {
                PlayerEvent::Fired { .. } => &self.bullets_fired,
                PlayerEvent::ObstacleDestroyed { .. } => &self.obstacles_destroyed,
                PlayerEvent::PowerUpCollected { .. } => &self.power_ups_collected,
                PlayerEvent::LifeLost { .. } => &self.lives_lost,
                PlayerEvent::GameOver { .. } => &self.games_over,
                PlayerEvent::Moved { .. } => continue,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let collisions = report
            .collisions
            .iter()
            .filter(|c| matches!(c, CollisionEvent::PlayerHitObstacle(_)))
            .count();
        if collisions > 0 {
            debug!(tick = report.tick, collisions, "player collisions recorded");
        }
    }

    /// Update gauges from the current state
    pub fn record_state(&self, score: u64, lives: u32, obstacles: usize, power_ups: usize, bullets: usize) {
        self.score.store(score, Ordering::Relaxed);
        self.lives.store(lives as u64, Ordering::Relaxed);
        self.obstacle_count.store(obstacles as u64, Ordering::Relaxed);
        self.power_up_count.store(power_ups as u64, Ordering::Relaxed);
        self.bullet_count.store(bullets as u64, Ordering::Relaxed);
    }

    pub fn record_performance(&self, status: PerformanceStatus, budget_percent: f32) {
        self.performance_status.store(status.as_gauge(), Ordering::Relaxed);
        self.budget_usage_percent
            .store(budget_percent.max(0.0) as u64, Ordering::Relaxed);
    }

    /// Record a tick time and update percentiles
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);

        let mut history = self.tick_history.write();
        history.push_back(us);
        while history.len() > TICK_HISTORY_LEN {
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

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    fn status_name(&self) -> &'static str {
        match self.performance_status.load(Ordering::Relaxed) {
            0 => "good",
            1 => "warning",
            _ => "critical",
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

        metric!("lane_dodger_ticks_total", "Total ticks simulated", "counter",
            self.tick_count.load(Ordering::Relaxed));
        metric!("lane_dodger_score", "Current score", "gauge",
            self.score.load(Ordering::Relaxed));
        metric!("lane_dodger_lives", "Current lives", "gauge",
            self.lives.load(Ordering::Relaxed));

        // Entity gauges
        metric!("lane_dodger_obstacles", "Active obstacles", "gauge",
            self.obstacle_count.load(Ordering::Relaxed));
        metric!("lane_dodger_power_ups", "Active stars", "gauge",
            self.power_up_count.load(Ordering::Relaxed));
        metric!("lane_dodger_bullets", "Active bullets", "gauge",
            self.bullet_count.load(Ordering::Relaxed));

        // Event counters
        metric!("lane_dodger_waves_spawned_total", "Obstacle waves spawned", "counter",
            self.waves_spawned.load(Ordering::Relaxed));
        metric!("lane_dodger_obstacles_spawned_total", "Obstacles spawned", "counter",
            self.obstacles_spawned.load(Ordering::Relaxed));
        metric!("lane_dodger_power_ups_spawned_total", "Stars spawned", "counter",
            self.power_ups_spawned.load(Ordering::Relaxed));
        metric!("lane_dodger_bullets_fired_total", "Bullets fired", "counter",
            self.bullets_fired.load(Ordering::Relaxed));
        metric!("lane_dodger_obstacles_destroyed_total", "Obstacles destroyed by bullets", "counter",
            self.obstacles_destroyed.load(Ordering::Relaxed));
        metric!("lane_dodger_power_ups_collected_total", "Stars collected", "counter",
            self.power_ups_collected.load(Ordering::Relaxed));
        metric!("lane_dodger_lives_lost_total", "Lives lost to obstacles", "counter",
            self.lives_lost.load(Ordering::Relaxed));
        metric!("lane_dodger_games_over_total", "Games ended", "counter",
            self.games_over.load(Ordering::Relaxed));

        // Input
        metric!("lane_dodger_commands_applied_total", "Commands applied", "counter",
            self.commands_applied.load(Ordering::Relaxed));
        metric!("lane_dodger_commands_debounced_total", "Commands rejected by debounce", "counter",
            self.commands_debounced.load(Ordering::Relaxed));
        metric!("lane_dodger_commands_ignored_total", "Commands ignored", "counter",
            self.commands_ignored.load(Ordering::Relaxed));

        // Performance
        metric!("lane_dodger_tick_time_microseconds", "Current tick time in microseconds", "gauge",
            self.tick_time_us.load(Ordering::Relaxed));
        metric!("lane_dodger_tick_time_p95_microseconds", "95th percentile tick time", "gauge",
            self.tick_time_p95_us.load(Ordering::Relaxed));
        metric!("lane_dodger_tick_time_p99_microseconds", "99th percentile tick time", "gauge",
            self.tick_time_p99_us.load(Ordering::Relaxed));
        metric!("lane_dodger_tick_time_max_microseconds", "Maximum tick time", "gauge",
            self.tick_time_max_us.load(Ordering::Relaxed));
        metric!("lane_dodger_performance_status", "Performance status (0=Good, 2=Critical)", "gauge",
            self.performance_status.load(Ordering::Relaxed));
        metric!("lane_dodger_budget_usage_percent", "Tick budget usage percentage", "gauge",
            self.budget_usage_percent.load(Ordering::Relaxed));
        output.push_str(&format!(
            "# HELP lane_dodger_performance_state Human-readable performance state\n# TYPE lane_dodger_performance_state gauge\nlane_dodger_performance_state{{state=\"{}\"}} 1\n",
            self.status_name()
        ));

        metric!("lane_dodger_uptime_seconds", "Runner uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }

    /// Generate JSON format metrics
    pub fn to_json(&self) -> String {
        format!(r#"{{
  "game": {{
    "ticks": {},
    "score": {},
    "lives": {},
    "games_over": {}
  }},
  "entities": {{
    "obstacles": {},
    "power_ups": {},
    "bullets": {}
  }},
  "events": {{
    "waves_spawned": {},
    "obstacles_spawned": {},
    "power_ups_spawned": {},
    "bullets_fired": {},
    "obstacles_destroyed": {},
    "power_ups_collected": {},
    "lives_lost": {}
  }},
  "input": {{
    "applied": {},
    "debounced": {},
    "ignored": {}
  }},
  "performance": {{
    "tick_time_us": {},
    "tick_time_p95_us": {},
    "tick_time_p99_us": {},
    "tick_time_max_us": {},
    "status": {},
    "status_name": "{}",
    "budget_percent": {},
    "uptime_seconds": {}
  }}
}}"#,
            self.tick_count.load(Ordering::Relaxed),
            self.score.load(Ordering::Relaxed),
            self.lives.load(Ordering::Relaxed),
            self.games_over.load(Ordering::Relaxed),
            self.obstacle_count.load(Ordering::Relaxed),
            self.power_up_count.load(Ordering::Relaxed),
            self.bullet_count.load(Ordering::Relaxed),
            self.waves_spawned.load(Ordering::Relaxed),
            self.obstacles_spawned.load(Ordering::Relaxed),
            self.power_ups_spawned.load(Ordering::Relaxed),
            self.bullets_fired.load(Ordering::Relaxed),
            self.obstacles_destroyed.load(Ordering::Relaxed),
            self.power_ups_collected.load(Ordering::Relaxed),
            self.lives_lost.load(Ordering::Relaxed),
            self.commands_applied.load(Ordering::Relaxed),
            self.commands_debounced.load(Ordering::Relaxed),
            self.commands_ignored.load(Ordering::Relaxed),
            self.tick_time_us.load(Ordering::Relaxed),
            self.tick_time_p95_us.load(Ordering::Relaxed),
            self.tick_time_p99_us.load(Ordering::Relaxed),
            self.tick_time_max_us.load(Ordering::Relaxed),
            self.performance_status.load(Ordering::Relaxed),
            self.status_name(),
            self.budget_usage_percent.load(Ordering::Relaxed),
            self.uptime_seconds(),
        )
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve `/metrics`, `/metrics/json` and `/health` over plain HTTP
pub async fn start_metrics_server(metrics: Arc<SimulationMetrics>, port: u16) -> std::io::Result<()> {
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
                    let response = route(&request, &metrics);
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

fn route(request: &str, metrics: &SimulationMetrics) -> String {
    let (content_type, body) = if request.starts_with("GET /metrics/json") {
        ("application/json", metrics.to_json())
    } else if request.starts_with("GET /metrics") {
        ("text/plain; version=0.0.4", metrics.to_prometheus())
    } else if request.starts_with("GET /health") {
        ("text/plain", "OK".to_string())
    } else {
        return "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string();
    };
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    )
}
