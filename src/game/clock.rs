//! Fixed-interval simulation driver
//!
//! Ticks the simulation on a tokio interval, publishes a render snapshot
//! after every step and stops on game over, a tick limit or an external
//! shutdown signal. Missed ticks are delayed rather than bursted so the
//! simulation never runs faster than its configured rate.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::game::input_buffer::CommandSender;
use crate::game::performance::{PerformanceMonitor, PerformanceStatus};
use crate::game::simulation::{Simulation, TickReport};
use crate::metrics::SimulationMetrics;
use crate::net::protocol::RenderSnapshot;

/// Why the clock stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GameOver { final_score: u64 },
    TickLimit,
    Shutdown,
}

pub struct SimulationClock<R: Rng> {
    simulation: Simulation<R>,
    tick_interval: Duration,
    max_ticks: Option<u64>,
    monitor: PerformanceMonitor,
    metrics: Option<Arc<SimulationMetrics>>,
    snapshots: watch::Sender<RenderSnapshot>,
}

impl<R: Rng> SimulationClock<R> {
    pub fn new(simulation: Simulation<R>) -> Self {
        let tick_interval = simulation.config().tick_interval();
        let (snapshots, _) = watch::channel(simulation.snapshot());
        Self {
            simulation,
            tick_interval,
            max_ticks: None,
            monitor: PerformanceMonitor::new(tick_interval),
            metrics: None,
            snapshots,
        }
    }

    /// Stop after this many ticks
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<SimulationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Receiver for the latest render snapshot
    pub fn subscribe(&self) -> watch::Receiver<RenderSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn command_sender(&self) -> CommandSender {
        self.simulation.command_sender()
    }

    pub fn simulation(&self) -> &Simulation<R> {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation<R> {
        &mut self.simulation
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Run until the game ends, the tick limit is hit or `shutdown` resolves
    ///
    /// Hands the simulation back so the caller can read the final state.
    pub async fn run<F>(mut self, shutdown: F) -> (StopReason, Simulation<R>)
    where
        F: Future<Output = ()>,
    {
        let mut interval = time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            interval_ms = self.tick_interval.as_millis() as u64,
            max_ticks = ?self.max_ticks,
            "simulation clock started"
        );

        let reason = loop {
            let stopping = tokio::select! {
                _ = &mut shutdown => true,
                _ = interval.tick() => false,
            };
            if stopping {
                break StopReason::Shutdown;
            }

            let report = self.step();
            if report.game_over || report.idle {
                let final_score = self.simulation.final_score().unwrap_or_default();
                break StopReason::GameOver { final_score };
            }
            if self
                .max_ticks
                .is_some_and(|max| self.simulation.tick_count() >= max)
            {
                break StopReason::TickLimit;
            }
        };

        info!(
            ?reason,
            ticks = self.simulation.tick_count(),
            score = self.simulation.score(),
            performance = %self.monitor.status_message(),
            p95_us = self.monitor.p95_tick_duration().as_micros() as u64,
            "simulation clock stopped"
        );
        (reason, self.simulation)
    }

    /// Advance one tick, record timing and publish the snapshot
    pub fn step(&mut self) -> TickReport {
        let previous = self.monitor.status();

        self.monitor.tick_start();
        let report = self.simulation.tick();
        let state = self.simulation.state();
        let elapsed = self.monitor.tick_end(state.entities.entity_count());

        let status = self.monitor.status();
        if status != previous {
            match status {
                PerformanceStatus::Good => info!(status = status.as_str(), "tick budget recovered"),
                _ => warn!(
                    status = status.as_str(),
                    budget_percent = self.monitor.budget_usage_percent(),
                    "tick budget degraded"
                ),
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_tick(&report);
            metrics.record_state(
                state.score.value(),
                state.player.lives,
                state.entities.obstacles.len(),
                state.entities.power_ups.len(),
                state.entities.bullets.len(),
            );
            if let Some(elapsed) = elapsed {
                metrics.record_tick_time(elapsed);
            }
            metrics.record_performance(status, self.monitor.budget_usage_percent());
        }

        self.snapshots.send_replace(self.simulation.snapshot());
        report
    }
}
