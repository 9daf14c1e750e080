//! Tick budget monitoring
//!
//! Tracks how much of the fixed tick interval each simulation step uses.
//! The clock reads the status to warn when ticks start eating into the
//! budget.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Minimum samples before the status is re-evaluated
const MIN_SAMPLES: usize = 10;

/// Performance status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerformanceStatus {
    /// Comfortably inside the tick budget
    #[default]
    Good,
    /// Most of the budget is used
    Warning,
    /// At or over budget, ticks will start to drift
    Critical,
}

impl PerformanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceStatus::Good => "good",
            PerformanceStatus::Warning => "warning",
            PerformanceStatus::Critical => "critical",
        }
    }

    /// Numeric gauge value for metrics
    pub fn as_gauge(&self) -> u64 {
        match self {
            PerformanceStatus::Good => 0,
            PerformanceStatus::Warning => 1,
            PerformanceStatus::Critical => 2,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, PerformanceStatus::Good)
    }
}

/// Rolling tick duration monitor
pub struct PerformanceMonitor {
    tick_durations: VecDeque<Duration>,
    max_samples: usize,
    /// Target tick duration (budget)
    target_tick_duration: Duration,
    /// Fraction of budget above which the status is Warning
    warning_threshold: f32,
    /// Fraction of budget above which the status is Critical
    critical_threshold: f32,
    status: PerformanceStatus,
    tick_start: Option<Instant>,
    last_entity_count: usize,
}

impl PerformanceMonitor {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_durations: VecDeque::with_capacity(100), // 2 seconds at 50Hz
            max_samples: 100,
            target_tick_duration: tick_interval,
            warning_threshold: 0.5,
            critical_threshold: 0.9,
            status: PerformanceStatus::Good,
            tick_start: None,
            last_entity_count: 0,
        }
    }

    /// Start timing a tick
    pub fn tick_start(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    /// End timing a tick. Returns the measured duration.
    pub fn tick_end(&mut self, entity_count: usize) -> Option<Duration> {
        let start = self.tick_start.take()?;
        let duration = start.elapsed();
        self.record_tick(duration);
        self.last_entity_count = entity_count;
        Some(duration)
    }

    pub fn record_tick(&mut self, duration: Duration) {
        self.tick_durations.push_back(duration);
        while self.tick_durations.len() > self.max_samples {
            self.tick_durations.pop_front();
        }
        self.update_status();
    }

    fn update_status(&mut self) {
        if self.tick_durations.len() < MIN_SAMPLES {
            return;
        }

        let ratio = self.budget_usage_percent() / 100.0;
        self.status = if ratio < self.warning_threshold {
            PerformanceStatus::Good
        } else if ratio < self.critical_threshold {
            PerformanceStatus::Warning
        } else {
            PerformanceStatus::Critical
        };
    }

    pub fn average_tick_duration(&self) -> Duration {
        if self.tick_durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.tick_durations.iter().sum();
        sum / self.tick_durations.len() as u32
    }

    /// 95th percentile tick duration
    pub fn p95_tick_duration(&self) -> Duration {
        if self.tick_durations.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.tick_durations.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted.get(idx.min(sorted.len() - 1)).copied().unwrap_or(Duration::ZERO)
    }

    pub fn status(&self) -> PerformanceStatus {
        self.status
    }

    /// Budget usage as percentage (0-100+)
    pub fn budget_usage_percent(&self) -> f32 {
        let budget = self.target_tick_duration.as_secs_f32();
        if budget <= 0.0 {
            return 0.0;
        }
        (self.average_tick_duration().as_secs_f32() / budget) * 100.0
    }

    pub fn last_entity_count(&self) -> usize {
        self.last_entity_count
    }

    pub fn sample_count(&self) -> usize {
        self.tick_durations.len()
    }

    pub fn status_message(&self) -> String {
        format!(
            "{} - {:.1}% budget, {} entities",
            self.status.as_str(),
            self.budget_usage_percent(),
            self.last_entity_count
        )
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::game::constants::timing::TICK_INTERVAL_MS))
    }
}
