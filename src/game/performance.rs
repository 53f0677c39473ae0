//! Step timing
//!
//! Keeps a rolling window of step durations and compares them against the
//! frame budget of the driver's tick rate.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept (~2 seconds at 60 Hz)
const WINDOW: usize = 120;
/// Status is only judged once this many samples exist
const MIN_SAMPLES: usize = 10;

/// How much of the frame budget a step uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceStatus {
    /// Under 30% of budget
    Excellent,
    /// Under 70% of budget
    Good,
    /// Under 90% of budget
    Warning,
    /// Around the budget; deltas start to grow
    Critical,
    /// Sustained overload past 150% of budget
    Catastrophic,
}

impl PerformanceStatus {
    pub fn is_over_budget(&self) -> bool {
        matches!(self, PerformanceStatus::Critical | PerformanceStatus::Catastrophic)
    }

    /// Gauge value for metrics (0 = excellent)
    pub fn level(&self) -> u64 {
        match self {
            PerformanceStatus::Excellent => 0,
            PerformanceStatus::Good => 1,
            PerformanceStatus::Warning => 2,
            PerformanceStatus::Critical => 3,
            PerformanceStatus::Catastrophic => 4,
        }
    }
}

/// Measures how long each simulation step takes
pub struct PerformanceMonitor {
    step_durations: VecDeque<Duration>,
    budget: Duration,
    status: PerformanceStatus,
    step_start: Option<Instant>,
    last_agent_count: usize,
    last_food_count: usize,
}

impl PerformanceMonitor {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            step_durations: VecDeque::with_capacity(WINDOW),
            budget: Duration::from_secs_f32(1.0 / tick_rate.max(1) as f32),
            status: PerformanceStatus::Excellent,
            step_start: None,
            last_agent_count: 0,
            last_food_count: 0,
        }
    }

    pub fn step_start(&mut self) {
        self.step_start = Some(Instant::now());
    }

    /// Stop the clock started by `step_start`; returns the measured duration
    pub fn step_end(&mut self, agents: usize, foods: usize) -> Option<Duration> {
        let duration = self.step_start.take()?.elapsed();
        self.record_step(duration);
        self.last_agent_count = agents;
        self.last_food_count = foods;
        Some(duration)
    }

    fn record_step(&mut self, duration: Duration) {
        self.step_durations.push_back(duration);
        while self.step_durations.len() > WINDOW {
            self.step_durations.pop_front();
        }
        self.update_status();
    }

    fn update_status(&mut self) {
        if self.step_durations.len() < MIN_SAMPLES {
            return;
        }

        let ratio = self.budget_usage_percent() / 100.0;
        let previous = self.status;
        self.status = if ratio < 0.3 {
            PerformanceStatus::Excellent
        } else if ratio < 0.7 {
            PerformanceStatus::Good
        } else if ratio < 0.9 {
            PerformanceStatus::Warning
        } else if ratio < 1.5 {
            PerformanceStatus::Critical
        } else {
            PerformanceStatus::Catastrophic
        };

        if self.status.level() > previous.level() && self.status.is_over_budget() {
            tracing::warn!("Simulation over frame budget: {}", self.status_message());
        }
    }

    pub fn average_step_duration(&self) -> Duration {
        if self.step_durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.step_durations.iter().sum();
        sum / self.step_durations.len() as u32
    }

    /// 95th percentile step duration
    pub fn p95_step_duration(&self) -> Duration {
        let mut sorted: Vec<_> = self.step_durations.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted
            .get(idx.min(sorted.len().saturating_sub(1)))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn status(&self) -> PerformanceStatus {
        self.status
    }

    /// Average step time as percentage of the frame budget (0-100+)
    pub fn budget_usage_percent(&self) -> f32 {
        self.average_step_duration().as_secs_f32() / self.budget.as_secs_f32() * 100.0
    }

    pub fn sample_count(&self) -> usize {
        self.step_durations.len()
    }

    pub fn status_message(&self) -> String {
        format!(
            "{:?} - {:.1}% budget, {} agents, {} food",
            self.status,
            self.budget_usage_percent(),
            self.last_agent_count,
            self.last_food_count
        )
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(crate::game::constants::clock::TICK_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor_with(step: Duration) -> PerformanceMonitor {
        let mut monitor = PerformanceMonitor::new(60);
        for _ in 0..20 {
            monitor.record_step(step);
        }
        monitor
    }

    #[test]
    fn test_new_monitor_is_excellent() {
        let monitor = PerformanceMonitor::new(60);
        assert_eq!(monitor.status(), PerformanceStatus::Excellent);
        assert_eq!(monitor.p95_step_duration(), Duration::ZERO);
    }

    #[test]
    fn test_status_levels() {
        // Budget at 60 Hz is ~16.67ms
        assert_eq!(monitor_with(Duration::from_millis(2)).status(), PerformanceStatus::Excellent);
        assert_eq!(monitor_with(Duration::from_millis(8)).status(), PerformanceStatus::Good);
        assert_eq!(monitor_with(Duration::from_millis(13)).status(), PerformanceStatus::Warning);

        let slow = monitor_with(Duration::from_millis(18));
        assert_eq!(slow.status(), PerformanceStatus::Critical);
        assert!(slow.status().is_over_budget());

        let stalled = monitor_with(Duration::from_millis(30));
        assert_eq!(stalled.status(), PerformanceStatus::Catastrophic);
        assert_eq!(stalled.status().level(), 4);
    }

    #[test]
    fn test_needs_enough_samples() {
        let mut monitor = PerformanceMonitor::new(60);
        for _ in 0..(MIN_SAMPLES - 1) {
            monitor.record_step(Duration::from_millis(50));
        }
        assert_eq!(monitor.status(), PerformanceStatus::Excellent);
        monitor.record_step(Duration::from_millis(50));
        assert_eq!(monitor.status(), PerformanceStatus::Catastrophic);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut monitor = monitor_with(Duration::from_millis(1));
        for _ in 0..500 {
            monitor.record_step(Duration::from_millis(1));
        }
        assert_eq!(monitor.sample_count(), WINDOW);
    }

    #[test]
    fn test_step_timing() {
        let mut monitor = PerformanceMonitor::new(60);
        assert!(monitor.step_end(1, 1).is_none());

        monitor.step_start();
        std::thread::sleep(Duration::from_millis(1));
        let measured = monitor.step_end(16, 500).unwrap();

        assert!(measured >= Duration::from_millis(1));
        assert_eq!(monitor.sample_count(), 1);
        assert!(monitor.status_message().contains("16 agents"));
    }
}
