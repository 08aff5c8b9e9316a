//! Time and node limits for a single solve.

use std::time::{Duration, Instant};

use crate::config::SolverConfig;

use super::{SolverFailure, SolverStats};

/// Nodes explored between two clock reads.
const DEFAULT_CHECK_INTERVAL: u64 = 1_024;

/// Limits handed to a backend for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveLimits {
    /// Wall-clock budget.
    pub time_limit: Duration,
    /// Maximum number of search nodes, if any.
    pub node_limit: Option<u64>,
    /// Nodes between clock reads.
    pub check_interval: u64,
}

impl SolveLimits {
    /// Limits with the given time budget and no node limit.
    pub fn new(time_limit: Duration) -> Self {
        Self {
            time_limit,
            node_limit: None,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Sets the node limit.
    pub fn with_node_limit(mut self, node_limit: u64) -> Self {
        self.node_limit = Some(node_limit);
        self
    }

    /// Sets how many nodes pass between clock reads. Values below 1 are
    /// treated as 1.
    pub fn with_check_interval(mut self, check_interval: u64) -> Self {
        self.check_interval = check_interval.max(1);
        self
    }

    /// Limits taken from solver configuration.
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            time_limit: config.time_limit(),
            node_limit: config.node_limit,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Starts the clock.
    pub fn start(&self) -> LimitMonitor {
        LimitMonitor {
            limits: *self,
            started: Instant::now(),
            nodes: 0,
            since_check: 0,
        }
    }
}

/// Tracks progress of a running solve against its [`SolveLimits`].
#[derive(Debug, Clone)]
pub struct LimitMonitor {
    limits: SolveLimits,
    started: Instant,
    nodes: u64,
    since_check: u64,
}

impl LimitMonitor {
    /// Counts one node. Fails once the node limit is passed, or when the
    /// periodic clock read finds the time budget spent.
    pub fn tick(&mut self) -> Result<(), SolverFailure> {
        self.nodes = self.nodes.saturating_add(1);
        if let Some(limit) = self.limits.node_limit
            && self.nodes > limit
        {
            return Err(SolverFailure::NodeLimitExceeded { limit });
        }

        self.since_check += 1;
        if self.since_check >= self.limits.check_interval {
            self.since_check = 0;
            self.check_time()?;
        }
        Ok(())
    }

    /// Reads the clock now.
    pub fn check_time(&self) -> Result<(), SolverFailure> {
        if self.started.elapsed() > self.limits.time_limit {
            return Err(SolverFailure::TimeLimitExceeded {
                limit_ms: self.limits.time_limit.as_millis() as u64,
            });
        }
        Ok(())
    }

    /// Nodes counted so far.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> SolverStats {
        SolverStats {
            nodes: self.nodes,
            duration_us: self.elapsed().as_micros() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_limit_trips_after_limit() {
        let mut monitor = SolveLimits::new(Duration::from_secs(60))
            .with_node_limit(3)
            .start();

        assert!(monitor.tick().is_ok());
        assert!(monitor.tick().is_ok());
        assert!(monitor.tick().is_ok());
        assert_eq!(
            monitor.tick(),
            Err(SolverFailure::NodeLimitExceeded { limit: 3 })
        );
        assert_eq!(monitor.nodes(), 4);
    }

    #[test]
    fn test_zero_time_limit_trips_on_check() {
        let mut monitor = SolveLimits::new(Duration::ZERO)
            .with_check_interval(1)
            .start();
        std::thread::sleep(Duration::from_millis(2));

        assert_eq!(
            monitor.tick(),
            Err(SolverFailure::TimeLimitExceeded { limit_ms: 0 })
        );
    }

    #[test]
    fn test_clock_only_read_every_interval() {
        let mut monitor = SolveLimits::new(Duration::ZERO)
            .with_check_interval(5)
            .start();
        std::thread::sleep(Duration::from_millis(2));

        for _ in 0..4 {
            assert!(monitor.tick().is_ok());
        }
        assert!(monitor.tick().is_err());
    }

    #[test]
    fn test_from_config() {
        let config = SolverConfig {
            time_limit_ms: 500,
            node_limit: Some(42),
            ..SolverConfig::default()
        };
        let limits = SolveLimits::from_config(&config);

        assert_eq!(limits.time_limit, Duration::from_millis(500));
        assert_eq!(limits.node_limit, Some(42));
    }
}
