use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Max number of restarts allowed within a sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestartIntensity {
    pub max_restarts: usize,
    pub within: Duration,
}

#[derive(Debug, thiserror::Error)]
#[error("Max restart intensity reached")]
pub struct MaxRestartIntensityReached;

#[derive(Debug, Clone)]
pub(crate) struct RestartStats(VecDeque<Instant>);

impl RestartIntensity {
    pub fn new(max_restarts: usize, within: Duration) -> Self {
        Self { max_restarts, within }
    }

    pub(crate) fn new_stats(&self) -> RestartStats {
        RestartStats(VecDeque::with_capacity(self.max_restarts + 1))
    }

    pub(crate) fn report_restart(
        &self,
        stats: &mut RestartStats,
        now: Instant,
    ) -> Result<(), MaxRestartIntensityReached> {
        let window_start = now.checked_sub(self.within);
        while stats.0.front().map(|at| Some(*at) < window_start).unwrap_or(false) {
            stats.0.pop_front();
        }
        stats.0.push_back(now);

        if stats.0.len() > self.max_restarts {
            Err(MaxRestartIntensityReached)
        } else {
            Ok(())
        }
    }
}

impl Default for RestartIntensity {
    fn default() -> Self {
        Self { max_restarts: 3, within: Duration::from_secs(5) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_max_restarts_within_the_window() {
        let intensity = RestartIntensity::new(2, Duration::from_secs(10));
        let mut stats = intensity.new_stats();
        let t0 = Instant::now();

        assert!(intensity.report_restart(&mut stats, t0).is_ok());
        assert!(intensity.report_restart(&mut stats, t0 + Duration::from_secs(1)).is_ok());
        assert!(intensity.report_restart(&mut stats, t0 + Duration::from_secs(2)).is_err());
    }

    #[test]
    fn old_restarts_expire() {
        let intensity = RestartIntensity::new(1, Duration::from_secs(1));
        let mut stats = intensity.new_stats();
        let t0 = Instant::now();

        assert!(intensity.report_restart(&mut stats, t0).is_ok());
        assert!(intensity.report_restart(&mut stats, t0 + Duration::from_secs(2)).is_ok());
        assert!(intensity.report_restart(&mut stats, t0 + Duration::from_millis(2500)).is_err());
    }

    #[test]
    fn zero_means_no_restarts() {
        let intensity = RestartIntensity::new(0, Duration::from_secs(1));
        let mut stats = intensity.new_stats();
        assert!(intensity.report_restart(&mut stats, Instant::now()).is_err());
    }
}
