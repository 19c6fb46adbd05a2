use std::time::Duration;

use rand::Rng;

/// Inter-address delay: uniformly drawn from `mean ± jitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub mean: Duration,
    pub jitter: Duration,
}

impl Pacing {
    pub fn new(mean: Duration, jitter: Duration) -> Self {
        Self { mean, jitter }
    }

    /// Pacing that keeps roughly `per_hour` probes per hour.
    pub fn per_hour(per_hour: u32, jitter: Duration) -> Self {
        let mean = Duration::from_secs_f64(3600.0 / f64::from(per_hour.max(1)));
        Self { mean, jitter }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.jitter.is_zero() {
            return self.mean;
        }
        let low = self.mean.saturating_sub(self.jitter);
        let high = self.mean + self.jitter;
        rng.gen_range(low..=high)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            mean: Duration::from_secs(7),
            jitter: Duration::from_secs(1),
        }
    }
}
