use std::time::Instant;

use tdigest::TDigest;

/// Measures the duration of a single phase.
pub struct Stopwatch {
    start_time: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Stopwatch {
        Stopwatch {
            start_time: Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = Instant::now();
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

/// Per-recommendation latencies of an evaluation pass.
#[derive(Clone, Default)]
pub struct LatencyRecorder {
    durations_in_micros: Vec<f64>,
}

impl LatencyRecorder {
    pub fn with_capacity(capacity: usize) -> Self {
        LatencyRecorder {
            durations_in_micros: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, duration_in_micros: f64) {
        self.durations_in_micros.push(duration_in_micros);
    }

    pub fn len(&self) -> usize {
        self.durations_in_micros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations_in_micros.is_empty()
    }

    /// Estimated quantile `q` in `[0, 1]`, `None` when nothing was recorded.
    pub fn percentile_in_micros(&self, q: f64) -> Option<f64> {
        if self.durations_in_micros.is_empty() {
            return None;
        }
        let t_digest = TDigest::new_with_size(100);
        let sorted_digest = t_digest.merge_unsorted(self.durations_in_micros.clone());
        Some(sorted_digest.estimate_quantile(q))
    }
}

#[cfg(test)]
mod stopwatch_test {
    use super::*;

    #[test]
    fn should_estimate_percentiles() {
        let mut recorder = LatencyRecorder::with_capacity(100);
        for duration in 1..=100 {
            recorder.record(duration as f64);
        }
        assert_eq!(100, recorder.len());
        let p90 = recorder.percentile_in_micros(0.9).unwrap();
        assert!((85.0..=95.0).contains(&p90));
    }

    #[test]
    fn should_not_estimate_without_samples() {
        let recorder = LatencyRecorder::default();
        assert!(recorder.is_empty());
        assert_eq!(None, recorder.percentile_in_micros(0.5));
    }
}
