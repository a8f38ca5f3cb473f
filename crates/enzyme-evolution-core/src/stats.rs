use crate::message::FeedStatus;
use crate::metabolism::{Enzyme, Nutrient};
use crate::metrics::IntervalEfficiency;
use std::collections::VecDeque;
use tracing::info;

/// First strictly positive target-nutrient sample seen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FirstFunctional {
    pub time: f64,
    pub enzyme: Enzyme,
    pub efficiency: f64,
}

/// Sliding window of per-interval mean efficiencies against the target nutrient, plus the
/// records the arbiter keeps alongside it.
#[derive(Clone, Debug)]
pub struct EfficiencyStats {
    target: Nutrient,
    max_samples: usize,
    sampling_interval: f64,
    window: VecDeque<IntervalEfficiency>,
    best_efficiency: f64,
    best_enzyme: Option<Enzyme>,
    peak_average: f64,
    peak_interval: Option<i64>,
    first_functional: Option<FirstFunctional>,
}

impl EfficiencyStats {
    pub fn new(target: Nutrient, max_samples: usize, sampling_interval: f64) -> Self {
        assert!(max_samples > 0, "efficiency window needs room for one interval");
        assert!(
            sampling_interval.is_finite() && sampling_interval > 0.0,
            "sampling interval must be positive"
        );
        Self {
            target,
            max_samples,
            sampling_interval,
            window: VecDeque::with_capacity(max_samples),
            best_efficiency: 0.0,
            best_enzyme: None,
            peak_average: 0.0,
            peak_interval: None,
            first_functional: None,
        }
    }

    /// Sampling interval index for `clock`, rounded to nearest.
    pub fn interval_at(&self, clock: f64) -> i64 {
        (clock / self.sampling_interval).round() as i64
    }

    /// Fold one feed report into the statistics. Returns whether it counted.
    ///
    /// Only feedings on the target nutrient count, and among those a zero-efficiency sample
    /// counts only for bacteria whose parent also lived on the target nutrient.
    pub fn record(&mut self, clock: f64, status: &FeedStatus) -> bool {
        let Some(result) = status.result else {
            return false;
        };
        if result.nutrient != self.target
            || !(result.efficiency > 0.0 || status.parent_nutrient == self.target)
        {
            return false;
        }

        if result.efficiency > self.best_efficiency {
            self.best_efficiency = result.efficiency;
            self.best_enzyme = Some(result.enzyme);
        }

        let interval = self.interval_at(clock);
        self.push_sample(interval, result.efficiency);

        if self.first_functional.is_none() && result.efficiency > 0.0 {
            info!(
                clock,
                enzyme = %result.enzyme,
                efficiency = result.efficiency,
                "first functional enzyme found"
            );
            self.first_functional = Some(FirstFunctional {
                time: clock,
                enzyme: result.enzyme,
                efficiency: result.efficiency,
            });
        }
        true
    }

    fn push_sample(&mut self, interval: i64, efficiency: f64) {
        let Some(last) = self.window.back_mut() else {
            self.window.push_back(IntervalEfficiency {
                interval,
                mean: efficiency,
                samples: 1,
            });
            return;
        };

        if interval == last.interval {
            let n = f64::from(last.samples);
            last.mean = (n * last.mean + efficiency) / (n + 1.0);
            last.samples += 1;
            return;
        }
        if interval < last.interval {
            // The clock never runs backwards; a stale sample is dropped.
            return;
        }

        let completed = *last;
        info!(
            interval = completed.interval,
            average = completed.mean,
            "interval average efficiency"
        );
        if completed.mean > self.peak_average {
            self.peak_average = completed.mean;
            self.peak_interval = Some(completed.interval);
            info!(
                average = completed.mean,
                time = completed.interval as f64 * self.sampling_interval,
                "peak average efficiency so far"
            );
        }
        if self.window.len() == self.max_samples {
            self.window.pop_front();
        }
        self.window.push_back(IntervalEfficiency {
            interval,
            mean: efficiency,
            samples: 1,
        });
    }

    pub fn target(&self) -> Nutrient {
        self.target
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    pub fn window(&self) -> &VecDeque<IntervalEfficiency> {
        &self.window
    }

    pub fn latest_average(&self) -> Option<f64> {
        self.window.back().map(|e| e.mean)
    }

    pub fn best_efficiency(&self) -> f64 {
        self.best_efficiency
    }

    pub fn best_enzyme(&self) -> Option<Enzyme> {
        self.best_enzyme
    }

    pub fn peak_average(&self) -> f64 {
        self.peak_average
    }

    pub fn peak_interval(&self) -> Option<i64> {
        self.peak_interval
    }

    pub fn first_functional(&self) -> Option<FirstFunctional> {
        self.first_functional
    }
}
