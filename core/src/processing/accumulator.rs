use crate::math::stats::StatsHelper;
use crate::prelude::{AccumulatorError, SweepResult};

/// Running statistics across all sweeps of a campaign.
struct AccumulatorState {
    reference_frequency: Vec<f64>,
    max_db: Vec<f64>,
    min_db: Vec<f64>,
    mean_linear: Vec<f64>,
    sweep_count: u64,
}

/// Owns the reference frequency axis and the running max/min/mean.
///
/// The first sweep fixes the axis; every later sweep must carry an
/// elementwise-identical axis. All aggregate vectors always have the
/// reference axis length.
#[derive(Default)]
pub struct SweepAccumulator {
    state: Option<AccumulatorState>,
}

impl SweepAccumulator {
    pub fn new() -> Self {
        Self { state: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Adopts the first sweep as reference. The axis must be non-empty,
    /// strictly positive and monotonic.
    pub fn initialize(&mut self, sweep: &SweepResult) -> Result<(), AccumulatorError> {
        if self.state.is_some() {
            return Err(AccumulatorError::AlreadyInitialized);
        }

        let frequency = sweep.frequency();
        if frequency.is_empty() {
            return Err(AccumulatorError::InvalidFrequencyAxis(
                "sweep produced no bins".into(),
            ));
        }
        if !StatsHelper::all_positive(frequency) {
            return Err(AccumulatorError::InvalidFrequencyAxis(
                "axis contains non-positive frequencies".into(),
            ));
        }
        if !StatsHelper::is_monotonic(frequency) {
            return Err(AccumulatorError::InvalidFrequencyAxis(
                "axis is not monotonic".into(),
            ));
        }

        let magnitude = sweep.magnitude_db();
        self.state = Some(AccumulatorState {
            reference_frequency: frequency.to_vec(),
            max_db: magnitude.to_vec(),
            min_db: magnitude.to_vec(),
            mean_linear: StatsHelper::to_linear(magnitude),
            sweep_count: 1,
        });
        Ok(())
    }

    /// Folds a subsequent sweep into the running statistics.
    ///
    /// The mean update is `(mean + linear(sweep)) / (count + 1)`, where
    /// `count` is the number of sweeps before this one. The previous mean is
    /// not rescaled by its count, so after the second sweep this is not the
    /// arithmetic mean. Downstream consumers depend on this exact rule.
    pub fn accumulate(&mut self, sweep: &SweepResult) -> Result<(), AccumulatorError> {
        let state = self
            .state
            .as_mut()
            .ok_or(AccumulatorError::NotInitialized)?;

        if let Some(index) =
            StatsHelper::first_difference(&state.reference_frequency, sweep.frequency())
        {
            let detail = if state.reference_frequency.len() != sweep.len() {
                format!(
                    "expected {} bins, got {}",
                    state.reference_frequency.len(),
                    sweep.len()
                )
            } else {
                format!(
                    "bin {} is {} Hz, expected {} Hz",
                    index,
                    sweep.frequency()[index],
                    state.reference_frequency[index]
                )
            };
            return Err(AccumulatorError::FrequencyAxisMismatch {
                sweep: state.sweep_count + 1,
                detail,
            });
        }

        let divisor = (state.sweep_count + 1) as f64;
        for (i, &value) in sweep.magnitude_db().iter().enumerate() {
            if value > state.max_db[i] {
                state.max_db[i] = value;
            }
            if value < state.min_db[i] {
                state.min_db[i] = value;
            }
            state.mean_linear[i] = (state.mean_linear[i] + StatsHelper::lin10(value)) / divisor;
        }
        state.sweep_count += 1;
        Ok(())
    }

    pub fn reference_frequency(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.reference_frequency.as_slice())
    }

    pub fn max_db(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.max_db.as_slice())
    }

    pub fn min_db(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.min_db.as_slice())
    }

    pub fn mean_linear(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.mean_linear.as_slice())
    }

    /// Running mean in dB, for reporting only.
    pub fn mean_db(&self) -> Option<Vec<f64>> {
        self.state
            .as_ref()
            .map(|s| StatsHelper::to_db(&s.mean_linear))
    }

    pub fn sweep_count(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.sweep_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn sweep(frequency: &[f64], magnitude: &[f64]) -> SweepResult {
        let now = NaiveDateTime::default();
        SweepResult::new(frequency.to_vec(), magnitude.to_vec(), now, now).unwrap()
    }

    #[test]
    fn max_and_min_track_elementwise_extremes() {
        let axis = [100.0, 200.0, 300.0, 400.0];
        let rows = [
            [-50.0, -60.0, -70.0, -80.0],
            [-55.0, -40.0, -75.0, -85.0],
            [-45.0, -65.0, -65.0, -90.0],
            [-52.0, -61.0, -71.0, -60.0],
        ];

        let mut acc = SweepAccumulator::new();
        acc.initialize(&sweep(&axis, &rows[0])).unwrap();
        for row in &rows[1..] {
            acc.accumulate(&sweep(&axis, row)).unwrap();
        }

        for i in 0..axis.len() {
            let column = rows.iter().map(|r| r[i]);
            let expected_max = column.clone().fold(f64::NEG_INFINITY, f64::max);
            let expected_min = column.fold(f64::INFINITY, f64::min);
            assert_eq!(acc.max_db().unwrap()[i], expected_max);
            assert_eq!(acc.min_db().unwrap()[i], expected_min);
        }
        assert_eq!(acc.sweep_count(), 4);
    }

    #[test]
    fn initialize_rejects_non_monotonic_axis() {
        let mut acc = SweepAccumulator::new();
        let err = acc
            .initialize(&sweep(&[100.0, 50.0, 150.0], &[0.0; 3]))
            .unwrap_err();
        assert!(matches!(err, AccumulatorError::InvalidFrequencyAxis(_)));
        assert!(!acc.is_initialized());
    }

    #[test]
    fn initialize_rejects_non_positive_axis() {
        let mut acc = SweepAccumulator::new();
        let err = acc
            .initialize(&sweep(&[0.0, 10.0, 20.0], &[0.0; 3]))
            .unwrap_err();
        assert!(matches!(err, AccumulatorError::InvalidFrequencyAxis(_)));
    }

    #[test]
    fn initialize_accepts_descending_axis() {
        let mut acc = SweepAccumulator::new();
        acc.initialize(&sweep(&[30.0, 20.0, 10.0], &[1.0, 2.0, 3.0]))
            .unwrap();
        assert_eq!(acc.reference_frequency().unwrap(), &[30.0, 20.0, 10.0]);
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let mut acc = SweepAccumulator::new();
        acc.initialize(&sweep(&[1.0], &[0.0])).unwrap();
        assert_eq!(
            acc.initialize(&sweep(&[1.0], &[0.0])),
            Err(AccumulatorError::AlreadyInitialized)
        );
    }

    #[test]
    fn accumulate_before_initialize_is_rejected() {
        let mut acc = SweepAccumulator::new();
        assert_eq!(
            acc.accumulate(&sweep(&[1.0], &[0.0])),
            Err(AccumulatorError::NotInitialized)
        );
    }

    #[test]
    fn accumulate_rejects_axis_differing_by_one_ulp() {
        let mut acc = SweepAccumulator::new();
        acc.initialize(&sweep(&[1.0, 2.0, 3.0], &[0.0; 3])).unwrap();
        let nudged = f64::from_bits(2.0f64.to_bits() + 1);
        let err = acc
            .accumulate(&sweep(&[1.0, nudged, 3.0], &[5.0; 3]))
            .unwrap_err();
        assert!(matches!(
            err,
            AccumulatorError::FrequencyAxisMismatch { sweep: 2, .. }
        ));
        assert_eq!(acc.max_db().unwrap(), &[0.0; 3]);
        assert_eq!(acc.sweep_count(), 1);
    }

    #[test]
    fn accumulate_rejects_axis_of_different_length() {
        let mut acc = SweepAccumulator::new();
        acc.initialize(&sweep(&[1.0, 2.0, 3.0], &[0.0; 3])).unwrap();
        let err = acc.accumulate(&sweep(&[1.0, 2.0], &[0.0; 2])).unwrap_err();
        assert!(matches!(err, AccumulatorError::FrequencyAxisMismatch { .. }));
    }

    #[test]
    fn running_mean_follows_campaign_update_rule() {
        let axis = [1.0, 2.0, 3.0];
        let mut acc = SweepAccumulator::new();
        acc.initialize(&sweep(&axis, &[0.0, 0.0, 0.0])).unwrap();
        assert_eq!(acc.mean_linear().unwrap(), &[1.0, 1.0, 1.0]);

        acc.accumulate(&sweep(&axis, &[10.0, 10.0, 10.0])).unwrap();
        assert_eq!(acc.mean_linear().unwrap(), &[5.5, 5.5, 5.5]);

        // third sweep: (5.5 + 1) / 3, not the arithmetic mean of 1, 10, 1
        acc.accumulate(&sweep(&axis, &[0.0, 0.0, 0.0])).unwrap();
        for &value in acc.mean_linear().unwrap() {
            assert!((value - 6.5 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn mean_db_converts_linear_mean() {
        let mut acc = SweepAccumulator::new();
        acc.initialize(&sweep(&[1.0, 2.0], &[0.0, 20.0])).unwrap();
        let mean = acc.mean_db().unwrap();
        assert!(mean[0].abs() < 1e-12);
        assert!((mean[1] - 20.0).abs() < 1e-9);
    }
}
