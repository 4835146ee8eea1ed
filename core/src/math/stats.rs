pub struct StatsHelper;

impl StatsHelper {
    /// `10^(dB/10)`: decibels to linear power.
    pub fn lin10(db: f64) -> f64 {
        10f64.powf(db / 10.0)
    }

    /// `10 * log10(A)`: linear power to decibels.
    pub fn db10(linear: f64) -> f64 {
        10.0 * linear.log10()
    }

    pub fn to_linear(db: &[f64]) -> Vec<f64> {
        db.iter().map(|&v| Self::lin10(v)).collect()
    }

    pub fn to_db(linear: &[f64]) -> Vec<f64> {
        linear.iter().map(|&v| Self::db10(v)).collect()
    }

    /// True when the sequence is entirely non-decreasing or entirely non-increasing.
    pub fn is_monotonic(values: &[f64]) -> bool {
        values.windows(2).all(|w| w[0] <= w[1]) || values.windows(2).all(|w| w[0] >= w[1])
    }

    pub fn all_positive(values: &[f64]) -> bool {
        values.iter().all(|&v| v > 0.0)
    }

    /// Index of the first element where the two sequences differ.
    pub fn first_difference(lhs: &[f64], rhs: &[f64]) -> Option<usize> {
        lhs.iter()
            .zip(rhs)
            .position(|(a, b)| a != b)
            .or_else(|| (lhs.len() != rhs.len()).then(|| lhs.len().min(rhs.len())))
    }
}
