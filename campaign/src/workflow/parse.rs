//! Value parsers for command-line flags.

use std::collections::BTreeMap;

/// Parses a number with an optional `k`, `M`, `G` or `T` multiplier, e.g. `1.42G`.
pub fn float_with_multiplier(input: &str) -> Result<f64, String> {
    let trimmed = input.trim();
    let (number, multiplier) = match trimmed.chars().last() {
        Some('k') => (&trimmed[..trimmed.len() - 1], 1e3),
        Some('M') => (&trimmed[..trimmed.len() - 1], 1e6),
        Some('G') => (&trimmed[..trimmed.len() - 1], 1e9),
        Some('T') => (&trimmed[..trimmed.len() - 1], 1e12),
        _ => (trimmed, 1.0),
    };
    number
        .parse::<f64>()
        .map(|value| value * multiplier)
        .map_err(|_| format!("`{}` is not numeric", input))
}

/// Parses `freq` or `start:end`; a single frequency yields `(f, f)`.
pub fn frequency_range(input: &str) -> Result<(f64, f64), String> {
    let parts = input
        .split(':')
        .map(float_with_multiplier)
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [single] => Ok((*single, *single)),
        [start, end] => Ok((*start, *end)),
        _ => Err(format!("`{}` is neither a frequency nor a range", input)),
    }
}

/// Parses gains of individual amplification elements, e.g. `LNA=28,VGA=12`.
pub fn specific_gains(input: &str) -> Result<BTreeMap<String, f64>, String> {
    key_values(input)?
        .into_iter()
        .map(|(name, value)| {
            value
                .parse::<f64>()
                .map(|gain| (name, gain))
                .map_err(|_| format!("gain `{}` is not numeric", value))
        })
        .collect()
}

/// Parses device settings, e.g. `biastee=true`.
pub fn device_settings(input: &str) -> Result<BTreeMap<String, String>, String> {
    Ok(key_values(input)?.into_iter().collect())
}

fn key_values(input: &str) -> Result<Vec<(String, String)>, String> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input
        .split(',')
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", pair))
        })
        .collect()
}
