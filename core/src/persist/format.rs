//! Text encodings shared by the campaign files.

use chrono::NaiveDateTime;

/// Local wall-clock timestamp layout, e.g. `2021-06-29 22:12:59.123456`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub const FREQUENCY_PRECISION: usize = 3;
pub const MAGNITUDE_PRECISION: usize = 12;

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// One space-separated, newline-terminated row.
pub fn format_row(values: &[f64], precision: usize) -> String {
    let mut row = values
        .iter()
        .map(|v| format!("{:.*}", precision, v))
        .collect::<Vec<_>>()
        .join(" ");
    row.push('\n');
    row
}

/// `<start>, <end>` line of the timing log.
pub fn format_span(started_at: &NaiveDateTime, ended_at: &NaiveDateTime) -> String {
    format!(
        "{}, {}\n",
        format_timestamp(started_at),
        format_timestamp(ended_at)
    )
}

/// Serde adapter for `NaiveDateTime` in [`TIMESTAMP_FORMAT`].
pub mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S"))
            .map_err(de::Error::custom)
    }
}

/// Serde adapter writing booleans as `1`/`0` and reading either form.
pub mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Float(f64),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(value) => value,
            Raw::Int(value) => value != 0,
            Raw::Float(value) => value != 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn row_uses_fixed_precision_and_single_spaces() {
        assert_eq!(format_row(&[1.0, -2.5, 1e6], 3), "1.000 -2.500 1000000.000\n");
    }

    #[test]
    fn span_matches_timing_log_layout() {
        let start = NaiveDate::from_ymd_opt(2021, 6, 29)
            .unwrap()
            .and_hms_micro_opt(22, 12, 59, 120)
            .unwrap();
        let end = start + chrono::Duration::seconds(5);
        assert_eq!(
            format_span(&start, &end),
            "2021-06-29 22:12:59.000120, 2021-06-29 22:13:04.000120\n"
        );
    }
}
