use crate::prelude::ProviderError;
use std::path::Path;

/// Parsed `frequency magnitude_dB` columns of a provider sink.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepTable {
    pub frequency: Vec<f64>,
    pub magnitude_db: Vec<f64>,
}

/// Reads the two-column text table a provider wrote to `path`.
///
/// Everything after `#` is a comment; blank lines are skipped. Every
/// remaining line must hold exactly two numbers.
pub fn read_sweep_table(path: &Path) -> Result<SweepTable, ProviderError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ProviderError::Sink {
        path: path.to_path_buf(),
        source,
    })?;
    parse_sweep_table(&contents).map_err(|reason| ProviderError::MalformedTable {
        path: path.to_path_buf(),
        reason,
    })
}

pub fn parse_sweep_table(contents: &str) -> Result<SweepTable, String> {
    let mut table = SweepTable::default();
    for (index, raw) in contents.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() != 2 {
            return Err(format!(
                "line {}: expected 2 columns, found {}",
                index + 1,
                columns.len()
            ));
        }
        let parse = |column: &str| {
            column
                .parse::<f64>()
                .map_err(|err| format!("line {}: `{}`: {}", index + 1, column, err))
        };
        table.frequency.push(parse(columns[0])?);
        table.magnitude_db.push(parse(columns[1])?);
    }

    if table.frequency.is_empty() {
        return Err("table contains no bins".into());
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_columns_and_skips_comments() {
        let contents = "# rtl_power_fftw output\n\
                        # Acquisition start: 2021-06-29\n\
                        100000.0 -70.5\n\
                        \n\
                        200000.0 -71.25 # trailing\n";
        let table = parse_sweep_table(contents).unwrap();
        assert_eq!(table.frequency, vec![100000.0, 200000.0]);
        assert_eq!(table.magnitude_db, vec![-70.5, -71.25]);
    }

    #[test]
    fn rejects_rows_with_wrong_column_count() {
        let err = parse_sweep_table("1.0 2.0\n3.0\n").unwrap_err();
        assert!(err.starts_with("line 2"));
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert!(parse_sweep_table("1.0 abc\n").is_err());
    }

    #[test]
    fn rejects_empty_table() {
        assert!(parse_sweep_table("# only a header\n").is_err());
    }

    #[test]
    fn missing_sink_is_a_provider_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_sweep_table(&dir.path().join("output.txt")).unwrap_err();
        assert!(matches!(err, ProviderError::Sink { .. }));
    }
}
