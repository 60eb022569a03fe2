//! Adapter for converting store rows into validated mood records
//!
//! Rows arrive loosely typed from the record store. This is the only place that
//! interprets their strings: unknown labels become neutral-scored records and rows
//! with unreadable timestamps are dropped, both reported as quality flags.

use crate::error::ProjectionError;
use crate::types::{MoodLabel, MoodRecord, QualityFlag, RawMoodRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Adapter for converting raw mood rows to mood records
pub struct MoodRowAdapter;

/// Records produced from a batch of rows, with any quality issues found
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub records: Vec<MoodRecord>,
    pub quality_flags: Vec<QualityFlag>,
    /// Rows dropped because their timestamp was unreadable
    pub dropped_rows: usize,
}

/// Problem found in a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub index: usize,
    pub flag: QualityFlag,
    pub detail: String,
}

impl MoodRowAdapter {
    /// Parse a JSON string containing an array of rows
    pub fn parse_array(json: &str) -> Result<Vec<RawMoodRow>, ProjectionError> {
        let rows: Vec<RawMoodRow> = serde_json::from_str(json)?;
        Ok(rows)
    }

    /// Parse NDJSON (one row per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawMoodRow>, ProjectionError> {
        let mut rows = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawMoodRow>(trimmed) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    return Err(ProjectionError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(rows)
    }

    /// Convert rows to mood records
    pub fn to_records(rows: &[RawMoodRow]) -> Conversion {
        let mut conversion = Conversion {
            records: Vec::with_capacity(rows.len()),
            ..Default::default()
        };

        for row in rows {
            let timestamp = match parse_timestamp(&row.created_at) {
                Ok(ts) => ts,
                Err(e) => {
                    tracing::warn!(created_at = %row.created_at, error = %e, "dropping mood row");
                    conversion.dropped_rows += 1;
                    push_flag(&mut conversion.quality_flags, QualityFlag::InvalidTimestamp);
                    continue;
                }
            };

            let mood = match row.mood.parse::<MoodLabel>() {
                Ok(label) => Some(label),
                Err(e) => {
                    tracing::warn!(error = %e, "scoring mood row as neutral");
                    push_flag(&mut conversion.quality_flags, QualityFlag::UnknownMoodLabel);
                    None
                }
            };

            conversion.records.push(MoodRecord { mood, timestamp });
        }

        conversion
    }

    /// Report every row with a data quality issue
    pub fn validate_rows(rows: &[RawMoodRow]) -> Vec<RowIssue> {
        let mut issues = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            if let Err(e) = parse_timestamp(&row.created_at) {
                issues.push(RowIssue {
                    index,
                    flag: QualityFlag::InvalidTimestamp,
                    detail: e.to_string(),
                });
            }
            if let Err(e) = row.mood.parse::<MoodLabel>() {
                issues.push(RowIssue {
                    index,
                    flag: QualityFlag::UnknownMoodLabel,
                    detail: e.to_string(),
                });
            }
        }
        issues
    }
}

fn push_flag(flags: &mut Vec<QualityFlag>, flag: QualityFlag) {
    if !flags.contains(&flag) {
        flags.push(flag);
    }
}

/// Parse a store timestamp.
///
/// Accepts RFC 3339 (what the hosted store returns), naive date-times which are
/// taken as UTC, and bare dates at midnight UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ProjectionError> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(ProjectionError::DateParseError(format!(
        "unrecognized timestamp '{}'",
        raw
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15T08:30:00Z").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-01-15T10:30:00.000+02:00").unwrap(),
            expected
        );
        assert_eq!(parse_timestamp("2024-01-15 08:30:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-01-15").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_unknown_label_becomes_neutral_record() {
        let rows = vec![
            RawMoodRow::new("happy", "2024-01-15T08:00:00Z"),
            RawMoodRow::new("grumpy", "2024-01-15T09:00:00Z"),
        ];
        let conversion = MoodRowAdapter::to_records(&rows);

        assert_eq!(conversion.records.len(), 2);
        assert_eq!(conversion.records[0].mood, Some(MoodLabel::Happy));
        assert_eq!(conversion.records[1].mood, None);
        assert_eq!(conversion.records[1].score(), crate::types::NEUTRAL_SCORE);
        assert_eq!(conversion.quality_flags, vec![QualityFlag::UnknownMoodLabel]);
    }

    #[test]
    fn test_bad_timestamp_row_is_dropped() {
        let rows = vec![
            RawMoodRow::new("sad", "not a date"),
            RawMoodRow::new("sad", "also not a date"),
            RawMoodRow::new("calm", "2024-01-15T08:00:00Z"),
        ];
        let conversion = MoodRowAdapter::to_records(&rows);

        assert_eq!(conversion.records.len(), 1);
        assert_eq!(conversion.dropped_rows, 2);
        assert_eq!(conversion.quality_flags, vec![QualityFlag::InvalidTimestamp]);
    }

    #[test]
    fn test_parse_ndjson_ignores_extra_columns() {
        let ndjson = r#"{"id":"a1","user_id":"u1","mood":"happy","notes":"sunny","created_at":"2024-01-15T08:00:00Z"}

{"id":"a2","user_id":"u1","mood":"sad","created_at":"2024-01-16T08:00:00Z"}"#;

        let rows = MoodRowAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].mood, "sad");
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let err = MoodRowAdapter::parse_ndjson("{\"mood\":\"happy\"}").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_validate_rows() {
        let rows = vec![
            RawMoodRow::new("happy", "2024-01-15T08:00:00Z"),
            RawMoodRow::new("meh", "2024-01-15"),
            RawMoodRow::new("sad", "soon"),
        ];
        let issues = MoodRowAdapter::validate_rows(&rows);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].index, 1);
        assert_eq!(issues[0].flag, QualityFlag::UnknownMoodLabel);
        assert_eq!(issues[1].index, 2);
        assert_eq!(issues[1].flag, QualityFlag::InvalidTimestamp);
    }
}
