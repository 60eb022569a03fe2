//! Core types for the MindEase trends projector
//!
//! This module defines the data that flows through each stage of a projection:
//! raw store rows, validated mood records, chart buckets and series, and the
//! insight/report output.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of the mood score scale
pub const MOOD_SCALE_MAX: f64 = 10.0;

/// Score used for empty buckets under `GapPolicy::NeutralFill` and for
/// unrecognized mood labels
pub const NEUTRAL_SCORE: f64 = 6.0;

/// Mood category a user can log
///
/// Variant order is the canonical enumeration order and is used to break ties
/// when picking the most frequent mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Happy,
    Excited,
    Calm,
    Neutral,
    Anxious,
    Sad,
    Angry,
    Overwhelmed,
}

impl MoodLabel {
    /// All labels in canonical order
    pub const ALL: [MoodLabel; 8] = [
        MoodLabel::Happy,
        MoodLabel::Excited,
        MoodLabel::Calm,
        MoodLabel::Neutral,
        MoodLabel::Anxious,
        MoodLabel::Sad,
        MoodLabel::Angry,
        MoodLabel::Overwhelmed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "happy",
            MoodLabel::Excited => "excited",
            MoodLabel::Calm => "calm",
            MoodLabel::Neutral => "neutral",
            MoodLabel::Anxious => "anxious",
            MoodLabel::Sad => "sad",
            MoodLabel::Angry => "angry",
            MoodLabel::Overwhelmed => "overwhelmed",
        }
    }

    /// Capitalized name for captions ("Happy")
    pub fn display_name(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "Happy",
            MoodLabel::Excited => "Excited",
            MoodLabel::Calm => "Calm",
            MoodLabel::Neutral => "Neutral",
            MoodLabel::Anxious => "Anxious",
            MoodLabel::Sad => "Sad",
            MoodLabel::Angry => "Angry",
            MoodLabel::Overwhelmed => "Overwhelmed",
        }
    }

    /// Score on the 0-10 scale
    pub fn score(&self) -> f64 {
        match self {
            MoodLabel::Happy => 9.0,
            MoodLabel::Excited => 8.0,
            MoodLabel::Calm => 7.0,
            MoodLabel::Neutral => 6.0,
            MoodLabel::Anxious => 4.0,
            MoodLabel::Sad => 3.0,
            MoodLabel::Angry => 2.0,
            MoodLabel::Overwhelmed => 1.0,
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known mood label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMoodLabel(pub String);

impl fmt::Display for UnknownMoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mood label '{}'", self.0)
    }
}

impl std::error::Error for UnknownMoodLabel {}

impl FromStr for MoodLabel {
    type Err = UnknownMoodLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        MoodLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownMoodLabel(s.to_string()))
    }
}

/// A validated mood entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodRecord {
    /// Logged mood, `None` when the stored label was not recognized
    pub mood: Option<MoodLabel>,
    /// When the entry was created (UTC)
    pub timestamp: DateTime<Utc>,
}

impl MoodRecord {
    pub fn new(mood: MoodLabel, timestamp: DateTime<Utc>) -> Self {
        Self {
            mood: Some(mood),
            timestamp,
        }
    }

    /// Numeric score, neutral for unrecognized labels
    pub fn score(&self) -> f64 {
        self.mood.map(|m| m.score()).unwrap_or(NEUTRAL_SCORE)
    }
}

/// Mood row as returned by the record store (`mood_entries` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMoodRow {
    /// Mood label as stored
    pub mood: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
}

impl RawMoodRow {
    pub fn new(mood: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            mood: mood.into(),
            created_at: created_at.into(),
        }
    }
}

/// Requested charting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Last 7 days, one bucket per day
    Week,
    /// Last 28 days, one bucket per rolling 7-day span
    Month,
    /// Current calendar year, one bucket per month
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }

    /// Number of buckets in a series of this granularity
    pub fn bucket_count(&self) -> usize {
        match self {
            Granularity::Week => 7,
            Granularity::Month => 4,
            Granularity::Year => 12,
        }
    }

    /// Period name used in insight captions ("Week")
    pub fn period_label(&self) -> &'static str {
        match self {
            Granularity::Week => "Week",
            Granularity::Month => "Month",
            Granularity::Year => "Year",
        }
    }

    /// Caption shown under the headline score
    pub fn timeframe(&self) -> &'static str {
        match self {
            Granularity::Week => "Last 7 days",
            Granularity::Month => "Last 28 days",
            Granularity::Year => "This year",
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            other => Err(format!("unknown granularity '{}'", other)),
        }
    }
}

/// How a bucket with no records is represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Empty buckets have no value; paths break at them
    #[default]
    ShowGap,
    /// Empty buckets take `NEUTRAL_SCORE`; paths are continuous
    NeutralFill,
}

/// Grouping key of a bucket, independent of its display label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketKey {
    /// A single calendar day
    Day { date: NaiveDate },
    /// An inclusive range of calendar days
    Span { start: NaiveDate, end: NaiveDate },
    /// A calendar month
    Month { year: i32, month: u32 },
}

impl BucketKey {
    /// Whether a local calendar date falls in this bucket
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            BucketKey::Day { date: day } => day == date,
            BucketKey::Span { start, end } => start <= date && date <= end,
            BucketKey::Month { year, month } => date.year() == year && date.month() == month,
        }
    }
}

/// One bucket of a chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Grouping key
    pub key: BucketKey,
    /// Axis label ("Mon", "Week 2", "Mar")
    pub label: String,
    /// Mean score, `None` for an empty bucket under `GapPolicy::ShowGap`
    pub value: Option<f64>,
    /// Number of records that fell in this bucket
    pub entries: usize,
}

/// Ordered, fixed-length sequence of chart points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub granularity: Granularity,
    pub gap_policy: GapPolicy,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Axis labels in order
    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    /// Whether any bucket carries a value
    pub fn has_values(&self) -> bool {
        self.points.iter().any(|p| p.value.is_some())
    }
}

/// Data quality issues found while converting store rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// A row carried a mood label outside the known set
    UnknownMoodLabel,
    /// A row's timestamp could not be parsed and the row was dropped
    InvalidTimestamp,
}

/// A single bucket singled out by the insights (best or worst)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSummary {
    pub label: String,
    pub value: f64,
}

/// Summary of a window of mood data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Period name ("Week", "Month", "Year")
    pub period: String,
    /// Most frequently logged mood
    pub most_frequent: Option<MoodLabel>,
    /// Mean score over raw records
    pub average_score: Option<f64>,
    /// Mood entries in the window
    pub mood_entries_count: usize,
    /// Journal entries in the window
    pub journal_entries_count: u64,
    /// Highest valued bucket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<PointSummary>,
    /// Lowest valued bucket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst: Option<PointSummary>,
}

/// Authenticated user as produced by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: uuid::Uuid,
    pub email: String,
    pub display_name: String,
}

/// Everything the trends view needs for one granularity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendReport {
    /// Identifier of this projection run
    pub report_id: uuid::Uuid,
    pub granularity: Granularity,
    /// Caption for the headline ("Last 7 days")
    pub timeframe: String,
    pub series: ChartSeries,
    /// Stroke path `d` attribute
    pub line_path: String,
    /// Filled area path `d` attribute
    pub area_path: String,
    pub width: f64,
    pub height: f64,
    pub insight: Insight,
    /// Headline score ("7.5" or "N/A")
    pub headline: String,
    /// Data quality issues found in the input rows
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_flags: Vec<QualityFlag>,
}
