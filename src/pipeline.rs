//! Pipeline orchestration
//!
//! This module provides the public API for MindEase trends.
//! It runs one projection from store rows to a `TrendReport`.

use crate::adapter::MoodRowAdapter;
use crate::bucketing::{Bucketer, QueryWindow};
use crate::config::{ChartGeometry, ProjectorConfig};
use crate::error::ProjectionError;
use crate::insights::derive_insights;
use crate::path::{filled_area_path, line_path};
use crate::store::{IdentityProvider, RecordStore};
use crate::types::{Granularity, MoodRecord, QualityFlag, RawMoodRow, TrendReport};
use chrono::{DateTime, TimeZone};
use uuid::Uuid;

/// Project raw mood rows into a trend report (stateless, one-shot).
///
/// # Arguments
/// * `rows` - Mood rows as returned by the store
/// * `journal_count` - Journal entries in the same window
/// * `granularity` - Week, month or year
/// * `now` - Reference instant; its time zone is the viewer's calendar
/// * `config` - Gap policy and chart geometry
///
/// Rows outside the granularity's window are ignored.
///
/// # Example
/// ```ignore
/// let report = project_rows(&rows, 3, Granularity::Week, &Utc::now(), &ProjectorConfig::default())?;
/// ```
pub fn project_rows<Tz: TimeZone>(
    rows: &[RawMoodRow],
    journal_count: u64,
    granularity: Granularity,
    now: &DateTime<Tz>,
    config: &ProjectorConfig,
) -> Result<TrendReport, ProjectionError> {
    config.validate()?;
    let window = Bucketer::query_window(granularity, now);
    Ok(build_report(
        rows,
        journal_count,
        granularity,
        now,
        window,
        config,
        config.geometry(granularity),
    ))
}

/// Build a report from rows already fetched for `window`.
///
/// Stages:
/// 1. MoodRowAdapter - Validate rows into mood records
/// 2. Bucketer - Aggregate records into the granularity's buckets
/// 3. path - Render stroke and area paths
/// 4. insights - Summarize the raw records and the series
fn build_report<Tz: TimeZone>(
    rows: &[RawMoodRow],
    journal_count: u64,
    granularity: Granularity,
    now: &DateTime<Tz>,
    window: QueryWindow,
    config: &ProjectorConfig,
    geometry: ChartGeometry,
) -> TrendReport {
    // Stage 1: rows to records
    let conversion = MoodRowAdapter::to_records(rows);
    let records: Vec<MoodRecord> = conversion
        .records
        .into_iter()
        .filter(|r| r.timestamp >= window.since && r.timestamp < window.until)
        .collect();

    tracing::debug!(
        granularity = granularity.as_str(),
        rows = rows.len(),
        records = records.len(),
        dropped = conversion.dropped_rows,
        "projecting mood trends"
    );

    // Stage 2: bucketing
    let series = Bucketer::aggregate(&records, granularity, now, config.gap_policy);
    if !series.has_values() {
        tracing::debug!(granularity = granularity.as_str(), "no mood data in window");
    }

    // Stage 3: paths
    let line = line_path(&series, geometry.width, geometry.height);
    let area = filled_area_path(&series, geometry.width, geometry.height);

    // Stage 4: insights
    let insight = derive_insights(&records, journal_count, granularity.period_label())
        .with_extremes(&series);
    let headline = insight.headline();

    TrendReport {
        report_id: Uuid::new_v4(),
        granularity,
        timeframe: granularity.timeframe().to_string(),
        series,
        line_path: line,
        area_path: area,
        width: geometry.width,
        height: geometry.height,
        insight,
        headline,
        quality_flags: conversion.quality_flags,
    }
}

/// Projector bound to a configuration, reading through a record store.
///
/// Holds no data between calls; every projection performs a fresh query.
#[derive(Debug, Clone, Default)]
pub struct TrendsProjector {
    config: ProjectorConfig,
}

impl TrendsProjector {
    /// Create a projector, rejecting undrawable geometry
    pub fn new(config: ProjectorConfig) -> Result<Self, ProjectionError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// Project the signed-in user's trends for `granularity` ending at `now`
    pub fn project<Tz: TimeZone>(
        &self,
        store: &dyn RecordStore,
        identity: &dyn IdentityProvider,
        granularity: Granularity,
        now: &DateTime<Tz>,
    ) -> Result<TrendReport, ProjectionError> {
        self.project_with_geometry(
            store,
            identity,
            granularity,
            now,
            self.config.geometry(granularity),
        )
    }

    /// Week trends at home-screen size
    pub fn home_preview<Tz: TimeZone>(
        &self,
        store: &dyn RecordStore,
        identity: &dyn IdentityProvider,
        now: &DateTime<Tz>,
    ) -> Result<TrendReport, ProjectionError> {
        self.project_with_geometry(
            store,
            identity,
            Granularity::Week,
            now,
            ChartGeometry::HOME_MINI,
        )
    }

    fn project_with_geometry<Tz: TimeZone>(
        &self,
        store: &dyn RecordStore,
        identity: &dyn IdentityProvider,
        granularity: Granularity,
        now: &DateTime<Tz>,
        geometry: ChartGeometry,
    ) -> Result<TrendReport, ProjectionError> {
        let user = identity
            .current_user()
            .ok_or(ProjectionError::Unauthenticated)?;
        let window = Bucketer::query_window(granularity, now);

        let rows = store
            .query_mood_entries(user.id, window.since, Some(window.until))
            .map_err(|e| {
                tracing::error!(user = %user.id, error = %e, "mood query failed");
                ProjectionError::DataUnavailable(e.to_string())
            })?;

        let journal_count = store
            .query_journal_count(user.id, window.since)
            .map_err(|e| {
                tracing::error!(user = %user.id, error = %e, "journal count failed");
                ProjectionError::DataUnavailable(e.to_string())
            })?;

        let report = build_report(
            &rows,
            journal_count,
            granularity,
            now,
            window,
            &self.config,
            geometry,
        );

        if report.quality_flags.contains(&QualityFlag::InvalidTimestamp) {
            tracing::warn!(user = %user.id, "some mood rows were dropped");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryRecordStore, StaticIdentity};
    use crate::types::{GapPolicy, MoodLabel, UserIdentity};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap()
    }

    fn user() -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            email: "student@example.edu".to_string(),
            display_name: "Student".to_string(),
        }
    }

    fn days_ago(n: i64, hour: u32) -> String {
        let date = now().date_naive() - Duration::days(n);
        date.and_hms_opt(hour, 0, 0).unwrap().and_utc().to_rfc3339()
    }

    #[test]
    fn test_week_scenario_end_to_end() {
        let rows = vec![
            RawMoodRow::new("happy", days_ago(1, 9)),
            RawMoodRow::new("happy", days_ago(1, 20)),
        ];
        let report =
            project_rows(&rows, 0, Granularity::Week, &now(), &ProjectorConfig::default()).unwrap();

        assert_eq!(report.series.len(), 7);
        assert_eq!(report.series.points[5].value, Some(MoodLabel::Happy.score()));
        for (i, point) in report.series.points.iter().enumerate() {
            if i != 5 {
                assert_eq!(point.value, None);
            }
        }
        assert_eq!(report.insight.average_score, Some(MoodLabel::Happy.score()));
        assert_eq!(report.headline, "9.0");
        assert_eq!(report.insight.most_frequent, Some(MoodLabel::Happy));
        assert_eq!(report.insight.mood_entries_count, 2);
        assert_eq!(report.timeframe, "Last 7 days");

        // a lone valued bucket is a single-point subpath
        assert_eq!(report.line_path, "M 266.67 12");
        assert!(report.quality_flags.is_empty());
    }

    #[test]
    fn test_neutral_fill_draws_continuous_paths() {
        let rows = vec![RawMoodRow::new("sad", days_ago(3, 9))];
        let config = ProjectorConfig::default().with_gap_policy(GapPolicy::NeutralFill);
        let report = project_rows(&rows, 0, Granularity::Week, &now(), &config).unwrap();

        assert!(report.series.points.iter().all(|p| p.value.is_some()));
        assert_eq!(report.line_path.matches('M').count(), 1);
        assert_eq!(report.area_path.matches('M').count(), 1);
        // headline is still over raw records only
        assert_eq!(report.headline, "3.0");
    }

    #[test]
    fn test_rows_outside_window_are_ignored() {
        let rows = vec![
            RawMoodRow::new("angry", days_ago(10, 9)),
            RawMoodRow::new("calm", days_ago(0, 9)),
        ];
        let report =
            project_rows(&rows, 1, Granularity::Week, &now(), &ProjectorConfig::default()).unwrap();

        assert_eq!(report.insight.mood_entries_count, 1);
        assert_eq!(report.insight.most_frequent, Some(MoodLabel::Calm));
    }

    #[test]
    fn test_unknown_label_is_flagged_not_fatal() {
        let rows = vec![
            RawMoodRow::new("happy", days_ago(0, 9)),
            RawMoodRow::new("bewildered", days_ago(0, 10)),
        ];
        let report =
            project_rows(&rows, 0, Granularity::Week, &now(), &ProjectorConfig::default()).unwrap();

        assert_eq!(report.series.points[6].value, Some(7.5));
        assert_eq!(report.quality_flags, vec![QualityFlag::UnknownMoodLabel]);
    }

    #[test]
    fn test_projector_reads_through_store() {
        let user = user();
        let mut store = MemoryRecordStore::new();
        store.extend_moods(
            user.id,
            vec![
                RawMoodRow::new("happy", days_ago(2, 9)),
                RawMoodRow::new("sad", days_ago(20, 9)),
                RawMoodRow::new("excited", days_ago(40, 9)),
            ],
        );
        store.insert_journal(user.id, now() - Duration::days(3));
        store.insert_journal(user.id, now() - Duration::days(60));

        let projector = TrendsProjector::default();
        let identity = StaticIdentity::signed_in(user);

        let week = projector
            .project(&store, &identity, Granularity::Week, &now())
            .unwrap();
        assert_eq!(week.insight.mood_entries_count, 1);
        assert_eq!(week.insight.journal_entries_count, 1);

        let month = projector
            .project(&store, &identity, Granularity::Month, &now())
            .unwrap();
        assert_eq!(month.insight.mood_entries_count, 2);
        assert_eq!(month.series.len(), 4);

        let year = projector
            .project(&store, &identity, Granularity::Year, &now())
            .unwrap();
        assert_eq!(year.insight.mood_entries_count, 3);
        assert_eq!(year.insight.journal_entries_count, 2);
        assert_eq!((year.width, year.height), (800.0, 120.0));
    }

    #[test]
    fn test_store_failure_is_signaled() {
        let store = MemoryRecordStore::unconfigured();
        let identity = StaticIdentity::signed_in(user());

        let err = TrendsProjector::default()
            .project(&store, &identity, Granularity::Week, &now())
            .unwrap_err();

        assert!(matches!(err, ProjectionError::DataUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_empty_store_is_not_an_error() {
        let store = MemoryRecordStore::new();
        let identity = StaticIdentity::signed_in(user());

        let report = TrendsProjector::default()
            .project(&store, &identity, Granularity::Week, &now())
            .unwrap();

        assert_eq!(report.series.len(), 7);
        assert_eq!(report.line_path, "");
        assert_eq!(report.headline, "N/A");
        assert_eq!(report.insight.most_frequent_display(), "None");
    }

    #[test]
    fn test_signed_out_user() {
        let store = MemoryRecordStore::new();
        let err = TrendsProjector::default()
            .project(&store, &StaticIdentity::signed_out(), Granularity::Week, &now())
            .unwrap_err();

        assert!(matches!(err, ProjectionError::Unauthenticated));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_home_preview_geometry() {
        let user = user();
        let mut store = MemoryRecordStore::new();
        store.insert_mood(user.id, RawMoodRow::new("neutral", days_ago(6, 9)));
        store.insert_mood(user.id, RawMoodRow::new("calm", days_ago(5, 9)));

        let report = TrendsProjector::default()
            .home_preview(&store, &StaticIdentity::signed_in(user), &now())
            .unwrap();

        assert_eq!((report.width, report.height), (320.0, 60.0));
        // neutral 6 -> y 24, calm 7 -> y 18, step 320/6
        assert_eq!(report.line_path, "M 0 24 Q 26.67 24 53.33 18");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ProjectorConfig::default().with_geometry(ChartGeometry::new(-1.0, 10.0));
        assert!(TrendsProjector::new(config.clone()).is_err());
        assert!(project_rows(&[], 0, Granularity::Week, &now(), &config).is_err());
    }

    #[test]
    fn test_report_serializes() {
        let rows = vec![RawMoodRow::new("calm", days_ago(0, 9))];
        let report =
            project_rows(&rows, 0, Granularity::Month, &now(), &ProjectorConfig::default()).unwrap();

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["granularity"], "month");
        assert_eq!(value["series"]["gap_policy"], "show_gap");
        assert_eq!(value["series"]["points"][3]["label"], "Week 4");
        assert_eq!(value["series"]["points"][3]["key"]["kind"], "span");
        assert_eq!(value["insight"]["most_frequent"], "calm");
        assert!(value.get("quality_flags").is_none());
    }
}
