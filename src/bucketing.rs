//! Bucketing and aggregation
//!
//! This module maps mood records onto the fixed buckets of a granularity:
//! - Week: the 7 calendar days ending today
//! - Month: 4 rolling 7-day spans covering the 28 days ending today
//! - Year: the 12 calendar months of the current year
//!
//! Calendar dates are taken in the time zone of the `now` passed by the caller.

use crate::types::{
    BucketKey, ChartPoint, ChartSeries, GapPolicy, Granularity, MoodRecord, NEUTRAL_SCORE,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Time range to request from the record store for one projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    /// Inclusive lower bound
    pub since: DateTime<Utc>,
    /// Exclusive upper bound
    pub until: DateTime<Utc>,
}

/// Aggregator for building chart series from mood records
pub struct Bucketer;

impl Bucketer {
    /// Aggregate records into the buckets of `granularity` ending at `now`.
    ///
    /// Each populated bucket holds the mean score of its records. Empty buckets
    /// follow `policy`. The result does not depend on the order of `records`.
    pub fn aggregate<Tz: TimeZone>(
        records: &[MoodRecord],
        granularity: Granularity,
        now: &DateTime<Tz>,
        policy: GapPolicy,
    ) -> ChartSeries {
        let tz = now.timezone();
        let buckets = bucket_layout(granularity, now.date_naive());
        debug_assert_eq!(buckets.len(), granularity.bucket_count());

        let mut totals = vec![(0.0_f64, 0_usize); buckets.len()];
        let mut outside = 0_usize;

        for record in records {
            let local_date = record.timestamp.with_timezone(&tz).date_naive();
            match buckets.iter().position(|(key, _)| key.contains(local_date)) {
                Some(idx) => {
                    totals[idx].0 += record.score();
                    totals[idx].1 += 1;
                }
                None => outside += 1,
            }
        }

        if outside > 0 {
            tracing::debug!(
                granularity = granularity.as_str(),
                outside,
                "records outside every bucket ignored"
            );
        }

        let points = buckets
            .into_iter()
            .zip(totals)
            .map(|((key, label), (sum, entries))| ChartPoint {
                key,
                label,
                value: bucket_value(sum, entries, policy),
                entries,
            })
            .collect();

        ChartSeries {
            granularity,
            gap_policy: policy,
            points,
        }
    }

    /// Store query range covering every bucket of `granularity` ending at `now`
    pub fn query_window<Tz: TimeZone>(granularity: Granularity, now: &DateTime<Tz>) -> QueryWindow {
        let tz = now.timezone();
        let today = now.date_naive();

        let (first, last) = match granularity {
            Granularity::Week => (today - Duration::days(6), today),
            Granularity::Month => (today - Duration::days(27), today),
            Granularity::Year => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                (first, last)
            }
        };

        QueryWindow {
            since: local_midnight_utc(&tz, first),
            until: local_midnight_utc(&tz, last + Duration::days(1)),
        }
    }
}

fn bucket_value(sum: f64, entries: usize, policy: GapPolicy) -> Option<f64> {
    if entries > 0 {
        return Some(sum / entries as f64);
    }
    match policy {
        GapPolicy::ShowGap => None,
        GapPolicy::NeutralFill => Some(NEUTRAL_SCORE),
    }
}

/// Bucket keys and display labels for a granularity, oldest first
fn bucket_layout(granularity: Granularity, today: NaiveDate) -> Vec<(BucketKey, String)> {
    match granularity {
        Granularity::Week => (0..7)
            .map(|i| {
                let date = today - Duration::days(6 - i);
                (BucketKey::Day { date }, date.format("%a").to_string())
            })
            .collect(),
        Granularity::Month => (0..4)
            .map(|week| {
                let start = today - Duration::days(27 - week * 7);
                let end = start + Duration::days(6);
                (BucketKey::Span { start, end }, format!("Week {}", week + 1))
            })
            .collect(),
        Granularity::Year => MONTH_LABELS
            .iter()
            .zip(1..=12)
            .map(|(label, month)| {
                (
                    BucketKey::Month {
                        year: today.year(),
                        month,
                    },
                    label.to_string(),
                )
            })
            .collect(),
    }
}

/// UTC instant of local midnight at the start of `date`
fn local_midnight_utc<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoodLabel;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        // Friday
        Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn record(mood: MoodLabel, ts: DateTime<Utc>) -> MoodRecord {
        MoodRecord::new(mood, ts)
    }

    #[test]
    fn test_week_layout_and_labels() {
        let series = Bucketer::aggregate(&[], Granularity::Week, &now(), GapPolicy::ShowGap);

        assert_eq!(series.len(), 7);
        assert_eq!(
            series.labels(),
            vec!["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"]
        );
        assert!(series.points.iter().all(|p| p.value.is_none()));
        assert_eq!(
            series.points[6].key,
            BucketKey::Day {
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
            }
        );
    }

    #[test]
    fn test_same_day_entries_are_averaged() {
        let records = vec![
            record(MoodLabel::Happy, at(2024, 3, 14, 8)),
            record(MoodLabel::Sad, at(2024, 3, 14, 20)),
        ];
        let series = Bucketer::aggregate(&records, Granularity::Week, &now(), GapPolicy::ShowGap);

        assert_eq!(series.points[5].value, Some(6.0));
        assert_eq!(series.points[5].entries, 2);
    }

    #[test]
    fn test_single_day_scenario() {
        let records = vec![
            record(MoodLabel::Happy, at(2024, 3, 14, 9)),
            record(MoodLabel::Happy, at(2024, 3, 14, 21)),
        ];
        let series = Bucketer::aggregate(&records, Granularity::Week, &now(), GapPolicy::ShowGap);

        assert_eq!(series.len(), 7);
        for (i, point) in series.points.iter().enumerate() {
            if i == 5 {
                assert_eq!(point.value, Some(MoodLabel::Happy.score()));
            } else {
                assert_eq!(point.value, None);
            }
        }
    }

    #[test]
    fn test_neutral_fill_policy() {
        let records = vec![record(MoodLabel::Calm, at(2024, 3, 15, 9))];
        let series =
            Bucketer::aggregate(&records, Granularity::Week, &now(), GapPolicy::NeutralFill);

        assert_eq!(series.gap_policy, GapPolicy::NeutralFill);
        assert_eq!(series.points[6].value, Some(7.0));
        assert!(series.points[..6]
            .iter()
            .all(|p| p.value == Some(NEUTRAL_SCORE) && p.entries == 0));
    }

    #[test]
    fn test_order_invariance() {
        let records = vec![
            record(MoodLabel::Happy, at(2024, 3, 10, 9)),
            record(MoodLabel::Angry, at(2024, 3, 10, 10)),
            record(MoodLabel::Anxious, at(2024, 3, 12, 9)),
            record(MoodLabel::Calm, at(2024, 3, 15, 9)),
            record(MoodLabel::Overwhelmed, at(2024, 3, 12, 23)),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(2);

        for granularity in [Granularity::Week, Granularity::Month, Granularity::Year] {
            let base = Bucketer::aggregate(&records, granularity, &now(), GapPolicy::ShowGap);
            assert_eq!(
                base,
                Bucketer::aggregate(&reversed, granularity, &now(), GapPolicy::ShowGap)
            );
            assert_eq!(
                base,
                Bucketer::aggregate(&rotated, granularity, &now(), GapPolicy::ShowGap)
            );
        }
    }

    #[test]
    fn test_month_spans_cover_28_days() {
        let records = vec![
            // 27 days before today: first day of Week 1
            record(MoodLabel::Sad, at(2024, 2, 17, 12)),
            // one day too early
            record(MoodLabel::Happy, at(2024, 2, 16, 12)),
            // today: last day of Week 4
            record(MoodLabel::Calm, at(2024, 3, 15, 12)),
        ];
        let series = Bucketer::aggregate(&records, Granularity::Month, &now(), GapPolicy::ShowGap);

        assert_eq!(series.labels(), vec!["Week 1", "Week 2", "Week 3", "Week 4"]);
        assert_eq!(
            series.points[0].key,
            BucketKey::Span {
                start: NaiveDate::from_ymd_opt(2024, 2, 17).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 2, 23).unwrap(),
            }
        );
        assert_eq!(series.points[0].value, Some(3.0));
        assert_eq!(series.points[1].value, None);
        assert_eq!(series.points[3].value, Some(7.0));
        assert_eq!(series.points.iter().map(|p| p.entries).sum::<usize>(), 2);
    }

    #[test]
    fn test_year_buckets_by_month() {
        let records = vec![
            record(MoodLabel::Happy, at(2024, 1, 31, 23)),
            record(MoodLabel::Sad, at(2024, 1, 2, 8)),
            record(MoodLabel::Calm, at(2024, 3, 1, 0)),
            // previous year is not part of the chart
            record(MoodLabel::Angry, at(2023, 12, 31, 12)),
        ];
        let series = Bucketer::aggregate(&records, Granularity::Year, &now(), GapPolicy::ShowGap);

        assert_eq!(series.len(), 12);
        assert_eq!(series.points[0].label, "Jan");
        assert_eq!(series.points[11].label, "Dec");
        assert_eq!(series.points[0].value, Some(6.0));
        assert_eq!(series.points[1].value, None);
        assert_eq!(series.points[2].value, Some(7.0));
    }

    #[test]
    fn test_viewer_time_zone_decides_the_day() {
        // 23:30 UTC on the 14th is already the 15th in UTC+2
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_now = now().with_timezone(&offset);
        let records = vec![record(MoodLabel::Happy, at(2024, 3, 14, 23))];

        let utc_series =
            Bucketer::aggregate(&records, Granularity::Week, &now(), GapPolicy::ShowGap);
        let local_series =
            Bucketer::aggregate(&records, Granularity::Week, &local_now, GapPolicy::ShowGap);

        assert_eq!(utc_series.points[5].value, Some(9.0));
        assert_eq!(local_series.points[6].value, Some(9.0));
        assert_eq!(local_series.points[5].value, None);
    }

    #[test]
    fn test_query_window() {
        let window = Bucketer::query_window(Granularity::Week, &now());
        assert_eq!(window.since, at(2024, 3, 9, 0));
        assert_eq!(window.until, at(2024, 3, 16, 0));

        let window = Bucketer::query_window(Granularity::Month, &now());
        assert_eq!(window.since, at(2024, 2, 17, 0));

        let window = Bucketer::query_window(Granularity::Year, &now());
        assert_eq!(window.since, at(2024, 1, 1, 0));
        assert_eq!(window.until, at(2025, 1, 1, 0));

        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let window = Bucketer::query_window(Granularity::Week, &now().with_timezone(&offset));
        assert_eq!(window.since, at(2024, 3, 9, 5));
    }
}
