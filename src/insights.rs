//! Insight derivation
//!
//! Summaries of a window of mood data: the most frequent mood, the headline
//! average, raw entry counts, and the best and worst buckets of a series.
//! The headline average is taken over raw records, never over bucket means.

use crate::types::{ChartSeries, Insight, MoodLabel, MoodRecord, PointSummary};

/// Average at or above which the window reads as positive
pub const POSITIVE_THRESHOLD: f64 = 7.0;

/// Average at or above which the window reads as moderate
pub const MODERATE_THRESHOLD: f64 = 5.0;

/// Narrative sentences for the insights panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightSummary {
    pub overall: String,
    pub best: String,
    pub challenging: String,
}

/// Derive insights from the raw records of a window
pub fn derive_insights(records: &[MoodRecord], journal_count: u64, period_label: &str) -> Insight {
    Insight {
        period: period_label.to_string(),
        most_frequent: most_frequent_mood(records),
        average_score: average_score(records),
        mood_entries_count: records.len(),
        journal_entries_count: journal_count,
        best: None,
        worst: None,
    }
}

/// Most frequently logged mood; ties go to the label earliest in `MoodLabel::ALL`
pub fn most_frequent_mood(records: &[MoodRecord]) -> Option<MoodLabel> {
    let mut counts = [0_usize; MoodLabel::ALL.len()];
    for mood in records.iter().filter_map(|r| r.mood) {
        counts[mood as usize] += 1;
    }

    let mut best: Option<(MoodLabel, usize)> = None;
    for (label, count) in MoodLabel::ALL.iter().copied().zip(counts) {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, top)) if top >= count => {}
            _ => best = Some((label, count)),
        }
    }

    best.map(|(label, _)| label)
}

/// Mean score over records, `None` when there are none
pub fn average_score(records: &[MoodRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: f64 = records.iter().map(|r| r.score()).sum();
    Some(sum / records.len() as f64)
}

impl Insight {
    /// Attach the highest and lowest valued buckets of `series`.
    ///
    /// Buckets filled under `GapPolicy::NeutralFill` carry no entries and are
    /// skipped. The earliest bucket wins ties.
    pub fn with_extremes(mut self, series: &ChartSeries) -> Self {
        let mut best: Option<PointSummary> = None;
        let mut worst: Option<PointSummary> = None;

        for point in series.points.iter().filter(|p| p.entries > 0) {
            let Some(value) = point.value else { continue };
            if best.as_ref().map_or(true, |b| value > b.value) {
                best = Some(PointSummary {
                    label: point.label.clone(),
                    value,
                });
            }
            if worst.as_ref().map_or(true, |w| value < w.value) {
                worst = Some(PointSummary {
                    label: point.label.clone(),
                    value,
                });
            }
        }

        self.best = best;
        self.worst = worst;
        self
    }

    /// Headline score: one decimal, or "N/A" without data
    pub fn headline(&self) -> String {
        match self.average_score {
            Some(avg) => format!("{:.1}", avg),
            None => "N/A".to_string(),
        }
    }

    /// Most frequent mood for display, "None" without data
    pub fn most_frequent_display(&self) -> &'static str {
        self.most_frequent
            .map(|m| m.display_name())
            .unwrap_or("None")
    }

    /// Caption lines shown on the insight cards
    pub fn captions(&self) -> [String; 3] {
        let period = self.period.to_lowercase();
        [
            format!(
                "Most frequent mood this {}: {}",
                period,
                self.most_frequent_display()
            ),
            format!("Mood entries this {}: {}", period, self.mood_entries_count),
            format!(
                "Journal entries this {}: {}",
                period, self.journal_entries_count
            ),
        ]
    }

    /// Narrative sentences describing the window
    pub fn summary(&self) -> InsightSummary {
        let period = self.period.to_lowercase();

        let Some(avg) = self.average_score else {
            return InsightSummary {
                overall: format!("No mood data available for this {}.", period),
                best: "No data to analyze.".to_string(),
                challenging: "No data to analyze.".to_string(),
            };
        };

        let overall = if avg >= POSITIVE_THRESHOLD {
            format!("Your mood has been consistently positive this {}.", period)
        } else if avg >= MODERATE_THRESHOLD {
            format!("Your mood has been moderate this {}.", period)
        } else {
            format!("Your mood has been challenging this {}.", period)
        };

        let best = match &self.best {
            Some(p) => format!("Your mood was highest in {}.", p.label),
            None => "No data to analyze.".to_string(),
        };
        let challenging = match &self.worst {
            Some(p) => format!("Your mood was lowest in {}.", p.label),
            None => "No data to analyze.".to_string(),
        };

        InsightSummary {
            overall,
            best,
            challenging,
        }
    }
}
