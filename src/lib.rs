//! MindEase Trends - Mood trend projection for the MindEase wellbeing app
//!
//! Turns logged moods into chart-ready data through a deterministic pipeline:
//! row validation → bucketing → SVG path generation → insight derivation.
//!
//! ## Modules
//!
//! - **Projection**: `pipeline` runs a projection against a `RecordStore`
//! - **Charting**: `bucketing` and `path` build the series and its SVG paths
//! - **Insights**: `insights` summarizes a window of records

pub mod adapter;
pub mod bucketing;
pub mod config;
pub mod error;
pub mod insights;
pub mod path;
pub mod pipeline;
pub mod store;
pub mod types;

pub use adapter::MoodRowAdapter;
pub use bucketing::{Bucketer, QueryWindow};
pub use config::{ChartGeometry, ProjectorConfig};
pub use error::ProjectionError;
pub use insights::derive_insights;
pub use path::{filled_area_path, line_path};
pub use pipeline::{project_rows, TrendsProjector};
pub use store::{IdentityProvider, MemoryRecordStore, RecordStore, StaticIdentity, StoreError};
pub use types::{
    ChartPoint, ChartSeries, GapPolicy, Granularity, Insight, MoodLabel, MoodRecord, RawMoodRow,
    TrendReport,
};

/// Crate version embedded in CLI output
pub const TRENDS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "mindease-trends";
