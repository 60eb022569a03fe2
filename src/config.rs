//! Projector configuration
//!
//! Gap policy and chart geometry, persisted as JSON. Defaults match the
//! dimensions the app's trends and home views draw at.

use crate::error::ProjectionError;
use crate::types::{GapPolicy, Granularity};
use serde::{Deserialize, Serialize};

/// Size of the SVG viewBox a path is generated for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
}

impl ChartGeometry {
    /// Trends chart for week and month views
    pub const TRENDS: ChartGeometry = ChartGeometry {
        width: 320.0,
        height: 120.0,
    };
    /// Trends chart for the year view on wide screens
    pub const YEAR_WIDE: ChartGeometry = ChartGeometry {
        width: 800.0,
        height: 120.0,
    };
    /// Trends chart for the year view on narrow screens
    pub const YEAR_NARROW: ChartGeometry = ChartGeometry {
        width: 600.0,
        height: 120.0,
    };
    /// Mini chart on the home screen
    pub const HOME_MINI: ChartGeometry = ChartGeometry {
        width: 320.0,
        height: 60.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn validate(&self, name: &str) -> Result<(), ProjectionError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(ProjectionError::InvalidConfig(format!(
                "{} geometry must have positive width and height (got {}x{})",
                name, self.width, self.height
            )))
        }
    }
}

/// Configuration for `TrendsProjector`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Representation of empty buckets
    pub gap_policy: GapPolicy,
    /// Geometry for week charts
    pub week: ChartGeometry,
    /// Geometry for month charts
    pub month: ChartGeometry,
    /// Geometry for year charts
    pub year: ChartGeometry,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            gap_policy: GapPolicy::default(),
            week: ChartGeometry::TRENDS,
            month: ChartGeometry::TRENDS,
            year: ChartGeometry::YEAR_WIDE,
        }
    }
}

impl ProjectorConfig {
    /// Geometry used for a granularity
    pub fn geometry(&self, granularity: Granularity) -> ChartGeometry {
        match granularity {
            Granularity::Week => self.week,
            Granularity::Month => self.month,
            Granularity::Year => self.year,
        }
    }

    /// Use the same geometry for every granularity
    pub fn with_geometry(mut self, geometry: ChartGeometry) -> Self {
        self.week = geometry;
        self.month = geometry;
        self.year = geometry;
        self
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    /// Check every geometry is drawable
    pub fn validate(&self) -> Result<(), ProjectionError> {
        self.week.validate("week")?;
        self.month.validate("month")?;
        self.year.validate("year")?;
        Ok(())
    }

    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ProjectionError> {
        let config: ProjectorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
