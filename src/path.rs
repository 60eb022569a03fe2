//! SVG path generation for mood charts
//!
//! Produces `d` attribute strings for the stroke line and the filled area under
//! it. Buckets without a value split the chart into runs; each run is its own
//! subpath, and each area segment is closed down to the baseline on both ends.
//! Points inside a run are joined by quadratic Bezier curves whose control point
//! sits at the horizontal midpoint, level with the preceding point.

use crate::types::{ChartSeries, MOOD_SCALE_MAX};
use std::fmt::Write;

/// A point in SVG user space
#[derive(Debug, Clone, Copy, PartialEq)]
struct Vertex {
    x: f64,
    y: f64,
}

/// Stroke path for the series, `""` when nothing can be drawn
pub fn line_path(series: &ChartSeries, width: f64, height: f64) -> String {
    let mut path = String::new();

    for run in runs(series, width, height) {
        let Some((first, rest)) = run.split_first() else {
            continue;
        };
        if !path.is_empty() {
            path.push(' ');
        }
        let _ = write!(path, "M {} {}", fmt_coord(first.x), fmt_coord(first.y));
        push_curves(&mut path, *first, rest);
    }

    path
}

/// Filled area path for the series, `""` when nothing can be drawn
pub fn filled_area_path(series: &ChartSeries, width: f64, height: f64) -> String {
    let mut path = String::new();
    let baseline = fmt_coord(height);

    for run in runs(series, width, height) {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            continue;
        };
        if !path.is_empty() {
            path.push(' ');
        }
        let _ = write!(
            path,
            "M {x} {base} L {x} {y}",
            x = fmt_coord(first.x),
            base = baseline,
            y = fmt_coord(first.y)
        );
        push_curves(&mut path, *first, &run[1..]);
        let _ = write!(path, " L {} {} Z", fmt_coord(last.x), baseline);
    }

    path
}

/// Vertices of each contiguous run of valued buckets
fn runs(series: &ChartSeries, width: f64, height: f64) -> Vec<Vec<Vertex>> {
    let n = series.points.len();
    let step = if n > 1 { width / (n - 1) as f64 } else { 0.0 };

    let mut runs = Vec::new();
    let mut current: Vec<Vertex> = Vec::new();

    for (i, point) in series.points.iter().enumerate() {
        match point.value {
            Some(value) => current.push(Vertex {
                x: i as f64 * step,
                y: y_for(value, height),
            }),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

fn push_curves(path: &mut String, start: Vertex, rest: &[Vertex]) {
    let mut prev = start;
    for v in rest {
        let cx = (prev.x + v.x) / 2.0;
        let _ = write!(
            path,
            " Q {} {} {} {}",
            fmt_coord(cx),
            fmt_coord(prev.y),
            fmt_coord(v.x),
            fmt_coord(v.y)
        );
        prev = *v;
    }
}

/// Higher scores render nearer the top
fn y_for(value: f64, height: f64) -> f64 {
    let clamped = if value.is_finite() {
        value.clamp(0.0, MOOD_SCALE_MAX)
    } else {
        0.0
    };
    height - (clamped / MOOD_SCALE_MAX) * height
}

/// Two decimals, no trailing zeros, no negative zero
fn fmt_coord(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}
