//! Timeline layout: turns a result history into lane/row geometry.
//!
//! The layout is a pure function of the event list and a [`LayoutConfig`].
//! It never fails; missing or inconsistent ticks fall back to defaults and
//! events outside the known categories are skipped.

mod axis;
mod engine;
mod geometry;
mod packing;

use serde::{Deserialize, Serialize};

pub use engine::{layout, layout_with, LayoutEngine};
pub use geometry::{Axis, LaneLayout, PlacedEvent, Rect, TimelineGeometry};

/// Canvas and packing parameters, in pixels unless noted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub max_canvas_width: i64,
    pub min_px_per_tick: i64,
    pub max_px_per_tick: i64,
    /// Upper bound on labelled ticks along the axis.
    pub max_axis_ticks: i64,
    pub max_rows_per_lane: usize,
    pub gutter_x: i64,
    pub lane_base_y: i64,
    pub lane_height: i64,
    pub row_offset_y: i64,
    pub rect_height: i64,
    pub row_gap: i64,
    pub min_rect_width: i64,
    /// Ticks shown when the history has no usable extent.
    pub empty_domain_span: i64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_canvas_width: 1000,
            min_px_per_tick: 3,
            max_px_per_tick: 12,
            max_axis_ticks: 20,
            max_rows_per_lane: 8,
            gutter_x: 120,
            lane_base_y: 40,
            lane_height: 48,
            row_offset_y: 18,
            rect_height: 12,
            row_gap: 4,
            min_rect_width: 2,
            empty_domain_span: 10,
        }
    }
}
