use serde::Serialize;

use crate::models::Category;

/// Pixel-space rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn right(&self) -> i64 {
        self.x.saturating_add(self.width)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Axis {
    pub min_tick: i64,
    pub max_tick: i64,
    pub px_per_tick: i64,
    pub tick_step: i64,
    pub ticks: Vec<i64>,
    pub canvas_width: i64,
    pub canvas_height: i64,
}

/// A customer placed on a lane row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlacedEvent {
    pub id: String,
    pub category: Category,
    pub row: usize,
    pub wait: Rect,
    pub service: Option<Rect>,
    pub label_x: i64,
    pub arrival_tick: Option<i64>,
    pub service_start_tick: Option<i64>,
    pub service_end_tick: Option<i64>,
}

impl PlacedEvent {
    /// Horizontal pixel extent the event occupies on its row.
    pub fn occupied(&self) -> (i64, i64) {
        let end = match self.service {
            Some(service) => self.wait.right().max(service.right()),
            None => self.wait.right(),
        };
        (self.wait.x, end)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LaneLayout {
    pub category: Category,
    pub row_count: usize,
    pub items: Vec<PlacedEvent>,
}

impl LaneLayout {
    pub(crate) fn empty(category: Category) -> Self {
        Self {
            category,
            row_count: 0,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn row(&self, row: usize) -> impl Iterator<Item = &PlacedEvent> {
        self.items.iter().filter(move |item| item.row == row)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimelineGeometry {
    pub axis: Axis,
    pub lanes: Vec<LaneLayout>,
    pub forced_overlaps: usize,
}

impl TimelineGeometry {
    pub fn lane(&self, category: Category) -> &LaneLayout {
        &self.lanes[category.index()]
    }

    pub fn placed_count(&self) -> usize {
        self.lanes.iter().map(|lane| lane.items.len()).sum()
    }
}
