use crate::layout::geometry::Axis;
use crate::layout::LayoutConfig;
use crate::models::{Category, CustomerEvent};

/// Inclusive tick range covered by the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Domain {
    pub min_tick: i64,
    pub max_tick: i64,
}

impl Domain {
    pub(crate) fn from_events(events: &[CustomerEvent], empty_span: i64) -> Self {
        let min_tick = events
            .iter()
            .flat_map(|event| [event.arrival_tick, event.service_start_tick])
            .flatten()
            .min()
            .unwrap_or(0);
        let max_tick = events
            .iter()
            .flat_map(|event| [event.service_end_tick, event.arrival_tick])
            .flatten()
            .fold(0, i64::max);

        // Data collapsed onto a single instant is widened like empty data.
        if max_tick > 0 && max_tick > min_tick {
            return Self { min_tick, max_tick };
        }
        let span = empty_span.max(1);
        match min_tick.checked_add(span) {
            Some(max_tick) => Self { min_tick, max_tick },
            None => Self {
                min_tick: i64::MAX - span,
                max_tick: i64::MAX,
            },
        }
    }

    /// Number of tick slots, never below one.
    pub(crate) fn range(&self) -> i64 {
        self.max_tick
            .saturating_sub(self.min_tick)
            .saturating_add(1)
            .max(1)
    }
}

pub(crate) fn pixels_per_tick(range: i64, config: &LayoutConfig) -> i64 {
    let low = config.min_px_per_tick.max(1);
    let high = config.max_px_per_tick.max(low);
    (config.max_canvas_width / range.max(1)).clamp(low, high)
}

pub(crate) fn build_axis(domain: Domain, config: &LayoutConfig) -> Axis {
    let range = domain.range();
    let px_per_tick = pixels_per_tick(range, config);
    let ticks_to_show = range.min(config.max_axis_ticks.max(1));
    let tick_step = div_ceil(range, ticks_to_show).max(1);

    let mut ticks = Vec::new();
    let mut tick = domain.min_tick;
    while tick <= domain.max_tick {
        ticks.push(tick);
        match tick.checked_add(tick_step) {
            Some(next) => tick = next,
            None => break,
        }
    }

    let canvas_width = config
        .max_canvas_width
        .min(range.saturating_mul(px_per_tick).saturating_add(160));
    let canvas_height = (Category::ALL.len() as i64)
        .saturating_mul(config.lane_height)
        .saturating_add(120);

    Axis {
        min_tick: domain.min_tick,
        max_tick: domain.max_tick,
        px_per_tick,
        tick_step,
        ticks,
        canvas_width,
        canvas_height,
    }
}

fn div_ceil(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    if numerator % denominator == 0 {
        quotient
    } else {
        quotient + 1
    }
}
