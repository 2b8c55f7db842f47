use tracing::{debug, trace};

use crate::layout::axis::{build_axis, Domain};
use crate::layout::geometry::{Axis, LaneLayout, PlacedEvent, Rect, TimelineGeometry};
use crate::layout::packing::RowPacker;
use crate::layout::LayoutConfig;
use crate::models::{Category, CustomerEvent};

pub struct LayoutEngine {
    pub config: LayoutConfig,
}

/// Horizontal extents of one event, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Spans {
    wait_x: i64,
    wait_width: i64,
    service_x: Option<i64>,
    service_width: Option<i64>,
}

impl Spans {
    fn occupied(&self) -> (i64, i64) {
        let wait_end = self.wait_x.saturating_add(self.wait_width);
        let end = match (self.service_x, self.service_width) {
            (Some(x), Some(width)) => wait_end.max(x.saturating_add(width)),
            _ => wait_end,
        };
        (self.wait_x, end)
    }
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, events: &[CustomerEvent]) -> TimelineGeometry {
        let config = &self.config;
        let domain = Domain::from_events(events, config.empty_domain_span);
        let axis = build_axis(domain, config);

        // Stable sort: equal arrivals keep their input order.
        let mut order: Vec<&CustomerEvent> = events.iter().collect();
        order.sort_by_key(|event| event.arrival_tick.unwrap_or(0));

        let mut packers: Vec<RowPacker> = Category::ALL
            .iter()
            .map(|_| RowPacker::new(config.max_rows_per_lane))
            .collect();
        let mut lanes: Vec<LaneLayout> = Category::ALL
            .iter()
            .map(|category| LaneLayout::empty(*category))
            .collect();
        let mut skipped = 0usize;

        for event in order {
            let Some(category) = event.lane() else {
                trace!(id = %event.id, category = %event.category, "skipping event outside known lanes");
                skipped += 1;
                continue;
            };
            let lane_idx = category.index();
            let spans = self.project(event, &axis);
            let (start, end) = spans.occupied();
            let placement = packers[lane_idx].place(start, end);
            if placement.forced {
                debug!(
                    id = %event.id,
                    lane = %category,
                    "lane row budget exhausted, overlapping row 0"
                );
            }

            let y = config
                .lane_base_y
                .saturating_add((lane_idx as i64).saturating_mul(config.lane_height))
                .saturating_add(config.row_offset_y)
                .saturating_add(
                    (placement.row as i64)
                        .saturating_mul(config.rect_height.saturating_add(config.row_gap)),
                );
            let wait = Rect {
                x: spans.wait_x,
                y,
                width: spans.wait_width,
                height: config.rect_height,
            };
            let service = match (spans.service_x, spans.service_width) {
                (Some(x), Some(width)) => Some(Rect {
                    x,
                    y,
                    width,
                    height: config.rect_height,
                }),
                _ => None,
            };
            let label_x = spans.service_x.unwrap_or(spans.wait_x).saturating_add(4);

            lanes[lane_idx].items.push(PlacedEvent {
                id: event.id.clone(),
                category,
                row: placement.row,
                wait,
                service,
                label_x,
                arrival_tick: event.arrival_tick,
                service_start_tick: event.service_start_tick,
                service_end_tick: event.service_end_tick,
            });
        }

        for (lane, packer) in lanes.iter_mut().zip(&packers) {
            lane.row_count = packer.row_count();
        }
        let forced_overlaps: usize = packers.iter().map(RowPacker::forced).sum();
        if forced_overlaps > 0 {
            debug!(forced_overlaps, "timeline has overlapping rows");
        }
        debug!(
            events = events.len(),
            skipped,
            min_tick = axis.min_tick,
            max_tick = axis.max_tick,
            px_per_tick = axis.px_per_tick,
            "timeline laid out"
        );

        TimelineGeometry {
            axis,
            lanes,
            forced_overlaps,
        }
    }

    fn project(&self, event: &CustomerEvent, axis: &Axis) -> Spans {
        let px = axis.px_per_tick;
        let min_width = self.config.min_rect_width;
        let to_x = |tick: i64| {
            self.config
                .gutter_x
                .saturating_add(tick.saturating_sub(axis.min_tick).saturating_mul(px))
        };

        let wait_start = event
            .arrival_tick
            .or(event.service_start_tick)
            .unwrap_or(0);
        let wait_end = event
            .service_start_tick
            .or(event.service_end_tick)
            .unwrap_or_else(|| wait_start.saturating_add(1));
        let wait_width = match wait_end.saturating_sub(wait_start).saturating_mul(px) {
            0 => px,
            width => width,
        }
        .max(min_width);

        let service_width = match (event.service_start_tick, event.service_end_tick) {
            (Some(start), Some(end)) => {
                Some(end.saturating_sub(start).saturating_mul(px).max(min_width))
            }
            _ => None,
        };

        Spans {
            wait_x: to_x(wait_start),
            wait_width,
            service_x: event.service_start_tick.map(to_x),
            service_width,
        }
    }
}

pub fn layout(events: &[CustomerEvent]) -> TimelineGeometry {
    layout_with(events, &LayoutConfig::default())
}

pub fn layout_with(events: &[CustomerEvent], config: &LayoutConfig) -> TimelineGeometry {
    LayoutEngine::new(config.clone()).run(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn event(
        id: &str,
        category: &str,
        arrival: Option<i64>,
        start: Option<i64>,
        end: Option<i64>,
    ) -> CustomerEvent {
        CustomerEvent::new(id, category).with_ticks(arrival, start, end)
    }

    fn rows_of(geometry: &TimelineGeometry, category: Category) -> Vec<(String, usize)> {
        geometry
            .lane(category)
            .items
            .iter()
            .map(|item| (item.id.clone(), item.row))
            .collect()
    }

    fn assert_rows_disjoint(geometry: &TimelineGeometry) {
        for lane in &geometry.lanes {
            for row in 0..lane.row_count {
                let spans: Vec<(i64, i64)> = lane.row(row).map(PlacedEvent::occupied).collect();
                for (i, a) in spans.iter().enumerate() {
                    for b in &spans[i + 1..] {
                        assert!(
                            a.1 <= b.0 || b.1 <= a.0,
                            "lane {} row {} overlaps: {:?} vs {:?}",
                            lane.category,
                            row,
                            a,
                            b
                        );
                    }
                }
            }
        }
    }

    fn maybe(rng: &mut StdRng, tick: i64) -> Option<i64> {
        if rng.gen_bool(0.85) {
            Some(tick)
        } else {
            None
        }
    }

    fn random_events(rng: &mut StdRng, count: usize) -> Vec<CustomerEvent> {
        let categories = ["A", "M", "B", "X"];
        (0..count)
            .map(|idx| {
                let arrival = rng.gen_range(0..200i64);
                let start = arrival + rng.gen_range(0..15i64);
                let end = start + rng.gen_range(0..10i64);
                let arrival = maybe(rng, arrival);
                let start = maybe(rng, start);
                let end = maybe(rng, end);
                let category = categories[rng.gen_range(0..categories.len())];
                event(&format!("c{}", idx), category, arrival, start, end)
            })
            .collect()
    }

    #[test]
    fn overlapping_customers_split_into_rows() {
        let events = vec![
            event("c1", "A", Some(0), Some(1), Some(3)),
            event("c2", "A", Some(1), Some(3), Some(5)),
            event("c3", "M", Some(0), Some(0), Some(2)),
        ];
        let geometry = layout(&events);

        assert_eq!(geometry.lane(Category::A).row_count, 2);
        assert_eq!(geometry.lane(Category::M).row_count, 1);
        assert_eq!(geometry.lane(Category::B).row_count, 0);
        assert_eq!(
            rows_of(&geometry, Category::A),
            vec![("c1".to_string(), 0), ("c2".to_string(), 1)]
        );

        assert_eq!(geometry.axis.min_tick, 0);
        assert_eq!(geometry.axis.max_tick, 5);
        assert_eq!(geometry.axis.px_per_tick, 12);

        let c2 = &geometry.lane(Category::A).items[1];
        assert_eq!(
            c2.wait,
            Rect {
                x: 132,
                y: 74,
                width: 24,
                height: 12
            }
        );
        assert_eq!(
            c2.service,
            Some(Rect {
                x: 156,
                y: 74,
                width: 24,
                height: 12
            })
        );
        assert_eq!(c2.label_x, 160);

        let c3 = &geometry.lane(Category::M).items[0];
        assert_eq!(c3.occupied(), (120, 144));
        assert_eq!(c3.wait.width, 12);
        assert_eq!(c3.wait.y, 106);
        assert_eq!(geometry.forced_overlaps, 0);
    }

    #[test]
    fn empty_history_yields_synthetic_domain() {
        let geometry = layout(&[]);
        assert_eq!(geometry.axis.min_tick, 0);
        assert_eq!(geometry.axis.max_tick, 10);
        assert_eq!(geometry.lanes.len(), 3);
        assert!(geometry.lanes.iter().all(LaneLayout::is_empty));
        assert_eq!(geometry.placed_count(), 0);
    }

    #[test]
    fn unknown_categories_are_skipped() {
        let events = vec![
            event("c1", "A", Some(0), Some(1), Some(2)),
            event("c2", "Q", Some(0), Some(1), Some(2)),
            event("c3", "", None, None, None),
            event("c4", "a", Some(3), None, None),
        ];
        let geometry = layout(&events);
        assert_eq!(geometry.placed_count(), 1);
        assert_eq!(geometry.lane(Category::A).items[0].id, "c1");
    }

    #[test]
    fn missing_ticks_fall_back() {
        let events = vec![
            event("none", "B", None, None, None),
            event("start-only", "B", None, Some(4), None),
            event("end-only", "B", Some(2), None, Some(6)),
        ];
        let geometry = layout(&events);
        let lane = geometry.lane(Category::B);
        let px = geometry.axis.px_per_tick;
        let gutter = 120;
        let min = geometry.axis.min_tick;

        let by_id = |id: &str| lane.items.iter().find(|item| item.id == id).unwrap();

        let none = by_id("none");
        assert_eq!(none.wait.x, gutter + (0 - min) * px);
        assert_eq!(none.wait.width, px);
        assert!(none.service.is_none());

        let start_only = by_id("start-only");
        assert_eq!(start_only.wait.x, gutter + (4 - min) * px);
        assert_eq!(start_only.wait.width, px);
        assert!(start_only.service.is_none());
        assert_eq!(start_only.label_x, start_only.wait.x + 4);

        let end_only = by_id("end-only");
        assert_eq!(end_only.wait.width, 4 * px);
        assert!(end_only.service.is_none());
    }

    #[test]
    fn inverted_ticks_keep_minimum_width() {
        let events = vec![event("odd", "A", Some(9), Some(4), Some(1))];
        let geometry = layout(&events);
        let item = &geometry.lane(Category::A).items[0];
        assert_eq!(item.wait.width, 2);
        assert_eq!(item.service.map(|rect| rect.width), Some(2));
        assert!(geometry.axis.max_tick > geometry.axis.min_tick);
    }

    #[test]
    fn processing_follows_arrival_then_input_order() {
        let events = vec![
            event("late", "A", Some(5), Some(6), Some(9)),
            event("first", "A", Some(0), Some(0), Some(20)),
            event("tie", "A", Some(0), Some(0), Some(20)),
        ];
        let geometry = layout(&events);
        assert_eq!(
            rows_of(&geometry, Category::A),
            vec![
                ("first".to_string(), 0),
                ("tie".to_string(), 1),
                ("late".to_string(), 2)
            ]
        );
    }

    #[test]
    fn dense_lane_overflows_into_row_zero() {
        let events: Vec<CustomerEvent> = (0..11)
            .map(|idx| event(&format!("c{}", idx), "M", Some(0), Some(1), Some(10)))
            .collect();
        let geometry = layout(&events);
        let lane = geometry.lane(Category::M);

        assert_eq!(lane.row_count, 8);
        assert_eq!(lane.items.len(), 11);
        assert_eq!(lane.row(0).count(), 4);
        assert_eq!(geometry.forced_overlaps, 3);
    }

    #[test]
    fn row_cap_is_configurable() {
        let config = LayoutConfig {
            max_rows_per_lane: 2,
            ..LayoutConfig::default()
        };
        let events: Vec<CustomerEvent> = (0..3)
            .map(|idx| event(&format!("c{}", idx), "A", Some(0), Some(1), Some(4)))
            .collect();
        let geometry = layout_with(&events, &config);
        assert_eq!(geometry.lane(Category::A).row_count, 2);
        assert_eq!(geometry.forced_overlaps, 1);
    }

    #[test]
    fn rows_never_overlap_within_capacity() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            // At most eight events per lane, so the row cap is never reached.
            let count = rng.gen_range(0..=8);
            let events = random_events(&mut rng, count);
            let geometry = layout(&events);
            assert_eq!(geometry.forced_overlaps, 0);
            assert_rows_disjoint(&geometry);
        }
    }

    #[test]
    fn layout_is_total_and_non_degenerate() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let count = rng.gen_range(0..60);
            let events = random_events(&mut rng, count);
            let geometry = layout(&events);
            assert!(geometry.axis.max_tick > geometry.axis.min_tick);
            assert!(geometry.axis.ticks.len() <= 20);
            if geometry.forced_overlaps == 0 {
                assert_rows_disjoint(&geometry);
            }
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(99);
        let events = random_events(&mut rng, 120);
        assert_eq!(layout(&events), layout(&events));
    }

    #[test]
    fn extreme_ticks_do_not_panic() {
        let events = vec![
            event("lo", "A", Some(i64::MIN), Some(0), Some(i64::MAX)),
            event("hi", "B", Some(i64::MAX), None, None),
        ];
        let geometry = layout(&events);
        assert_eq!(geometry.placed_count(), 2);
    }

    #[test]
    fn extreme_pixel_config_saturates() {
        let config = LayoutConfig {
            lane_base_y: i64::MAX,
            lane_height: i64::MAX,
            row_offset_y: i64::MAX,
            rect_height: i64::MAX,
            row_gap: i64::MAX,
            ..LayoutConfig::default()
        };
        let events = vec![
            event("b1", "B", Some(0), Some(1), Some(4)),
            event("b2", "B", Some(0), Some(1), Some(4)),
        ];

        let geometry = layout_with(&events, &config);

        assert_eq!(geometry.axis.canvas_height, i64::MAX);
        let lane = geometry.lane(Category::B);
        assert_eq!(lane.row_count, 2);
        assert!(lane.items.iter().all(|item| item.wait.y == i64::MAX));
    }
}
