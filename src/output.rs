use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::layout::{layout_with, LaneLayout, LayoutConfig, PlacedEvent, TimelineGeometry};
use crate::models::{Category, CategoryStats, JobStatus, ResultPayload};

/// A finished run ready for printing: the service's counters plus the
/// laid-out history.
#[derive(Clone, Debug, Serialize)]
pub struct TimelineReport {
    pub statistics: BTreeMap<String, CategoryStats>,
    pub history_len: usize,
    pub geometry: TimelineGeometry,
}

impl TimelineReport {
    pub fn build(payload: &ResultPayload, config: &LayoutConfig) -> Self {
        Self {
            statistics: payload.statistics.clone(),
            history_len: payload.history.len(),
            geometry: layout_with(&payload.history, config),
        }
    }
}

/// Reads a result saved from `/simulacion/result`.
pub fn load_result(path: &Path) -> Result<ResultPayload> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::Io(format!(
            "failed to read result file '{}': {}",
            path.display(),
            err
        ))
    })?;
    serde_json::from_str(&contents).map_err(|err| {
        Error::Io(format!(
            "failed to parse result file '{}': {}",
            path.display(),
            err
        ))
    })
}

pub trait Formatter {
    fn write(&self, report: &TimelineReport) -> String;
}

pub struct HumanFormatter;
pub struct SummaryFormatter;
pub struct JsonFormatter;

impl Formatter for HumanFormatter {
    fn write(&self, report: &TimelineReport) -> String {
        let mut out = String::new();
        writeln!(out, "{}", stats_line(report)).ok();
        if report.history_len == 0 {
            writeln!(out, "No history to visualize.").ok();
            return out;
        }

        let axis = &report.geometry.axis;
        writeln!(
            out,
            "Axis: ticks {}..{} (step {}, {}px per tick)",
            axis.min_tick, axis.max_tick, axis.tick_step, axis.px_per_tick
        )
        .ok();
        for lane in &report.geometry.lanes {
            write_lane(&mut out, lane);
        }
        if report.geometry.forced_overlaps > 0 {
            writeln!(
                out,
                "Note: {} customers overlap in row 0 (lane row limit reached)",
                report.geometry.forced_overlaps
            )
            .ok();
        }
        out
    }
}

impl Formatter for SummaryFormatter {
    fn write(&self, report: &TimelineReport) -> String {
        let mut out = String::new();
        writeln!(out, "{}", stats_line(report)).ok();
        for lane in &report.geometry.lanes {
            writeln!(
                out,
                "Lane {}: {} customers in {} rows",
                lane.category,
                lane.items.len(),
                lane.row_count
            )
            .ok();
        }
        out
    }
}

impl Formatter for JsonFormatter {
    fn write(&self, report: &TimelineReport) -> String {
        match serde_json::to_string_pretty(report) {
            Ok(json) => format!("{}\n", json),
            Err(err) => format!("{{\"error\": {:?}}}\n", err.to_string()),
        }
    }
}

/// Plain-text rendering of a `/simulacion/status` snapshot.
pub fn format_status(status: &JobStatus) -> String {
    let state = match (status.running, status.paused) {
        (true, true) => "running (paused)",
        (true, false) => "running",
        (false, _) => "idle",
    };
    let mut out = String::new();
    writeln!(out, "State: {}", state).ok();
    writeln!(out, "Total ticks: {}", status.total_ticks).ok();
    writeln!(out, "Queued customers: {}", status.queue_size).ok();
    writeln!(out, "Recorded events: {}", status.event_count).ok();
    out
}

fn stats_line(report: &TimelineReport) -> String {
    if report.statistics.is_empty() {
        return "Simulation finished. X axis numbers are ticks (time units).".to_string();
    }
    let counts: Vec<String> = Category::ALL
        .iter()
        .map(|category| {
            let stats = report
                .statistics
                .get(category.as_str())
                .copied()
                .unwrap_or_default();
            format!("{}:{}/{}", category, stats.arrived, stats.served)
        })
        .collect();
    format!(
        "Simulation finished. Arrived/served by category: {}",
        counts.join("  ")
    )
}

fn write_lane(out: &mut String, lane: &LaneLayout) {
    if lane.is_empty() {
        writeln!(out, "Lane {}: empty", lane.category).ok();
        return;
    }
    writeln!(out, "Lane {} ({} rows):", lane.category, lane.row_count).ok();
    for row in 0..lane.row_count {
        let items: Vec<String> = lane.row(row).map(describe).collect();
        writeln!(out, "  row {}: {}", row, items.join(", ")).ok();
    }
}

fn describe(item: &PlacedEvent) -> String {
    let tick = |value: Option<i64>| value.map_or_else(|| "-".to_string(), |tick| tick.to_string());
    format!(
        "{} [{} {} {}]",
        item.id,
        tick(item.arrival_tick),
        tick(item.service_start_tick),
        tick(item.service_end_tick)
    )
}
