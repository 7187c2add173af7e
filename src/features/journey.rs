//! Journey enrichment for the journey-to-work and journey-to-education tables.

use tracing::info;

use crate::catalog::{JourneyKind, LegColumns};
use crate::error::Result;
use crate::features::bins::{DISTANCE, JOURNEY_COMPLEXITY};
use crate::features::trip::{is_evening_peak, is_morning_peak, minutes_to_hours};
use crate::parser::to_float;
use crate::relation::{Relation, Value};

const REQUIRED: &[&str] = &[
    "journey_travel_time",
    "journey_distance",
    "start_time",
    "end_time",
];

/// Number of non-null leg modes of every journey.
pub fn leg_counts(journeys: &Relation) -> Result<Vec<i64>> {
    let mut counts = vec![0i64; journeys.len()];
    for leg in LegColumns::all() {
        for (count, mode) in counts.iter_mut().zip(journeys.column(&leg.mode)?) {
            if !mode.is_null() {
                *count += 1;
            }
        }
    }
    Ok(counts)
}

/// Adds `journey_type`, `journey_travel_hours`, `num_stops`,
/// `journey_complexity`, `jdist`, `journey_distance_category`, `start_hour`,
/// `end_hour` and `starts_in_peak_hour`.
///
/// Negative journey distances are clamped to zero.
#[tracing::instrument(skip_all, fields(kind = kind.label(), rows = journeys.len()))]
pub fn enrich_journeys(journeys: &Relation, kind: JourneyKind) -> Result<Relation> {
    journeys.require(REQUIRED)?;
    let mut out = journeys.clone();

    out.set_column("journey_type", vec![Value::from(kind.label()); journeys.len()])?;
    out.set_column(
        "journey_travel_hours",
        journeys.map_column("journey_travel_time", |v| Value::from(minutes_to_hours(v)))?,
    )?;

    let stops = leg_counts(journeys)?;
    out.set_column("num_stops", stops.iter().map(|&n| Value::Int(n)).collect())?;
    out.set_column(
        "journey_complexity",
        stops
            .iter()
            .map(|&n| JOURNEY_COMPLEXITY.label(Some(n as f64)))
            .collect(),
    )?;

    let distance: Vec<Option<f64>> = journeys
        .column("journey_distance")?
        .iter()
        .map(|v| to_float(v).map(|d| d.max(0.0)))
        .collect();
    out.set_column("jdist", distance.iter().map(|&d| Value::from(d)).collect())?;
    out.set_column(
        "journey_distance_category",
        distance.iter().map(|&d| DISTANCE.label(d)).collect(),
    )?;

    let start: Vec<Option<f64>> = journeys
        .column("start_time")?
        .iter()
        .map(minutes_to_hours)
        .collect();
    out.set_column("start_hour", start.iter().map(|&h| Value::from(h)).collect())?;
    out.set_column(
        "end_hour",
        journeys.map_column("end_time", |v| Value::from(minutes_to_hours(v)))?,
    )?;
    out.set_column(
        "starts_in_peak_hour",
        start
            .iter()
            .map(|&h| Value::flag(is_morning_peak(h) || is_evening_peak(h)))
            .collect(),
    )?;

    info!(
        kind = kind.label(),
        rows = out.len(),
        columns = out.width(),
        "Journey preprocessing complete"
    );
    Ok(out)
}
