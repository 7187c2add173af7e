//! Trip enrichment: clock hours, peak flags, distance/duration buckets and
//! purpose/mode categories.

use tracing::info;

use crate::error::Result;
use crate::features::Compat;
use crate::features::bins::{DISTANCE, TIME_OF_DAY};
use crate::features::categories::{trip_mode, trip_purpose};
use crate::features::utility::median;
use crate::parser::to_float;
use crate::relation::{Relation, Value};

const REQUIRED: &[&str] = &[
    "startime",
    "arrtime",
    "cumdist",
    "destpurp1",
    "linkmode",
    "travtime",
];

/// Minutes after midnight to fractional hours.
pub fn minutes_to_hours(value: &Value) -> Option<f64> {
    to_float(value).map(|m| m / 60.0)
}

pub fn is_morning_peak(hour: Option<f64>) -> bool {
    hour.is_some_and(|h| (7.0..=9.0).contains(&h))
}

pub fn is_evening_peak(hour: Option<f64>) -> bool {
    hour.is_some_and(|h| (17.0..=19.0).contains(&h))
}

/// Adds `start_hour`, `arr_hour`, the three peak flags, `time_of_day`,
/// `distance_category`, `purpose_category`, `mode_category` and
/// `duration_category`.
///
/// `cumdist` and `travtime` are rewritten as numbers; missing distances take
/// the median distance, missing travel times stay missing.
#[tracing::instrument(skip_all, fields(rows = trips.len()))]
pub fn enrich_trips(trips: &Relation, compat: Compat) -> Result<Relation> {
    trips.require(REQUIRED)?;
    let mut out = trips.clone();

    let start: Vec<Option<f64>> = trips.column("startime")?.iter().map(minutes_to_hours).collect();
    let arrival: Vec<Option<f64>> = trips.column("arrtime")?.iter().map(minutes_to_hours).collect();
    out.set_column("start_hour", start.iter().map(|&h| Value::from(h)).collect())?;
    out.set_column("arr_hour", arrival.iter().map(|&h| Value::from(h)).collect())?;

    let morning: Vec<bool> = start.iter().map(|&h| is_morning_peak(h)).collect();
    let evening: Vec<bool> = start.iter().map(|&h| is_evening_peak(h)).collect();
    let peak: Vec<Value> = morning
        .iter()
        .zip(&evening)
        .map(|(&m, &e)| match compat {
            // the published tables OR the morning flag with itself
            Compat::Legacy => Value::flag(m),
            Compat::Corrected => Value::flag(m || e),
        })
        .collect();
    out.set_column("is_morning_peak", morning.iter().map(|&m| Value::flag(m)).collect())?;
    out.set_column("is_evening_peak", evening.iter().map(|&e| Value::flag(e)).collect())?;
    out.set_column("is_peak_hour", peak)?;
    out.set_column(
        "time_of_day",
        arrival.iter().map(|&h| TIME_OF_DAY.label(h)).collect(),
    )?;

    let distance: Vec<Option<f64>> = trips.column("cumdist")?.iter().map(to_float).collect();
    let known: Vec<f64> = distance.iter().flatten().copied().collect();
    let fill = median(&known);
    let distance: Vec<Option<f64>> = distance.iter().map(|d| d.or(fill)).collect();
    out.set_column("cumdist", distance.iter().map(|&d| Value::from(d)).collect())?;
    out.set_column(
        "distance_category",
        distance.iter().map(|&d| DISTANCE.label(d)).collect(),
    )?;

    out.set_column(
        "purpose_category",
        trips.map_column("destpurp1", |v| Value::from(trip_purpose(v, compat)))?,
    )?;
    out.set_column(
        "mode_category",
        trips.map_column("linkmode", |v| Value::from(trip_mode(v)))?,
    )?;

    let travel: Vec<Option<f64>> = trips.column("travtime")?.iter().map(to_float).collect();
    out.set_column("travtime", travel.iter().map(|&t| Value::from(t)).collect())?;
    out.set_column(
        "duration_category",
        travel.iter().map(|&t| DISTANCE.label(t)).collect(),
    )?;

    info!(
        rows = out.len(),
        columns = out.width(),
        "Trip preprocessing complete"
    );
    Ok(out)
}
