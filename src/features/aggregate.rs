use std::collections::HashMap;

use tracing::info;

use crate::catalog::{EDUCATION_PURPOSE, WORK_PURPOSE};
use crate::error::Result;
use crate::features::utility::ratio;
use crate::parser::to_float;
use crate::relation::{Relation, Row, Value};

const REQUIRED_TRIP_COLUMNS: &[&str] = &[
    "persid",
    "tripid",
    "cumdist",
    "travtime",
    "is_peak_hour",
    "destpurp1",
];

/// Columns added by [`summarise_person_trips`], in output order.
pub const SUMMARY_COLUMNS: [&str; 9] = [
    "total_trips",
    "total_distance",
    "total_travel_time",
    "total_peak_hour_trips",
    "work_trips",
    "edu_trips",
    "peak_hour_ratio",
    "avg_trip_distance",
    "avg_trip_duration",
];

/// Travel totals of one person.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripTotals {
    pub total_trips: i64,
    pub total_distance: f64,
    pub total_travel_time: f64,
    pub total_peak_hour_trips: i64,
    pub work_trips: i64,
    pub edu_trips: i64,
}

impl TripTotals {
    /// Folds one enriched trip into the totals. Trips without an id are not counted.
    pub fn add(&mut self, trip: Row<'_>) {
        if trip.get("tripid").is_null() {
            return;
        }
        self.total_trips += 1;
        // missing values are skipped by the sums
        self.total_distance += to_float(trip.get("cumdist")).unwrap_or(0.0);
        self.total_travel_time += to_float(trip.get("travtime")).unwrap_or(0.0);
        self.total_peak_hour_trips += trip.get("is_peak_hour").as_f64().unwrap_or(0.0) as i64;

        if trip.is("destpurp1", WORK_PURPOSE) {
            self.work_trips += 1;
        } else if trip.is("destpurp1", EDUCATION_PURPOSE) {
            self.edu_trips += 1;
        }
    }

    pub fn peak_hour_ratio(&self) -> f64 {
        ratio(self.total_peak_hour_trips as f64, self.total_trips as f64)
    }

    pub fn avg_trip_distance(&self) -> f64 {
        ratio(self.total_distance, self.total_trips as f64)
    }

    pub fn avg_trip_duration(&self) -> f64 {
        ratio(self.total_travel_time, self.total_trips as f64)
    }

    fn values(&self) -> [Value; 9] {
        [
            Value::Int(self.total_trips),
            Value::Float(self.total_distance),
            Value::Float(self.total_travel_time),
            Value::Int(self.total_peak_hour_trips),
            Value::Int(self.work_trips),
            Value::Int(self.edu_trips),
            Value::Float(self.peak_hour_ratio()),
            Value::Float(self.avg_trip_distance()),
            Value::Float(self.avg_trip_duration()),
        ]
    }
}

/// Totals keyed by `persid`. Trips with no owner are dropped.
pub fn totals_by_person(trips: &Relation) -> Result<HashMap<String, TripTotals>> {
    trips.require(REQUIRED_TRIP_COLUMNS)?;
    let mut totals: HashMap<String, TripTotals> = HashMap::new();
    for trip in trips.rows() {
        let Some(person) = trip.get("persid").key() else {
            continue;
        };
        totals.entry(person).or_default().add(trip);
    }
    Ok(totals)
}

/// Appends the per-person travel summary to the enriched persons.
///
/// Every person is kept once; a person without trips gets zero in every
/// summary column.
#[tracing::instrument(skip_all, fields(persons = persons.len(), trips = trips.len()))]
pub fn summarise_person_trips(persons: &Relation, trips: &Relation) -> Result<Relation> {
    persons.require(&["persid"])?;
    let totals = totals_by_person(trips)?;
    let empty = TripTotals::default();

    let mut columns: Vec<Vec<Value>> =
        vec![Vec::with_capacity(persons.len()); SUMMARY_COLUMNS.len()];
    for person in persons.column("persid")? {
        let person_totals = person
            .key()
            .and_then(|k| totals.get(&k))
            .unwrap_or(&empty);
        for (column, value) in columns.iter_mut().zip(person_totals.values()) {
            column.push(value);
        }
    }

    let mut out = persons.clone().renamed("persons_trips_summary");
    for (name, values) in SUMMARY_COLUMNS.iter().zip(columns) {
        out.set_column(*name, values)?;
    }

    let travellers = totals.len();
    info!(rows = out.len(), travellers, "Person trip summary complete");
    Ok(out)
}
