//! Fixed-edge and equal-frequency bucketing.

use crate::features::utility::quantile;
use crate::relation::Value;

/// Right-closed buckets `(edges[i], edges[i + 1]]` with one label each.
///
/// The lowest edge itself is excluded, so a value equal to it, like anything
/// outside the covered range or a missing value, gets no label.
#[derive(Debug, Clone, Copy)]
pub struct Bins {
    edges: &'static [f64],
    labels: &'static [&'static str],
}

impl Bins {
    pub const fn new(edges: &'static [f64], labels: &'static [&'static str]) -> Self {
        Self { edges, labels }
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn bucket(&self, value: Option<f64>) -> Option<&'static str> {
        let v = value.filter(|v| !v.is_nan())?;
        self.edges
            .windows(2)
            .zip(self.labels)
            .find(|(w, _)| v > w[0] && v <= w[1])
            .map(|(_, label)| *label)
    }

    pub fn label(&self, value: Option<f64>) -> Value {
        self.bucket(value).map_or(Value::Null, Value::from)
    }
}

/// Yearly household income, in dollars.
///
/// | Range           | Label          |
/// |-----------------|----------------|
/// | (0, 25k]        | Low            |
/// | (25k, 50k]      | Lower-middle   |
/// | (50k, 100k]     | Middle         |
/// | (100k, 150k]    | Upper-middle   |
/// | (150k, 250k]    | High           |
/// | > 250k          | Very high      |
pub const INCOME_BRACKETS: Bins = Bins::new(
    &[0.0, 25_000.0, 50_000.0, 100_000.0, 150_000.0, 250_000.0, f64::INFINITY],
    &[
        "Low (0 - 25000]",
        "Lower-middle (25000 - 50000]",
        "Middle (50000 - 100000]",
        "Upper-middle (100000 - 150000]",
        "High (150000 - 250000]",
        "Very high (250000+)",
    ],
);

/// Vehicles per household member.
pub const VEHICLE_AVAILABILITY: Bins = Bins::new(
    &[-0.1, 0.5, 1.0, 1.5, f64::INFINITY],
    &["Limited", "Moderate", "Adequate", "Abundant"],
);

pub const HOUSEHOLD_SIZE: Bins = Bins::new(
    &[0.0, 1.0, 2.0, 4.0, 6.0, 10.0],
    &[
        "Single (0 - 1]",
        "Couple (1 - 2]",
        "Small family (2 - 4]",
        "Large family (4 - 6]",
        "Extended family (6 - 10]",
    ],
);

/// Weekly work-from-home days: 0, 1–2, 3–5, 6–7.
pub const WFH_CATEGORY: Bins = Bins::new(
    &[-0.1, 0.1, 2.1, 5.1, 7.1],
    &["Never", "Occasional", "Frequent", "Always"],
);

/// Arrival hour of a trip.
pub const TIME_OF_DAY: Bins = Bins::new(
    &[0.0, 6.0, 9.0, 12.0, 15.0, 19.0, 22.0, 24.0],
    &[
        "Early Morning (0-6]",
        "Morning Peak (6-9]",
        "Late Morning (9-12]",
        "Afternoon (12-15]",
        "Evening Peak (15-19]",
        "Evening (19-22]",
        "Late Night (22-24",
    ],
);

/// Shared by trip distance, trip duration and journey distance.
pub const DISTANCE: Bins = Bins::new(
    &[0.0, 10.0, 20.0, 40.0, f64::INFINITY],
    &[
        "Short (0-10]",
        "Medium (10-20]",
        "Long (20-40]",
        "Very Long (40+)",
    ],
);

/// Number of legs in a journey.
pub const JOURNEY_COMPLEXITY: Bins = Bins::new(
    &[0.0, 1.0, 2.0, 3.0, 15.0],
    &["One-Stage", "Two-Stage", "Three-Stage", "Complex"],
);

pub const INCOME_PERCENTILE: [&str; 4] = ["Bottom 25%", "25-50%", "50-75%", "Top 25%"];

/// Equal-frequency bucketing into `labels.len()` groups.
///
/// Edges are the interpolated quantiles of the non-null values; the first
/// group includes its lower edge. When several edges coincide the later
/// groups sharing them stay empty instead of failing.
pub fn qcut(values: &[Option<f64>], labels: &[&'static str]) -> Vec<Value> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() || labels.is_empty() {
        return vec![Value::Null; values.len()];
    }
    sorted.sort_by(f64::total_cmp);

    let groups = labels.len();
    let edges: Vec<f64> = (0..=groups)
        .map(|i| quantile(&sorted, i as f64 / groups as f64))
        .collect();

    values
        .iter()
        .map(|v| match v {
            Some(v) if *v >= edges[0] && *v <= edges[groups] => {
                let group = (0..groups).find(|&g| *v <= edges[g + 1]).unwrap_or(groups - 1);
                Value::from(labels[group])
            }
            _ => Value::Null,
        })
        .collect()
}
