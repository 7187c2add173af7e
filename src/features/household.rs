//! Household enrichment: income, vehicles, household composition and location.

use tracing::info;

use crate::error::Result;
use crate::features::Compat;
use crate::features::bins::{HOUSEHOLD_SIZE, INCOME_BRACKETS, VEHICLE_AVAILABILITY};
use crate::features::categories::melbourne_zone;
use crate::features::utility::mean;
use crate::parser::{household_income, to_float};
use crate::relation::{Relation, Value};

const REQUIRED: &[&str] = &[
    "hhinc_group",
    "totalvehs",
    "hhsize",
    "youngestgroup_5",
    "homeregion_ASGS",
    "homesubregion_ASGS",
];

const YOUNG_CHILD_GROUPS: &[&str] = &["0->4", "5->9"];

fn teenager_groups(compat: Compat) -> &'static [&'static str] {
    match compat {
        Compat::Legacy => &["10->14", "15->20"],
        Compat::Corrected => &["10->14", "15->19"],
    }
}

/// Adds `household_income`, `income_bracket`, `vehicle_per_person`,
/// `vehicle_availability`, `has_young_children`, `has_teenagers`,
/// `household_size_category`, `is_city` and `zone`.
///
/// Unparseable income brackets are imputed with the mean of the parsed ones.
#[tracing::instrument(skip_all, fields(rows = households.len()))]
pub fn enrich_households(households: &Relation, compat: Compat) -> Result<Relation> {
    households.require(REQUIRED)?;
    let mut out = households.clone();

    let parsed: Vec<Option<f64>> = households
        .column("hhinc_group")?
        .iter()
        .map(|v| household_income(v).map(|i| i as f64))
        .collect();
    let known: Vec<f64> = parsed.iter().flatten().copied().collect();
    let fill = mean(&known);
    let income: Vec<Option<f64>> = parsed.iter().map(|v| v.or(fill)).collect();

    out.set_column("household_income", income.iter().map(|&v| Value::from(v)).collect())?;
    out.set_column(
        "income_bracket",
        income.iter().map(|&v| INCOME_BRACKETS.label(v)).collect(),
    )?;

    // hhsize is never zero in the extract; a zero would leave the ratio missing
    let per_person: Vec<Option<f64>> = households
        .rows()
        .map(|row| {
            let vehicles = to_float(row.get("totalvehs"))?;
            let size = to_float(row.get("hhsize")).filter(|s| *s != 0.0)?;
            Some(vehicles / size)
        })
        .collect();
    out.set_column(
        "vehicle_per_person",
        per_person.iter().map(|&v| Value::from(v)).collect(),
    )?;
    out.set_column(
        "vehicle_availability",
        per_person.iter().map(|&v| VEHICLE_AVAILABILITY.label(v)).collect(),
    )?;

    let teenagers = teenager_groups(compat);
    out.set_column(
        "has_young_children",
        households.map_column("youngestgroup_5", |v| {
            Value::flag(v.as_str().is_some_and(|g| YOUNG_CHILD_GROUPS.contains(&g)))
        })?,
    )?;
    out.set_column(
        "has_teenagers",
        households.map_column("youngestgroup_5", |v| {
            Value::flag(v.as_str().is_some_and(|g| teenagers.contains(&g)))
        })?,
    )?;

    out.set_column(
        "household_size_category",
        households.map_column("hhsize", |v| HOUSEHOLD_SIZE.label(to_float(v)))?,
    )?;
    out.set_column(
        "is_city",
        households.map_column("homeregion_ASGS", |v| {
            Value::flag(v.to_string().contains("Melbourne"))
        })?,
    )?;
    out.set_column(
        "zone",
        households.map_column("homesubregion_ASGS", |v| Value::from(melbourne_zone(v)))?,
    )?;

    info!(
        rows = out.len(),
        columns = out.width(),
        "Household preprocessing complete"
    );
    Ok(out)
}
