//! Master table and the work/education comparison tables.

use tracing::info;

use crate::catalog::{EDUCATION_PURPOSE, WORK_PURPOSE};
use crate::error::Result;
use crate::relation::Relation;

/// Household columns carried into the master table.
pub const HOUSEHOLD_FEATURES: [&str; 10] = [
    "hhid",
    "household_income",
    "income_bracket",
    "vehicle_per_person",
    "vehicle_availability",
    "household_size_category",
    "is_city",
    "zone",
    "has_young_children",
    "has_teenagers",
];

/// Master columns attached to work trips.
pub const WORK_PROFILE: [&str; 8] = [
    "persid",
    "hhid",
    "age_decade",
    "sex",
    "wfh_category",
    "household_income",
    "vehicle_availability",
    "zone",
];

/// Master columns attached to education trips.
pub const EDUCATION_PROFILE: [&str; 8] = [
    "persid",
    "hhid",
    "age_decade",
    "sex",
    "life_stage",
    "household_income",
    "vehicle_availability",
    "zone",
];

/// Work and education trips with the traveller's profile attached.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub work: Relation,
    pub education: Relation,
}

/// One row per person: the person × trip summary joined with household features.
#[tracing::instrument(skip_all)]
pub fn combine_master(person_trips: &Relation, households: &Relation) -> Result<Relation> {
    let features = households.select(&HOUSEHOLD_FEATURES)?;
    let master = person_trips.left_join(&features, "hhid")?.renamed("master");
    info!(
        rows = master.len(),
        columns = master.width(),
        "Master dataset complete"
    );
    Ok(master)
}

/// Splits enriched trips by purpose and attaches the traveller profile from `master`.
#[tracing::instrument(skip_all)]
pub fn compare_work_education(trips: &Relation, master: &Relation) -> Result<Comparison> {
    let work = trips
        .filter_eq("destpurp1", WORK_PURPOSE)?
        .left_join(&master.select(&WORK_PROFILE)?, "persid")?
        .renamed("work_trips");
    let education = trips
        .filter_eq("destpurp1", EDUCATION_PURPOSE)?
        .left_join(&master.select(&EDUCATION_PROFILE)?, "persid")?
        .renamed("education_trips");

    info!(
        work_trips = work.len(),
        education_trips = education.len(),
        "Comparison datasets complete"
    );
    Ok(Comparison { work, education })
}
