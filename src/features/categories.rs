//! Text categorisers for zones, employment, life stage, licences, purposes and modes.

use crate::catalog::{EDUCATION_PURPOSE, WORK_PURPOSE};
use crate::features::Compat;
use crate::relation::{Row, Value};

const MAINTENANCE_PURPOSES: &[&str] = &[
    "Buy Something",
    "Personal Business",
    "Pick-up or Deliver Something",
    "Pick-up or Drop-off Someone",
    "Accompany Someone",
];
const DISCRETIONARY_PURPOSES: &[&str] = &["Social", "Recreational"];

const PUBLIC_MODES: &[&str] = &["Public Bus", "School Bus", "Train", "Tram"];
const PRIVATE_MODES: &[&str] = &[
    "Vehicle Driver",
    "Vehicle Passenger",
    "Motorcycle",
    "Taxi",
    "Rideshare Service",
];
const ACTIVE_MODES: &[&str] = &[
    "Walking",
    "Bicycle",
    "Running/jogging",
    "Mobility Scooter",
    "e-Scooter",
];

const LIMITED_CAR_LICENCES: &[&str] = &[
    "Red Probationary Licence",
    "Green Probationary Licence",
    "Learners Permit",
];

/// Inner / Middle / Outer Melbourne, Regional outside Melbourne, Other otherwise.
pub fn melbourne_zone(subregion: &Value) -> &'static str {
    if subregion.is_null() {
        return "Unknown";
    }
    let subregion = subregion.to_string();
    if subregion.contains("Inner") {
        "Inner"
    } else if subregion.contains("Middle") {
        "Middle"
    } else if subregion.contains("Outer") {
        "Outer"
    } else if !subregion.contains("Melbourne") {
        "Regional"
    } else {
        "Other"
    }
}

/// First matching of full-time, part-time, casual, studying, retired.
///
/// A missing `studying` answer counts as studying.
pub fn employment_status(person: Row<'_>) -> &'static str {
    if person.is("fulltimework", "Yes") {
        "Full-time"
    } else if person.is("parttimework", "Yes") {
        "Part-time"
    } else if person.is("casualwork", "Yes") {
        "Casual"
    } else if !person.is("studying", "No Study") {
        "Student"
    } else if person.is("activities", "Retired") {
        "Retired"
    } else {
        "Not Working"
    }
}

/// Decade labels used by the life-stage rule.
struct LifeStageDecades {
    youth: &'static [&'static str],
    working: &'static [&'static str],
    senior: &'static [&'static str],
}

const LEGACY_DECADES: LifeStageDecades = LifeStageDecades {
    youth: &["0-10", "10-20"],
    working: &["20-30", "30-40", "40-50", "50-60"],
    senior: &["60-70", "70-80", "80-90", "90+"],
};

const CORRECTED_DECADES: LifeStageDecades = LifeStageDecades {
    youth: &["0->9", "10->19"],
    working: &["20->29", "30->39", "40->49", "50->59"],
    senior: &["60->69", "70->79", "80->89", "90->99", "100+"],
};

/// Youth, Student, Working Adult, Retired/Senior or Other, from `age_decade`
/// and activity columns.
pub fn life_stage(person: Row<'_>, compat: Compat) -> &'static str {
    let decades = match compat {
        Compat::Legacy => &LEGACY_DECADES,
        Compat::Corrected => &CORRECTED_DECADES,
    };
    let decade = person.text("age_decade").unwrap_or_default();
    let in_set = |set: &[&'static str]| set.iter().any(|d| *d == decade);

    if in_set(decades.youth) {
        "Youth"
    } else if !person.is("studying", "No Study") {
        "Student"
    } else if person.is("anywork", "Yes") && in_set(decades.working) {
        "Working Adult"
    } else if person.is("activities", "Retired") || in_set(decades.senior) {
        "Retired/Senior"
    } else {
        "Other"
    }
}

/// Car licence alone: Full, None, or Limited for anything else.
pub fn car_mobility(status: &Value) -> &'static str {
    match status.as_str() {
        Some("Full Licence") => "Full",
        Some("No Licence") => "None",
        _ => "Limited",
    }
}

/// Car, motorcycle and other licences combined.
pub fn mobility(person: Row<'_>) -> &'static str {
    if person.is("carlicence", "Full Licence")
        || person.is("mbikelicence", "Yes")
        || person.is("otherlicence", "Yes")
    {
        "Full"
    } else if person
        .text("carlicence")
        .is_some_and(|l| LIMITED_CAR_LICENCES.contains(&l))
    {
        "Limited"
    } else {
        "None"
    }
}

/// Home, Mandatory, Maintenance, Discretionary or Other.
pub fn trip_purpose(purpose: &Value, compat: Compat) -> &'static str {
    let Some(purpose) = purpose.as_str() else {
        return "Unknown";
    };
    let discretionary = match compat {
        // the legacy tables compared the purpose against the whole list
        Compat::Legacy => false,
        Compat::Corrected => DISCRETIONARY_PURPOSES.contains(&purpose),
    };

    if purpose == "At Home" {
        "Home"
    } else if purpose == WORK_PURPOSE || purpose == EDUCATION_PURPOSE {
        "Mandatory"
    } else if MAINTENANCE_PURPOSES.contains(&purpose) {
        "Maintenance"
    } else if discretionary {
        "Discretionary"
    } else {
        "Other"
    }
}

/// Public, Private, Active or Other.
pub fn trip_mode(mode: &Value) -> &'static str {
    let Some(mode) = mode.as_str() else {
        return "Unknown";
    };
    if PUBLIC_MODES.contains(&mode) {
        "Public"
    } else if PRIVATE_MODES.contains(&mode) {
        "Private"
    } else if ACTIVE_MODES.contains(&mode) {
        "Active"
    } else {
        "Other"
    }
}
