//! The raw survey tables and the fixed column vocabulary they share.

use std::fmt;
use std::str::FromStr;

use crate::error::SurveyError;

/// `destpurp1` value marking a work trip.
pub const WORK_PURPOSE: &str = "Work Related";
/// `destpurp1` value marking an education trip.
pub const EDUCATION_PURPOSE: &str = "Education";

/// Number of leg slots in a journey record.
pub const JOURNEY_LEGS: usize = 15;
/// Number of mode/time/distance slots in a trip record.
pub const TRIP_LEGS: usize = 9;

/// One of the six raw survey extracts.
///
/// | Dataset             | File                       | Identifier |
/// |---------------------|----------------------------|------------|
/// | `households`        | `households.csv`           | `hhid`     |
/// | `persons`           | `persons.csv`              | `persid`   |
/// | `trips`             | `trips.csv`                | `tripid`   |
/// | `stops`             | `stops.csv`                | `stopid`   |
/// | `journey_work`      | `journey_to_work.csv`      | `persid`   |
/// | `journey_education` | `journey_to_education.csv` | `persid`   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dataset {
    Households,
    Persons,
    Trips,
    Stops,
    JourneyWork,
    JourneyEducation,
}

impl Dataset {
    pub const ALL: [Dataset; 6] = [
        Dataset::Households,
        Dataset::Persons,
        Dataset::Trips,
        Dataset::Stops,
        Dataset::JourneyWork,
        Dataset::JourneyEducation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Households => "households",
            Dataset::Persons => "persons",
            Dataset::Trips => "trips",
            Dataset::Stops => "stops",
            Dataset::JourneyWork => "journey_work",
            Dataset::JourneyEducation => "journey_education",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Dataset::Households => "households.csv",
            Dataset::Persons => "persons.csv",
            Dataset::Trips => "trips.csv",
            Dataset::Stops => "stops.csv",
            Dataset::JourneyWork => "journey_to_work.csv",
            Dataset::JourneyEducation => "journey_to_education.csv",
        }
    }

    pub fn id_column(self) -> &'static str {
        match self {
            Dataset::Households => "hhid",
            Dataset::Persons | Dataset::JourneyWork | Dataset::JourneyEducation => "persid",
            Dataset::Trips => "tripid",
            Dataset::Stops => "stopid",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| SurveyError::UnknownDataset(s.to_string()))
    }
}

/// Optional purpose filter taken by the subset views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripFilter {
    All,
    Work,
    Education,
}

impl TripFilter {
    /// `"work"` and `"education"` select a purpose; anything else, including
    /// an unrecognised string, means no filter.
    pub fn from_arg(trip_type: Option<&str>) -> Self {
        match trip_type {
            Some("work") => TripFilter::Work,
            Some("education") => TripFilter::Education,
            _ => TripFilter::All,
        }
    }

    pub fn purpose(self) -> Option<&'static str> {
        match self {
            TripFilter::All => None,
            TripFilter::Work => Some(WORK_PURPOSE),
            TripFilter::Education => Some(EDUCATION_PURPOSE),
        }
    }
}

/// Journey-to-work or journey-to-education.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JourneyKind {
    Work,
    Education,
}

impl JourneyKind {
    /// Only the literal `"work"` selects work journeys; every other value,
    /// including `None`, falls back to education.
    pub fn from_arg(journey_type: Option<&str>) -> Self {
        if journey_type == Some("work") {
            JourneyKind::Work
        } else {
            JourneyKind::Education
        }
    }

    pub fn dataset(self) -> Dataset {
        match self {
            JourneyKind::Work => Dataset::JourneyWork,
            JourneyKind::Education => Dataset::JourneyEducation,
        }
    }

    /// Column holding the journey's own identifier.
    pub fn journey_id_column(self) -> &'static str {
        match self {
            JourneyKind::Work => "jtwid",
            JourneyKind::Education => "jteid",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JourneyKind::Work => "Work",
            JourneyKind::Education => "Education",
        }
    }
}

/// Column names of one journey leg slot (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegColumns {
    pub mode: String,
    pub travel_time: String,
    pub distance: String,
    pub start_time: String,
    pub arrival_time: String,
}

impl LegColumns {
    pub fn new(leg: usize) -> Self {
        Self {
            mode: format!("mainmode_desc_{leg:02}"),
            travel_time: format!("travtime_{leg:02}"),
            // the distance slots are not zero padded in the extract
            distance: format!("vistadist_{leg}"),
            start_time: format!("starttime_{leg:02}"),
            arrival_time: format!("arrtime_{leg:02}"),
        }
    }

    /// All fifteen slots, in leg order.
    pub fn all() -> Vec<LegColumns> {
        (1..=JOURNEY_LEGS).map(LegColumns::new).collect()
    }
}

/// `mode1` .. `mode9` trip slots.
pub fn trip_mode_columns() -> Vec<String> {
    (1..=TRIP_LEGS).map(|i| format!("mode{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_round_trips_through_name() {
        for dataset in Dataset::ALL {
            assert_eq!(dataset.name().parse::<Dataset>().unwrap(), dataset);
        }
    }

    #[test]
    fn test_unknown_dataset() {
        let err = "vehicles".parse::<Dataset>().unwrap_err();
        assert!(matches!(err, SurveyError::UnknownDataset(ref name) if name == "vehicles"));
    }

    #[test]
    fn test_trip_filter_defaults_to_all() {
        assert_eq!(TripFilter::from_arg(None), TripFilter::All);
        assert_eq!(TripFilter::from_arg(Some("Work")), TripFilter::All);
        assert_eq!(TripFilter::from_arg(Some("work")), TripFilter::Work);
        assert_eq!(TripFilter::from_arg(Some("education")).purpose(), Some("Education"));
    }

    #[test]
    fn test_journey_kind_defaults_to_education() {
        assert_eq!(JourneyKind::from_arg(Some("work")), JourneyKind::Work);
        assert_eq!(JourneyKind::from_arg(None), JourneyKind::Education);
        assert_eq!(JourneyKind::from_arg(Some("commute")), JourneyKind::Education);
    }

    #[test]
    fn test_leg_columns_padding() {
        let leg = LegColumns::new(3);
        assert_eq!(leg.mode, "mainmode_desc_03");
        assert_eq!(leg.distance, "vistadist_3");
        assert_eq!(LegColumns::all().len(), 15);
    }
}
