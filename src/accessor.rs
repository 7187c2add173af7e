//! Cached access to the raw survey tables and the views built from them.
//!
//! Each raw dataset is read from the [`TableSource`] at most once per
//! accessor; derived views are memoised under a key built from the method
//! name and its arguments. Cached tables are handed out as [`Rc`] so callers
//! share one instance.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info};

use crate::catalog::{Dataset, JourneyKind, LegColumns, TripFilter, trip_mode_columns};
use crate::error::Result;
use crate::relation::{Relation, Value};
use crate::source::TableSource;

const WORK_PERSON_COLUMNS: &[&str] = &[
    "persid", "agegroup", "sex", "carlicence", "anywork", "emptype", "anzsco1", "anzsco2",
    "anzsic1", "anzsic2", "persinc", "anywfh",
];

const EDUCATION_PERSON_COLUMNS: &[&str] = &[
    "persid",
    "agegroup",
    "sex",
    "studying",
    "mainact",
    "carlicence",
    "relationship",
];

const WORK_HOUSEHOLD_COLUMNS: &[&str] = &[
    "hhid",
    "hhinc_group",
    "totalvehs",
    "totalbikes",
    "hhsize",
    "dwelltype",
    "owndwell",
    "homelga",
    "homesubregion_ASGS",
    "homeregion_ASGS",
];

const EDUCATION_HOUSEHOLD_COLUMNS: &[&str] = &[
    "hhid",
    "hhinc_group",
    "totalvehs",
    "totalbikes",
    "hhsize",
    "dwelltype",
    "owndwell",
    "homelga",
    "youngestgroup_5",
    "aveagegroup_5",
    "oldestgroup_5",
];

const JOURNEY_PERSON_COLUMNS: &[&str] = &["persid", "agegroup", "sex", "hhid"];

const SPATIAL_COLUMNS: &[&str] = &[
    "tripid",
    "origlga",
    "destlga",
    "origplace1",
    "origplace2",
    "destplace1",
    "destplace2",
    "cumdist",
    "destpurp1",
];

const TEMPORAL_COLUMNS: &[&str] = &[
    "tripid", "startime", "arrtime", "travtime", "triptime", "starthour", "arrhour", "duration",
    "dayType", "destpurp1",
];

const STOP_COLUMNS: &[&str] = &[
    "stopid",
    "hhid",
    "persid",
    "tripid",
    "stopno",
    "origplace1",
    "origplace2",
    "destplace1",
    "destplace2",
    "origlga",
    "destlga",
    "mainmode",
    "destpurp1",
    "startime",
    "arrtime",
    "deptime",
    "travtime",
    "vistadist",
    "duration",
];

/// Columns of the journey segments view, in output order.
pub const SEGMENT_COLUMNS: [&str; 12] = [
    "journey_id",
    "persid",
    "hhid",
    "segment_no",
    "mode",
    "travel_time",
    "distance",
    "start_time",
    "arrival_time",
    "journey_type",
    "main_journey_mode",
    "journey_travel_time",
];

/// Both journey tables with a few person columns attached.
#[derive(Debug, Clone)]
pub struct JourneyTables {
    pub work: Relation,
    pub education: Relation,
}

pub struct DataAccessor<S> {
    source: S,
    tables: HashMap<Dataset, Rc<Relation>>,
    views: HashMap<String, Rc<Relation>>,
    journeys: Option<Rc<JourneyTables>>,
}

impl<S: TableSource> DataAccessor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tables: HashMap::new(),
            views: HashMap::new(),
            journeys: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Full raw table, read on first use and shared afterwards.
    pub fn get(&mut self, dataset: Dataset) -> Result<Rc<Relation>> {
        if let Some(table) = self.tables.get(&dataset) {
            debug!(%dataset, "Raw table cache hit");
            return Ok(Rc::clone(table));
        }
        info!(%dataset, "Loading survey table");
        let table = Rc::new(self.source.read(dataset, None)?);
        info!(%dataset, rows = table.len(), columns = table.width(), "Loaded survey table");
        self.tables.insert(dataset, Rc::clone(&table));
        Ok(table)
    }

    /// Fresh, uncached read of `columns` of the dataset called `dataset`.
    pub fn load_columns(&self, dataset: &str, columns: &[&str]) -> Result<Relation> {
        let dataset: Dataset = dataset.parse()?;
        info!(%dataset, ?columns, "Loading columns");
        let table = self.source.read(dataset, Some(columns))?;
        info!(%dataset, rows = table.len(), "Loaded columns");
        Ok(table)
    }

    /// Trips whose purpose is work, optionally with person and household columns.
    pub fn get_work_trips(
        &mut self,
        include_person: bool,
        include_household: bool,
    ) -> Result<Rc<Relation>> {
        self.purpose_trips(TripFilter::Work, include_person, include_household)
    }

    /// Trips whose purpose is education, optionally with person and household columns.
    pub fn get_education_trips(
        &mut self,
        include_person: bool,
        include_household: bool,
    ) -> Result<Rc<Relation>> {
        self.purpose_trips(TripFilter::Education, include_person, include_household)
    }

    fn purpose_trips(
        &mut self,
        filter: TripFilter,
        include_person: bool,
        include_household: bool,
    ) -> Result<Rc<Relation>> {
        let (prefix, person_columns, household_columns) = match filter {
            TripFilter::Work => ("work_trips", WORK_PERSON_COLUMNS, WORK_HOUSEHOLD_COLUMNS),
            _ => (
                "education_trips",
                EDUCATION_PERSON_COLUMNS,
                EDUCATION_HOUSEHOLD_COLUMNS,
            ),
        };
        let key = format!("{prefix}_{include_person}_{include_household}");
        if let Some(view) = self.views.get(&key) {
            debug!(%key, "View cache hit");
            return Ok(Rc::clone(view));
        }

        let trips = self.get(Dataset::Trips)?;
        let mut view = filter_purpose(&trips, filter)?;
        if include_person {
            let persons = self.get(Dataset::Persons)?;
            view = view.left_join(&persons.select(person_columns)?, "persid")?;
        }
        if include_household {
            if !view.has_column("hhid") {
                let persons = self.get(Dataset::Persons)?;
                view = view.left_join(&persons.select(&["persid", "hhid"])?, "persid")?;
            }
            let households = self.get(Dataset::Households)?;
            view = view.left_join(&households.select(household_columns)?, "hhid")?;
        }

        Ok(self.remember(key, view.renamed(prefix)))
    }

    /// Journey-to-work and journey-to-education with `agegroup`, `sex` and
    /// `hhid` of the traveller.
    pub fn get_journey_dict(&mut self) -> Result<Rc<JourneyTables>> {
        if let Some(journeys) = &self.journeys {
            return Ok(Rc::clone(journeys));
        }
        let persons = self.get(Dataset::Persons)?.select(JOURNEY_PERSON_COLUMNS)?;
        let work = self.get(Dataset::JourneyWork)?.left_join(&persons, "persid")?;
        let education = self
            .get(Dataset::JourneyEducation)?
            .left_join(&persons, "persid")?;

        let journeys = Rc::new(JourneyTables { work, education });
        self.journeys = Some(Rc::clone(&journeys));
        Ok(journeys)
    }

    /// Location columns of stops.
    pub fn get_spatial_data(&mut self, trip_type: Option<&str>) -> Result<Rc<Relation>> {
        self.subset("spatial", Dataset::Stops, SPATIAL_COLUMNS, trip_type)
    }

    /// Timing columns of trips.
    pub fn get_temporal_data(&mut self, trip_type: Option<&str>) -> Result<Rc<Relation>> {
        self.subset("temporal", Dataset::Trips, TEMPORAL_COLUMNS, trip_type)
    }

    /// Stop-level detail.
    pub fn get_stop_data(&mut self, trip_type: Option<&str>) -> Result<Rc<Relation>> {
        self.subset("stops", Dataset::Stops, STOP_COLUMNS, trip_type)
    }

    /// Mode, time and distance slots of trips plus `is_multimodal` and
    /// `num_modes`, the count of filled `mode1`..`mode9` slots.
    pub fn get_modal_data(&mut self, trip_type: Option<&str>) -> Result<Rc<Relation>> {
        let filter = TripFilter::from_arg(trip_type);
        let key = format!("modal_{filter:?}");
        if let Some(view) = self.views.get(&key) {
            return Ok(Rc::clone(view));
        }

        let modes = trip_mode_columns();
        let slots: Vec<String> = modes
            .iter()
            .cloned()
            .chain((1..=modes.len()).map(|i| format!("time{i}")))
            .chain((1..=modes.len()).map(|i| format!("dist{i}")))
            .collect();
        let mut columns = vec!["tripid", "linkmode", "destpurp1"];
        columns.extend(slots.iter().map(String::as_str));

        let trips = self.get(Dataset::Trips)?;
        let mut view = filter_purpose(&trips.select(&columns)?, filter)?;
        let counts: Vec<i64> = view
            .rows()
            .map(|row| modes.iter().filter(|m| !row.get(m).is_null()).count() as i64)
            .collect();
        view.set_column("is_multimodal", counts.iter().map(|&n| Value::Bool(n > 1)).collect())?;
        view.set_column("num_modes", counts.into_iter().map(Value::Int).collect())?;

        Ok(self.remember(key, view.renamed("modal")))
    }

    /// One row per filled leg of every journey of the selected kind.
    ///
    /// Only `"work"` selects journey-to-work; anything else reads the
    /// education journeys. `journey_type` is copied into every row as given.
    pub fn get_journey_segments(&mut self, journey_type: Option<&str>) -> Result<Rc<Relation>> {
        let key = format!("journey_segments_{journey_type:?}");
        if let Some(view) = self.views.get(&key) {
            return Ok(Rc::clone(view));
        }

        let kind = JourneyKind::from_arg(journey_type);
        let journeys = self.get(kind.dataset())?;
        let legs = LegColumns::all();

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); SEGMENT_COLUMNS.len()];
        for journey in journeys.rows() {
            for (i, leg) in legs.iter().enumerate() {
                let mode = journey.get(&leg.mode);
                if mode.is_null() {
                    continue;
                }
                let segment = [
                    journey.get(kind.journey_id_column()).clone(),
                    journey.get("persid").clone(),
                    journey.get("hhid").clone(),
                    Value::Int(i as i64 + 1),
                    mode.clone(),
                    journey.get(&leg.travel_time).clone(),
                    journey.get(&leg.distance).clone(),
                    journey.get(&leg.start_time).clone(),
                    journey.get(&leg.arrival_time).clone(),
                    Value::from(journey_type),
                    journey.get("main_journey_mode").clone(),
                    journey.get("journey_travel_time").clone(),
                ];
                for (column, value) in columns.iter_mut().zip(segment) {
                    column.push(value);
                }
            }
        }

        let segments = Relation::from_columns(
            "journey_segments",
            SEGMENT_COLUMNS.iter().copied().zip(columns).collect(),
        )?;
        debug!(kind = kind.label(), segments = segments.len(), "Built journey segments");
        Ok(self.remember(key, segments))
    }

    /// Frequencies of the values of one raw column, most frequent first.
    pub fn get_unique_values(
        &mut self,
        dataset: &str,
        column: &str,
    ) -> Result<Vec<(Value, usize)>> {
        let dataset: Dataset = dataset.parse()?;
        self.get(dataset)?.value_counts(column)
    }

    fn subset(
        &mut self,
        prefix: &str,
        dataset: Dataset,
        columns: &[&str],
        trip_type: Option<&str>,
    ) -> Result<Rc<Relation>> {
        let filter = TripFilter::from_arg(trip_type);
        let key = format!("{prefix}_{filter:?}");
        if let Some(view) = self.views.get(&key) {
            return Ok(Rc::clone(view));
        }
        let table = self.get(dataset)?;
        let view = filter_purpose(&table.select(columns)?, filter)?;
        Ok(self.remember(key, view.renamed(prefix)))
    }

    fn remember(&mut self, key: String, view: Relation) -> Rc<Relation> {
        debug!(%key, rows = view.len(), "Caching view");
        let view = Rc::new(view);
        self.views.insert(key, Rc::clone(&view));
        view
    }
}

fn filter_purpose(table: &Relation, filter: TripFilter) -> Result<Relation> {
    match filter.purpose() {
        Some(purpose) => table.filter_eq("destpurp1", purpose),
        None => Ok(table.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurveyError;
    use std::cell::Cell;

    /// In-memory tables that count how often they are read.
    struct MemorySource {
        tables: HashMap<Dataset, Relation>,
        reads: Cell<usize>,
    }

    impl TableSource for MemorySource {
        fn read(&self, dataset: Dataset, columns: Option<&[&str]>) -> Result<Relation> {
            self.reads.set(self.reads.get() + 1);
            let table = self
                .tables
                .get(&dataset)
                .cloned()
                .unwrap_or_else(|| Relation::empty(dataset.name()));
            match columns {
                Some(columns) => table.select(columns),
                None => Ok(table),
            }
        }
    }

    fn text(values: &[&str]) -> Vec<Value> {
        values
            .iter()
            .map(|v| if v.is_empty() { Value::Null } else { Value::text(*v) })
            .collect()
    }

    fn source() -> MemorySource {
        let mut tables = HashMap::new();

        let mut households = Relation::empty("households");
        for column in WORK_HOUSEHOLD_COLUMNS.iter().chain(&EDUCATION_HOUSEHOLD_COLUMNS[8..]) {
            let values = if *column == "hhid" {
                text(&["H1", "H2"])
            } else {
                vec![Value::text(format!("{column}-H1")), Value::text(format!("{column}-H2"))]
            };
            households.set_column(*column, values).unwrap();
        }
        tables.insert(Dataset::Households, households);

        let mut persons = Relation::empty("persons");
        let extra = ["studying", "mainact", "relationship", "hhid"];
        for column in WORK_PERSON_COLUMNS.iter().chain(&extra) {
            let values = match *column {
                "persid" => text(&["P1", "P2"]),
                "hhid" => text(&["H1", "H2"]),
                _ => text(&["a", "b"]),
            };
            persons.set_column(*column, values).unwrap();
        }
        tables.insert(Dataset::Persons, persons);

        let mut trips = Relation::from_columns(
            "trips",
            vec![
                ("tripid", text(&["T1", "T2", "T3"])),
                ("persid", text(&["P1", "P1", "P2"])),
                ("destpurp1", text(&["Work Related", "At Home", "Education"])),
                ("linkmode", text(&["Train", "Walking", "Vehicle Passenger"])),
                ("mode1", text(&["Walking", "Walking", "Vehicle Passenger"])),
                ("mode2", text(&["Train", "", ""])),
                ("mode3", text(&["Walking", "", ""])),
            ],
        )
        .unwrap();
        for i in 1..=9 {
            if i > 3 {
                trips.set_column(format!("mode{i}"), text(&["", "", ""])).unwrap();
            }
            trips.set_column(format!("time{i}"), text(&["", "", ""])).unwrap();
            trips.set_column(format!("dist{i}"), text(&["", "", ""])).unwrap();
        }
        tables.insert(Dataset::Trips, trips);

        let mut journey: Vec<(String, Vec<Value>)> = vec![
            ("jtwid".into(), text(&["J1", "J2"])),
            ("persid".into(), text(&["P1", "P2"])),
            ("hhid".into(), text(&["H1", "H2"])),
            ("main_journey_mode".into(), text(&["Train", "Vehicle Driver"])),
            ("journey_travel_time".into(), vec![Value::Int(45), Value::Int(60)]),
        ];
        for leg in LegColumns::all() {
            let modes = match leg.mode.as_str() {
                "mainmode_desc_01" => text(&["Walking", "Vehicle Driver"]),
                "mainmode_desc_02" => text(&["Train", ""]),
                "mainmode_desc_03" => text(&["Walking", ""]),
                _ => text(&["", ""]),
            };
            journey.push((leg.mode, modes));
            journey.push((leg.travel_time, vec![Value::Int(10); 2]));
        }
        tables.insert(
            Dataset::JourneyWork,
            Relation::from_columns("journey_work", journey).unwrap(),
        );

        MemorySource {
            tables,
            reads: Cell::new(0),
        }
    }

    #[test]
    fn test_raw_table_read_once() {
        let mut accessor = DataAccessor::new(source());
        let first = accessor.get(Dataset::Trips).unwrap();
        let second = accessor.get(Dataset::Trips).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(accessor.source().reads.get(), 1);
    }

    #[test]
    fn test_load_columns_is_not_cached() {
        let accessor = DataAccessor::new(source());
        let table = accessor.load_columns("trips", &["tripid", "persid"]).unwrap();
        accessor.load_columns("trips", &["tripid"]).unwrap();

        assert_eq!(table.column_names(), &["tripid".to_string(), "persid".to_string()]);
        assert_eq!(accessor.source().reads.get(), 2);
    }

    #[test]
    fn test_load_columns_unknown_dataset() {
        let accessor = DataAccessor::new(source());
        let err = accessor.load_columns("vehicles", &["id"]).unwrap_err();
        assert!(matches!(err, SurveyError::UnknownDataset(_)));
    }

    #[test]
    fn test_work_trips_with_person_and_household() {
        let mut accessor = DataAccessor::new(source());
        let trips = accessor.get_work_trips(true, true).unwrap();

        assert_eq!(trips.len(), 1);
        assert_eq!(trips.row(0).get("anzsco1"), &Value::text("a"));
        // trips carry no hhid, so it comes through the person
        assert_eq!(trips.row(0).get("hhid"), &Value::text("H1"));
        assert_eq!(trips.row(0).get("homelga"), &Value::text("homelga-H1"));

        let again = accessor.get_work_trips(true, true).unwrap();
        assert!(Rc::ptr_eq(&trips, &again));
        let plain = accessor.get_work_trips(false, false).unwrap();
        assert!(!plain.has_column("sex"));
    }

    #[test]
    fn test_education_trips_use_education_columns() {
        let mut accessor = DataAccessor::new(source());
        let trips = accessor.get_education_trips(true, true).unwrap();

        assert_eq!(trips.len(), 1);
        assert!(trips.has_column("mainact"));
        assert!(trips.has_column("youngestgroup_5"));
        assert!(!trips.has_column("anzsco1"));
    }

    #[test]
    fn test_modal_data_counts_modes() {
        let mut accessor = DataAccessor::new(source());
        let modal = accessor.get_modal_data(None).unwrap();

        assert_eq!(
            modal.column("num_modes").unwrap(),
            &[Value::Int(3), Value::Int(1), Value::Int(1)]
        );
        assert_eq!(modal.row(0).get("is_multimodal"), &Value::Bool(true));
        assert_eq!(modal.row(1).get("is_multimodal"), &Value::Bool(false));

        // unrecognised filters mean no filter
        let unfiltered = accessor.get_modal_data(Some("leisure")).unwrap();
        assert!(Rc::ptr_eq(&modal, &unfiltered));
        assert_eq!(accessor.get_modal_data(Some("work")).unwrap().len(), 1);
    }

    #[test]
    fn test_journey_segments_unpivot_filled_legs() {
        let mut accessor = DataAccessor::new(source());
        let segments = accessor.get_journey_segments(Some("work")).unwrap();

        assert_eq!(segments.len(), 4);
        assert_eq!(segments.column_names().len(), SEGMENT_COLUMNS.len());
        let last = segments.row(2);
        assert_eq!(last.get("journey_id"), &Value::text("J1"));
        assert_eq!(last.get("segment_no"), &Value::Int(3));
        assert_eq!(last.get("mode"), &Value::text("Walking"));
        assert_eq!(last.get("travel_time"), &Value::Int(10));
        assert_eq!(last.get("distance"), &Value::Null);
        assert_eq!(last.get("journey_type"), &Value::text("work"));
        assert_eq!(segments.row(3).get("main_journey_mode"), &Value::text("Vehicle Driver"));
    }

    #[test]
    fn test_unique_values() {
        let mut accessor = DataAccessor::new(source());
        let counts = accessor.get_unique_values("trips", "persid").unwrap();
        assert_eq!(counts[0], (Value::text("P1"), 2));

        let err = accessor.get_unique_values("trips", "colour").unwrap_err();
        assert!(matches!(err, SurveyError::UnknownColumn { .. }));
        let err = accessor.get_unique_values("cars", "persid").unwrap_err();
        assert!(matches!(err, SurveyError::UnknownDataset(_)));
    }
}
