//! The preprocessing run: named steps, the tables they exchange, and the
//! runner that orders them.
//!
//! Each [`Step`] declares the result tables it reads and the ones it writes.
//! Asking for a step first runs whichever steps produce its missing inputs,
//! so the dependency order is explicit rather than implied by call order.

use std::rc::Rc;

use tracing::{debug, info};

use crate::accessor::DataAccessor;
use crate::catalog::{Dataset, JourneyKind};
use crate::config::RunConfig;
use crate::error::{Result, SurveyError};
use crate::features::Compat;
use crate::features::aggregate::summarise_person_trips;
use crate::features::combine::{combine_master, compare_work_education};
use crate::features::household::enrich_households;
use crate::features::journey::enrich_journeys;
use crate::features::person::enrich_persons;
use crate::features::trip::enrich_trips;
use crate::output::{RunSummary, save_processed_data};
use crate::relation::{Relation, Value};
use crate::source::{CsvDirectory, TableSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Households,
    Persons,
    Trips,
    Journeys,
    PersonTrips,
    Master,
    Compare,
}

impl Step {
    /// The full run, in the order the tables are written.
    pub const ORDER: [Step; 7] = [
        Step::Households,
        Step::Persons,
        Step::Trips,
        Step::Journeys,
        Step::PersonTrips,
        Step::Master,
        Step::Compare,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::Households => "households",
            Step::Persons => "persons",
            Step::Trips => "trips",
            Step::Journeys => "journeys",
            Step::PersonTrips => "person_trips",
            Step::Master => "master",
            Step::Compare => "compare",
        }
    }

    /// Result tables read by this step. Raw tables come from the accessor.
    pub fn requires(self) -> &'static [&'static str] {
        match self {
            Step::Households | Step::Persons | Step::Trips | Step::Journeys => &[],
            Step::PersonTrips => &["persons", "trips"],
            Step::Master => &["households", "persons_trips_summary"],
            Step::Compare => &["trips", "master"],
        }
    }

    /// Result tables written by this step.
    pub fn produces(self) -> &'static [&'static str] {
        match self {
            Step::Households => &["households"],
            Step::Persons => &["persons"],
            Step::Trips => &["trips"],
            Step::Journeys => &["journey_work", "journey_education"],
            Step::PersonTrips => &["persons_trips_summary"],
            Step::Master => &["master"],
            Step::Compare => &["work_trips", "education_trips"],
        }
    }

    /// The step that writes `table`, if any.
    pub fn producer(table: &str) -> Option<Step> {
        Step::ORDER
            .into_iter()
            .find(|step| step.produces().contains(&table))
    }
}

/// Tables produced during a run, in the order they were first stored.
#[derive(Debug, Default)]
pub struct ResultStore {
    tables: Vec<(String, Rc<Relation>)>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `table` under `name`, replacing an earlier table of that name in place.
    pub fn insert(&mut self, name: &str, table: Relation) {
        let table = Rc::new(table.renamed(name));
        match self.tables.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = table,
            None => self.tables.push((name.to_string(), table)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Rc<Relation>> {
        self.tables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| Rc::clone(t))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|(n, _)| n == name)
    }

    /// Like [`ResultStore::get`], failing with [`SurveyError::MissingTable`].
    pub fn require(&self, name: &str) -> Result<Rc<Relation>> {
        self.get(name)
            .ok_or_else(|| SurveyError::MissingTable(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Relation)> {
        self.tables.iter().map(|(n, t)| (n.as_str(), t.as_ref()))
    }

    /// Value counts of one column of a stored table, most frequent first.
    pub fn value_counts(&self, name: &str, column: &str) -> Result<Vec<(Value, usize)>> {
        self.require(name)?.value_counts(column)
    }
}

/// Runs steps against one accessor and one result store.
pub struct Pipeline<S> {
    accessor: DataAccessor<S>,
    store: ResultStore,
    compat: Compat,
    completed: Vec<Step>,
}

impl<S: TableSource> Pipeline<S> {
    pub fn new(accessor: DataAccessor<S>, compat: Compat) -> Self {
        Self {
            accessor,
            store: ResultStore::new(),
            compat,
            completed: Vec::new(),
        }
    }

    pub fn accessor(&mut self) -> &mut DataAccessor<S> {
        &mut self.accessor
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn into_store(self) -> ResultStore {
        self.store
    }

    /// Runs `steps` in order. Steps already completed are not repeated.
    pub fn run(&mut self, steps: &[Step]) -> Result<()> {
        for &step in steps {
            self.ensure(step)?;
        }
        Ok(())
    }

    /// Runs `step` once, after any step producing one of its missing inputs.
    pub fn ensure(&mut self, step: Step) -> Result<()> {
        if self.completed.contains(&step) {
            debug!(step = step.name(), "Step already complete");
            return Ok(());
        }
        for table in step.requires() {
            if self.store.contains(table) {
                continue;
            }
            let producer =
                Step::producer(table).ok_or_else(|| SurveyError::MissingTable(table.to_string()))?;
            self.ensure(producer)?;
        }
        self.execute(step)?;
        self.completed.push(step);
        Ok(())
    }

    /// Value counts of one column of a processed table, producing the table
    /// first when it has not been built yet.
    pub fn unique_values(&mut self, table: &str, column: &str) -> Result<Vec<(Value, usize)>> {
        if !self.store.contains(table) {
            let producer =
                Step::producer(table).ok_or_else(|| SurveyError::MissingTable(table.to_string()))?;
            self.ensure(producer)?;
        }
        self.store.value_counts(table, column)
    }

    #[tracing::instrument(skip_all, fields(step = step.name()))]
    fn execute(&mut self, step: Step) -> Result<()> {
        match step {
            Step::Households => {
                let households = self.accessor.get(Dataset::Households)?;
                let enriched = enrich_households(&households, self.compat)?;
                self.store.insert("households", enriched);
            }
            Step::Persons => {
                let persons = self.accessor.get(Dataset::Persons)?;
                let enriched = enrich_persons(&persons, self.compat)?;
                self.store.insert("persons", enriched);
            }
            Step::Trips => {
                let trips = self.accessor.get(Dataset::Trips)?;
                let enriched = enrich_trips(&trips, self.compat)?;
                self.store.insert("trips", enriched);
            }
            Step::Journeys => {
                let work = self.accessor.get(Dataset::JourneyWork)?;
                let education = self.accessor.get(Dataset::JourneyEducation)?;
                let work = enrich_journeys(&work, JourneyKind::Work)?;
                let education = enrich_journeys(&education, JourneyKind::Education)?;
                self.store.insert("journey_work", work);
                self.store.insert("journey_education", education);
            }
            Step::PersonTrips => {
                let persons = self.store.require("persons")?;
                let trips = self.store.require("trips")?;
                let summary = summarise_person_trips(&persons, &trips)?;
                self.store.insert("persons_trips_summary", summary);
            }
            Step::Master => {
                let households = self.store.require("households")?;
                let person_trips = self.store.require("persons_trips_summary")?;
                let master = combine_master(&person_trips, &households)?;
                self.store.insert("master", master);
            }
            Step::Compare => {
                let trips = self.store.require("trips")?;
                let master = self.store.require("master")?;
                let comparison = compare_work_education(&trips, &master)?;
                self.store.insert("work_trips", comparison.work);
                self.store.insert("education_trips", comparison.education);
            }
        }
        Ok(())
    }
}

/// Reads the extracts from `config.input_dir`, runs every step and writes the
/// results to `config.output_dir`.
///
/// Nothing is written unless every step succeeds.
pub fn run_pipeline(config: &RunConfig) -> Result<RunSummary> {
    info!(
        input_dir = %config.input_dir.display(),
        output_dir = %config.output_dir.display(),
        compat = ?config.compat,
        "Starting preprocessing run"
    );
    let accessor = DataAccessor::new(CsvDirectory::new(&config.input_dir));
    let mut pipeline = Pipeline::new(accessor, config.compat);
    pipeline.run(&Step::ORDER)?;

    let store = pipeline.into_store();
    save_processed_data(&store, &config.output_dir, config.gzip)
}
