//! Feature engineering over the raw survey tables.
//!
//! Each step takes one or more relations and returns a new relation carrying
//! derived columns: income and age groupings, peak-hour flags, trip purpose
//! and mode categories, journey complexity, and the person × trip summary
//! that feeds the master table.

pub mod aggregate;
pub mod bins;
pub mod categories;
pub mod combine;
pub mod household;
pub mod journey;
pub mod person;
pub mod trip;
pub mod utility;

/// Which behaviour to use where the reference outputs carry known defects.
///
/// `Legacy` reproduces the published processed tables exactly. `Corrected`
/// applies the intended rule:
///
/// | Feature              | Legacy                         | Corrected                  |
/// |----------------------|--------------------------------|----------------------------|
/// | `is_peak_hour`       | morning flag only              | morning or evening         |
/// | `purpose_category`   | never `Discretionary`          | Social/Recreational match  |
/// | `life_stage`         | `0-10` style decade labels     | `0->9` style decade labels |
/// | `has_teenagers`      | `10->14`, `15->20`             | `10->14`, `15->19`         |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compat {
    #[default]
    Legacy,
    Corrected,
}
