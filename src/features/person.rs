//! Person enrichment: age decades, working from home, employment, life stage,
//! income and licence-based mobility.

use tracing::info;

use crate::error::Result;
use crate::features::Compat;
use crate::features::bins::{INCOME_PERCENTILE, WFH_CATEGORY, qcut};
use crate::features::categories::{car_mobility, employment_status, life_stage, mobility};
use crate::features::utility::mean;
use crate::parser::{age_decade, personal_income};
use crate::relation::{Relation, Value};

pub const WFH_COLUMNS: [&str; 7] = [
    "wfhmon", "wfhtue", "wfhwed", "wfhthu", "wfhfri", "wfhsat", "wfhsun",
];

const REQUIRED: &[&str] = &[
    "agegroup",
    "fulltimework",
    "parttimework",
    "casualwork",
    "studying",
    "activities",
    "anywork",
    "persinc",
    "carlicence",
    "mbikelicence",
    "otherlicence",
];

/// Adds `age_decade`, `total_wfh_days`, `wfh_category`, `employment_status`,
/// `life_stage`, `personal_income`, `income_percentile`, `car_mobility` and
/// `mobility`.
///
/// The seven `wfh*` day columns are rewritten as 0/1 flags. Missing personal
/// income is imputed with the whole-dollar mean of the known values.
#[tracing::instrument(skip_all, fields(rows = persons.len()))]
pub fn enrich_persons(persons: &Relation, compat: Compat) -> Result<Relation> {
    persons.require(REQUIRED)?;
    persons.require(&WFH_COLUMNS)?;
    let mut out = persons.clone();

    out.set_column(
        "age_decade",
        persons.map_column("agegroup", |v| Value::from(age_decade(v)))?,
    )?;

    let mut total_days = vec![0i64; persons.len()];
    for column in WFH_COLUMNS {
        let flags = persons.map_column(column, |v| Value::flag(v.as_str() == Some("Yes")))?;
        for (total, flag) in total_days.iter_mut().zip(&flags) {
            if flag == &Value::Int(1) {
                *total += 1;
            }
        }
        out.set_column(column, flags)?;
    }
    out.set_column(
        "total_wfh_days",
        total_days.iter().map(|&d| Value::Int(d)).collect(),
    )?;
    out.set_column(
        "wfh_category",
        total_days
            .iter()
            .map(|&d| WFH_CATEGORY.label(Some(d as f64)))
            .collect(),
    )?;

    let employment = out.map_rows(|row| Value::from(employment_status(row)));
    out.set_column("employment_status", employment)?;
    // reads the age_decade column added above
    let stages = out.map_rows(|row| Value::from(life_stage(row, compat)));
    out.set_column("life_stage", stages)?;

    let parsed: Vec<Option<i64>> = persons.column("persinc")?.iter().map(personal_income).collect();
    let known: Vec<f64> = parsed.iter().flatten().map(|&i| i as f64).collect();
    let fill = mean(&known).map(|m| m.trunc() as i64);
    let income: Vec<Option<i64>> = parsed.iter().map(|v| v.or(fill)).collect();
    out.set_column(
        "personal_income",
        income.iter().map(|&v| Value::from(v)).collect(),
    )?;
    let as_float: Vec<Option<f64>> = income.iter().map(|v| v.map(|i| i as f64)).collect();
    out.set_column("income_percentile", qcut(&as_float, &INCOME_PERCENTILE))?;

    out.set_column(
        "car_mobility",
        persons.map_column("carlicence", |v| Value::from(car_mobility(v)))?,
    )?;
    let combined = out.map_rows(|row| Value::from(mobility(row)));
    out.set_column("mobility", combined)?;

    info!(
        rows = out.len(),
        columns = out.width(),
        "Person preprocessing complete"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct P {
        age: &'static str,
        work: [&'static str; 3],
        studying: &'static str,
        activities: &'static str,
        persinc: &'static str,
        wfh_days: usize,
        licences: [&'static str; 3],
    }

    fn persons(people: &[P]) -> Relation {
        let col = |f: &dyn Fn(&P) -> Value| people.iter().map(f).collect::<Vec<_>>();
        let mut columns: Vec<(String, Vec<Value>)> = vec![
            ("agegroup".into(), col(&|p| Value::from(p.age))),
            ("fulltimework".into(), col(&|p| Value::from(p.work[0]))),
            ("parttimework".into(), col(&|p| Value::from(p.work[1]))),
            ("casualwork".into(), col(&|p| Value::from(p.work[2]))),
            (
                "anywork".into(),
                col(&|p| Value::from(if p.work.contains(&"Yes") { "Yes" } else { "No" })),
            ),
            ("studying".into(), col(&|p| Value::from(p.studying))),
            ("activities".into(), col(&|p| Value::from(p.activities))),
            ("persinc".into(), col(&|p| Value::from(p.persinc))),
            ("carlicence".into(), col(&|p| Value::from(p.licences[0]))),
            ("mbikelicence".into(), col(&|p| Value::from(p.licences[1]))),
            ("otherlicence".into(), col(&|p| Value::from(p.licences[2]))),
        ];
        for (day, name) in WFH_COLUMNS.iter().enumerate() {
            columns.push((
                name.to_string(),
                col(&|p| Value::from(if day < p.wfh_days { "Yes" } else { "No" })),
            ));
        }
        Relation::from_columns("persons", columns).unwrap()
    }

    fn worker(persinc: &'static str, wfh_days: usize) -> P {
        P {
            age: "35->39",
            work: ["Yes", "No", "No"],
            studying: "No Study",
            activities: "Full-time Work",
            persinc,
            wfh_days,
            licences: ["Full Licence", "No", "No"],
        }
    }

    #[test]
    fn test_wfh_days_and_category() {
        let rel = persons(&[
            worker("Nil income", 0),
            worker("Nil income", 2),
            worker("Nil income", 6),
        ]);
        let out = enrich_persons(&rel, Compat::Legacy).unwrap();

        assert_eq!(
            out.column("total_wfh_days").unwrap(),
            &[Value::Int(0), Value::Int(2), Value::Int(6)]
        );
        assert_eq!(out.row(0).get("wfh_category"), &Value::text("Never"));
        assert_eq!(out.row(1).get("wfh_category"), &Value::text("Occasional"));
        assert_eq!(out.row(2).get("wfh_category"), &Value::text("Always"));
        // day columns are rewritten as flags
        assert_eq!(out.row(1).get("wfhtue"), &Value::Int(1));
        assert_eq!(out.row(1).get("wfhwed"), &Value::Int(0));
    }

    #[test]
    fn test_personal_income_imputed_with_truncated_mean() {
        let rel = persons(&[
            worker("$800-$999 ($41,600-$51,999)", 0),
            worker("Negative income", 0),
            worker("Nil income", 0),
            worker("$1,500-$1,749 ($78,000-$90,999)", 0),
        ]);
        let out = enrich_persons(&rel, Compat::Legacy).unwrap();
        let income = out.column("personal_income").unwrap();

        // (46_799 + 0 + 84_499) / 3 = 43_766.0
        assert_eq!(income[2], Value::Int(43_766));
        assert_eq!(income[1], Value::Int(0));
        assert_eq!(out.row(1).get("income_percentile"), &Value::text("Bottom 25%"));
        assert_eq!(out.row(3).get("income_percentile"), &Value::text("Top 25%"));
    }

    #[test]
    fn test_employment_and_life_stage() {
        let retiree = P {
            age: "70->74",
            work: ["No", "No", "No"],
            studying: "No Study",
            activities: "Retired",
            persinc: "Nil income",
            wfh_days: 0,
            licences: ["No Licence", "Yes", "No"],
        };
        let out = enrich_persons(&persons(&[retiree]), Compat::Legacy).unwrap();
        let row = out.row(0);

        assert_eq!(row.get("age_decade"), &Value::text("70->79"));
        assert_eq!(row.get("employment_status"), &Value::text("Retired"));
        assert_eq!(row.get("life_stage"), &Value::text("Retired/Senior"));
        assert_eq!(row.get("car_mobility"), &Value::text("None"));
        assert_eq!(row.get("mobility"), &Value::text("Full"));
    }
}
