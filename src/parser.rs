//! Parsers for the free-text survey fields.
//!
//! Every parser here is total: a value that does not fit the expected shape
//! yields `None` and is imputed or left null further downstream.

use std::sync::LazyLock;

use regex::Regex;

use crate::relation::Value;

/// Yearly figure of an income bracket such as `($78,000-$90,999)`.
static YEARLY_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\$([\d,]+)-\$([\d,]+)\)").expect("valid bracket regex"));

/// Stand-in for the open-ended top household bracket.
pub const HOUSEHOLD_TOP_BRACKET: i64 = 450_000;
/// Stand-in for the open-ended top personal bracket.
pub const PERSONAL_TOP_BRACKET: i64 = 200_000;

/// Midpoint of the yearly range in parentheses, truncated to whole dollars.
///
/// `"$1,500-$1,749 ($78,000-$90,999)"` parses to `84499`.
pub fn bracket_midpoint(text: &str) -> Option<i64> {
    let caps = YEARLY_BRACKET.captures(text)?;
    let low: i64 = caps[1].replace(',', "").parse().ok()?;
    let high: i64 = caps[2].replace(',', "").parse().ok()?;
    Some((low + high) / 2)
}

/// Household income from `hhinc_group`.
pub fn household_income(value: &Value) -> Option<i64> {
    if value.is_null() {
        return None;
    }
    let text = value.to_string();
    if text.contains("or more") {
        return Some(HOUSEHOLD_TOP_BRACKET);
    }
    bracket_midpoint(&text)
}

/// Personal income from `persinc`.
///
/// Negative income counts as zero; nil income is unknown and left for
/// imputation.
pub fn personal_income(value: &Value) -> Option<i64> {
    let text = value.as_str()?;
    match text {
        "Negative income" => Some(0),
        "Nil income" => None,
        t if t.contains("or more") => Some(PERSONAL_TOP_BRACKET),
        t => bracket_midpoint(t),
    }
}

/// Collapses a five-year band (`"20->24"`) into its decade (`"20->29"`).
///
/// The open-ended `"100+"` band is kept as is.
pub fn age_decade(value: &Value) -> Option<String> {
    let text = value.as_str()?;
    if text == "100+" {
        return Some(text.to_string());
    }
    let start: u32 = text.split("->").next()?.trim().parse().ok()?;
    let decade = (start / 10) * 10;
    Some(format!("{}->{}", decade, decade + 9))
}

/// Numeric value of a survey field that may hold text.
///
/// `"Missing"` and anything unparseable become `None`.
pub fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Text(s) if s == "Missing" => None,
        Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
        other => other.as_f64(),
    }
}
