//! Column-oriented in-memory tables.
//!
//! A [`Relation`] is an ordered set of named columns of equal length. Steps of
//! the feature pipeline never mutate a relation they were given: they clone
//! it, attach derived columns and hand the new relation back.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, SurveyError};

static NULL_VALUE: Value = Value::Null;

/// A single cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// `true` for `Null` and for a NaN float.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Hashable representation used for joins and grouping.
    ///
    /// Whole floats collapse onto the matching integer so `5` and `5.0` join.
    /// Numbers, booleans and text never share a key: `"1"` does not join `1`.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Float(f) if f.is_nan() => None,
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("n:{}", *f as i64))
            }
            Value::Int(i) => Some(format!("n:{i}")),
            Value::Float(f) => Some(format!("n:{f}")),
            Value::Bool(b) => Some(format!("b:{b}")),
            Value::Text(s) => Some(format!("t:{s}")),
        }
    }

    /// 1 when the predicate holds, 0 otherwise. Survey flags are integer columns.
    pub fn flag(set: bool) -> Self {
        Value::Int(i64::from(set))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) if v.is_nan() => Ok(()),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Borrowed view of one row.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    relation: &'a Relation,
    idx: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Cell of `column`, or `Null` when the relation has no such column.
    pub fn get(&self, column: &str) -> &'a Value {
        match self.relation.index.get(column) {
            Some(&c) => &self.relation.columns[c][self.idx],
            None => &NULL_VALUE,
        }
    }

    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).as_str()
    }

    /// Text equality against a literal; nulls never match.
    pub fn is(&self, column: &str, expected: &str) -> bool {
        self.text(column) == Some(expected)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relation {
    name: String,
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
    index: HashMap<String, usize>,
    len: usize,
}

impl Relation {
    /// Creates a relation with no columns. `name` appears in error messages.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builds a relation from `(column, values)` pairs.
    pub fn from_columns<S: Into<String>>(
        name: impl Into<String>,
        columns: Vec<(S, Vec<Value>)>,
    ) -> Result<Self> {
        let mut relation = Self::empty(name);
        for (column, values) in columns {
            relation.set_column(column, values)?;
        }
        Ok(relation)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn column(&self, column: &str) -> Result<&[Value]> {
        self.index
            .get(column)
            .map(|&c| self.columns[c].as_slice())
            .ok_or_else(|| self.unknown(column))
    }

    /// Fails with [`SurveyError::UnknownColumn`] naming the first absent column.
    pub fn require(&self, columns: &[&str]) -> Result<()> {
        match columns.iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(self.unknown(missing)),
            None => Ok(()),
        }
    }

    /// Replaces `column` if present, appends it otherwise.
    pub fn set_column(&mut self, column: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let column = column.into();
        if self.names.is_empty() {
            self.len = values.len();
        } else if values.len() != self.len {
            return Err(SurveyError::ColumnLength {
                column,
                expected: self.len,
                found: values.len(),
            });
        }

        match self.index.get(&column) {
            Some(&c) => self.columns[c] = values,
            None => {
                self.index.insert(column.clone(), self.names.len());
                self.names.push(column);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    pub fn row(&self, idx: usize) -> Row<'_> {
        Row {
            relation: self,
            idx,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.len).map(move |idx| self.row(idx))
    }

    pub fn map_column(&self, column: &str, f: impl FnMut(&Value) -> Value) -> Result<Vec<Value>> {
        Ok(self.column(column)?.iter().map(f).collect())
    }

    pub fn map_rows(&self, f: impl FnMut(Row<'_>) -> Value) -> Vec<Value> {
        self.rows().map(f).collect()
    }

    /// Projection onto `columns`, in the order given.
    pub fn select(&self, columns: &[&str]) -> Result<Relation> {
        let mut out = Relation::empty(self.name.clone());
        for column in columns {
            out.set_column(*column, self.column(column)?.to_vec())?;
        }
        if out.names.is_empty() {
            out.len = self.len;
        }
        Ok(out)
    }

    /// Rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Relation {
        let columns = self
            .columns
            .iter()
            .map(|col| indices.iter().map(|&i| col[i].clone()).collect())
            .collect();
        Relation {
            name: self.name.clone(),
            names: self.names.clone(),
            columns,
            index: self.index.clone(),
            len: indices.len(),
        }
    }

    pub fn filter(&self, mut pred: impl FnMut(Row<'_>) -> bool) -> Relation {
        let keep: Vec<usize> = self.rows().filter(|r| pred(*r)).map(|r| r.idx).collect();
        self.take(&keep)
    }

    /// Rows whose `column` holds exactly the text `expected`.
    pub fn filter_eq(&self, column: &str, expected: &str) -> Result<Relation> {
        self.require(&[column])?;
        Ok(self.filter(|row| row.is(column, expected)))
    }

    /// Left join on a shared key column.
    ///
    /// Every left row is kept in order; a left row matching several right
    /// rows is repeated once per match. Null keys never match. Non-key
    /// columns present on both sides get `_x` / `_y` suffixes.
    pub fn left_join(&self, right: &Relation, on: &str) -> Result<Relation> {
        let left_keys = self.column(on)?;
        let right_keys = right.column(on)?;

        let mut lookup: HashMap<String, Vec<usize>> = HashMap::new();
        for (j, key) in right_keys.iter().enumerate() {
            if let Some(k) = key.key() {
                lookup.entry(k).or_default().push(j);
            }
        }

        let mut left_idx = Vec::with_capacity(self.len);
        let mut right_idx = Vec::with_capacity(self.len);
        for (i, key) in left_keys.iter().enumerate() {
            match key.key().and_then(|k| lookup.get(&k)) {
                Some(matches) => {
                    for &j in matches {
                        left_idx.push(i);
                        right_idx.push(Some(j));
                    }
                }
                None => {
                    left_idx.push(i);
                    right_idx.push(None);
                }
            }
        }

        let mut out = Relation::empty(self.name.clone());
        for (name, col) in self.names.iter().zip(&self.columns) {
            let out_name = if name != on && right.has_column(name) {
                format!("{name}_x")
            } else {
                name.clone()
            };
            out.set_column(out_name, left_idx.iter().map(|&i| col[i].clone()).collect())?;
        }
        for (name, col) in right.names.iter().zip(&right.columns) {
            if name == on {
                continue;
            }
            let out_name = if self.has_column(name) {
                format!("{name}_y")
            } else {
                name.clone()
            };
            let values = right_idx
                .iter()
                .map(|j| j.map(|j| col[j].clone()).unwrap_or_default())
                .collect();
            out.set_column(out_name, values)?;
        }
        Ok(out)
    }

    /// Non-null value frequencies, most frequent first. Ties keep first-seen order.
    pub fn value_counts(&self, column: &str) -> Result<Vec<(Value, usize)>> {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(Value, usize)> = Vec::new();
        for value in self.column(column)? {
            let Some(key) = value.key() else { continue };
            match slots.get(&key) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    slots.insert(key, counts.len());
                    counts.push((value.clone(), 1));
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(counts)
    }

    fn unknown(&self, column: &str) -> SurveyError {
        SurveyError::UnknownColumn {
            dataset: self.name.clone(),
            column: column.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Relation {
        Relation::from_columns(
            "persons",
            vec![
                ("persid", vec!["P1".into(), "P2".into(), "P3".into()]),
                ("hhid", vec!["H1".into(), "H1".into(), Value::Null]),
                ("age", vec![Value::Int(34), Value::Int(31), Value::Int(7)]),
            ],
        )
        .unwrap()
    }

    fn households() -> Relation {
        Relation::from_columns(
            "households",
            vec![
                ("hhid", vec!["H1".into(), "H2".into()]),
                ("hhsize", vec![Value::Int(2), Value::Int(3)]),
                ("age", vec![Value::Int(40), Value::Int(50)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_column_unknown_is_error() {
        let err = people().column("nope").unwrap_err();
        assert!(matches!(
            err,
            SurveyError::UnknownColumn { ref dataset, ref column }
                if dataset == "persons" && column == "nope"
        ));
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut rel = people();
        let err = rel.set_column("x", vec![Value::Null]).unwrap_err();
        assert!(matches!(err, SurveyError::ColumnLength { expected: 3, found: 1, .. }));
    }

    #[test]
    fn test_set_column_replaces_in_place() {
        let mut rel = people();
        rel.set_column("age", vec![Value::Int(1); 3]).unwrap();
        assert_eq!(rel.width(), 3);
        assert_eq!(rel.column_names()[2], "age");
        assert_eq!(rel.column("age").unwrap()[0], Value::Int(1));
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let rel = people().select(&["age", "persid"]).unwrap();
        assert_eq!(rel.column_names(), &["age".to_string(), "persid".to_string()]);
        assert_eq!(rel.len(), 3);
    }

    #[test]
    fn test_left_join_keeps_unmatched_and_suffixes() {
        let joined = people().left_join(&households(), "hhid").unwrap();

        assert_eq!(joined.len(), 3);
        assert!(joined.has_column("age_x"));
        assert!(joined.has_column("age_y"));
        assert_eq!(joined.column("hhsize").unwrap()[0], Value::Int(2));
        assert_eq!(joined.column("hhsize").unwrap()[2], Value::Null);
        assert_eq!(joined.column("hhid").unwrap()[2], Value::Null);
    }

    #[test]
    fn test_left_join_repeats_multiple_matches() {
        let joined = households().left_join(&people(), "hhid").unwrap();
        // H1 matches two persons, H2 none
        assert_eq!(joined.len(), 3);
        let ids: Vec<_> = joined.column("persid").unwrap().to_vec();
        assert_eq!(ids, vec!["P1".into(), "P2".into(), Value::Null]);
    }

    #[test]
    fn test_join_key_collapses_whole_floats() {
        assert_eq!(Value::Float(5.0).key(), Value::Int(5).key());
        assert_eq!(Value::Float(f64::NAN).key(), None);
    }

    #[test]
    fn test_join_key_keeps_text_apart_from_numbers() {
        assert_ne!(Value::text("1").key(), Value::Int(1).key());
        assert_ne!(Value::text("1").key(), Value::Float(1.0).key());
        assert_ne!(Value::text("True").key(), Value::Bool(true).key());

        let left = Relation::from_columns("left", vec![("id", vec![Value::Int(1)])]).unwrap();
        let right = Relation::from_columns(
            "right",
            vec![("id", vec![Value::text("1")]), ("label", vec![Value::text("one")])],
        )
        .unwrap();
        let joined = left.left_join(&right, "id").unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.row(0).get("label"), &Value::Null);
    }

    #[test]
    fn test_value_counts_sorted_desc() {
        let counts = people().value_counts("hhid").unwrap();
        assert_eq!(counts, vec![("H1".into(), 2)]);
    }

    #[test]
    fn test_filter_eq() {
        let rel = people().filter_eq("hhid", "H1").unwrap();
        assert_eq!(rel.len(), 2);
        assert!(people().filter_eq("missing", "H1").is_err());
    }

    #[test]
    fn test_display_keeps_float_marker() {
        assert_eq!(Value::Float(84499.0).to_string(), "84499.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(true).to_string(), "True");
    }
}
