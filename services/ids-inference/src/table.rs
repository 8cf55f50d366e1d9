//! Row-oriented feature table as received from callers, before coercion.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    /// Anything that arrived as a string or compound value; coerced at sanitize time.
    Text(String),
}

impl Cell {
    /// f64 coercion: numbers pass through, numeric strings (including `inf`/`nan`) parse,
    /// missing becomes NaN. `None` means the value is not numeric at all.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Cell::Missing => Some(f64::NAN),
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl From<&Value> for Cell {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => Cell::Missing,
            Value::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self { if v.is_nan() { Cell::Missing } else { Cell::Number(v) } }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl FeatureTable {
    /// Rows shorter than `columns` are padded with missing cells, longer ones truncated.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows.into_iter().map(|mut r| { r.resize(width, Cell::Missing); r }).collect();
        Self { columns, rows }
    }

    /// One row per record; columns are the union of keys in first-seen order and
    /// absent keys become missing cells.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for rec in records {
            for key in rec.keys() {
                if !columns.iter().any(|c| c == key) { columns.push(key.clone()); }
            }
        }
        let rows = records
            .iter()
            .map(|rec| columns.iter().map(|c| rec.get(c).map(Cell::from).unwrap_or(Cell::Missing)).collect())
            .collect();
        Self { columns, rows }
    }

    pub fn from_f64_rows(columns: &[&str], rows: &[Vec<f64>]) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows.iter().map(|r| r.iter().copied().map(Cell::from).collect()).collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] { &self.columns }
    pub fn rows(&self) -> &[Vec<Cell>] { &self.rows }
    pub fn n_rows(&self) -> usize { self.rows.len() }

    pub fn column_index(&self, name: &str) -> Option<usize> { self.columns.iter().position(|c| c == name) }

    /// Conform to `columns` exactly: unknown columns come back all-missing, extra ones are dropped.
    pub fn reindex(&self, columns: &[String]) -> FeatureTable {
        let mapping: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| mapping.iter().map(|m| m.map(|i| row[i].clone()).unwrap_or(Cell::Missing)).collect())
            .collect();
        FeatureTable { columns: columns.to_vec(), rows }
    }
}
