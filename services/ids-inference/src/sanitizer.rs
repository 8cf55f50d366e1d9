//! Training-time repair of inference input: align to the frozen column order,
//! turn infinities into missing values and impute every missing value with the
//! column's training median. Bad cells are repaired, never rejected.

use crate::error::{IdsError, Result};
use crate::table::FeatureTable;
use ids_core::IDS_METRICS;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Frozen training statistics, stored as the sanitizer blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizerSpec {
    pub columns: Vec<String>,
    pub medians: Vec<f64>,
}

impl SanitizerSpec {
    pub fn new(columns: Vec<String>, medians: Vec<f64>) -> Result<Self> {
        let spec = Self { columns, medians };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.len() != self.medians.len() {
            return Err(IdsError::SchemaMismatch(format!(
                "sanitizer has {} columns but {} medians",
                self.columns.len(),
                self.medians.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.columns.len());
        if let Some(dup) = self.columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(IdsError::SchemaMismatch(format!("sanitizer column {dup:?} appears more than once")));
        }
        Ok(())
    }
}

/// Dense f32 matrix, row-major, in `columns` order.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedTable {
    columns: Vec<String>,
    data: Vec<f32>,
    n_rows: usize,
}

impl SanitizedTable {
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<f32>]) -> Result<Self> {
        let width = columns.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(IdsError::SchemaMismatch(format!("row of width {} for {} columns", bad.len(), width)));
        }
        Ok(Self { data: rows.concat(), n_rows: rows.len(), columns })
    }

    pub fn columns(&self) -> &[String] { &self.columns }
    pub fn n_rows(&self) -> usize { self.n_rows }
    pub fn n_cols(&self) -> usize { self.columns.len() }
    pub fn as_slice(&self) -> &[f32] { &self.data }

    pub fn row(&self, i: usize) -> &[f32] {
        let w = self.n_cols();
        &self.data[i * w..(i + 1) * w]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ { (0..self.n_rows).map(move |i| self.row(i)) }

    /// Same values, columns permuted into `order`. Every name in `order` must exist.
    pub fn select(&self, order: &[String]) -> Result<SanitizedTable> {
        let idx = order
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| IdsError::SchemaMismatch(format!("column {name:?} not produced by sanitizer")))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut data = Vec::with_capacity(self.n_rows * idx.len());
        for row in self.rows() {
            data.extend(idx.iter().map(|&j| row[j]));
        }
        Ok(SanitizedTable { columns: order.to_vec(), data, n_rows: self.n_rows })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub non_finite: usize,
    pub imputed: usize,
}

#[derive(Debug, Clone)]
pub struct Sanitized {
    pub table: SanitizedTable,
    pub report: SanitizeReport,
}

pub fn sanitize(table: &FeatureTable, spec: &SanitizerSpec, context: &str) -> Result<Sanitized> {
    spec.validate()?;
    let aligned = table.reindex(&spec.columns);

    let mut values: Vec<f64> = Vec::with_capacity(aligned.n_rows() * spec.columns.len());
    for (r, row) in aligned.rows().iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let v = cell.to_f64().ok_or_else(|| {
                IdsError::SchemaMismatch(format!(
                    "{context}: column {:?} row {r} holds non-numeric value {cell:?}",
                    spec.columns[j]
                ))
            })?;
            values.push(v);
        }
    }

    let mut report = SanitizeReport::default();
    for v in values.iter_mut() {
        if v.is_infinite() {
            *v = f64::NAN;
            report.non_finite += 1;
        }
    }
    if report.non_finite > 0 {
        warn!(context, count = report.non_finite, "non-finite values converted to missing");
        IDS_METRICS.non_finite_total.inc_by(report.non_finite as u64);
    }

    let width = spec.columns.len();
    for (k, v) in values.iter_mut().enumerate() {
        if v.is_nan() {
            *v = spec.medians[k % width];
            report.imputed += 1;
        }
    }
    if report.imputed > 0 {
        info!(context, count = report.imputed, "imputed missing values with training medians");
        IDS_METRICS.imputed_total.inc_by(report.imputed as u64);
    }

    let data = values.into_iter().map(|v| v as f32).collect();
    Ok(Sanitized {
        table: SanitizedTable { columns: spec.columns.clone(), data, n_rows: aligned.n_rows() },
        report,
    })
}
