//! Identifier-keyed vote table loaded from a Galaxy Zoo style CSV.

use crate::derive::derive_labels;
use crate::types::{GalaxyLabels, LabelError, LabelResult};
use data_contracts::{VoteField, VoteRow};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header names accepted for the identifier column.
pub const ID_COLUMNS: [&str; 2] = ["GalaxyID", "galaxy_id"];

#[derive(Debug, Error)]
pub enum VoteTableError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("vote table has no GalaxyID column")]
    MissingIdColumn,
    #[error("line {line}: invalid galaxy id {value:?}")]
    InvalidId { line: u64, value: String },
    #[error("line {line}: invalid value {value:?} for {field}")]
    InvalidValue {
        line: u64,
        field: VoteField,
        value: String,
    },
    #[error("line {line}: duplicate galaxy id {galaxy_id}")]
    DuplicateId { line: u64, galaxy_id: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct VoteTable {
    rows: BTreeMap<u64, VoteRow>,
}

impl VoteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, VoteTableError> {
        let file = File::open(path).map_err(|e| VoteTableError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            rows = table.len(),
            "loaded vote table"
        );
        Ok(table)
    }

    /// Parse a CSV with a header row. Columns that are not vote fields are ignored and
    /// empty cells leave the field absent. Rows that break the vote contract are kept
    /// and logged; the deriver reports what it cannot use.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, VoteTableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let id_col = headers
            .iter()
            .position(|h| ID_COLUMNS.contains(&h))
            .ok_or(VoteTableError::MissingIdColumn)?;
        let columns: Vec<(usize, VoteField)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| VoteField::from_column(h).map(|f| (i, f)))
            .collect();
        if columns.is_empty() {
            tracing::warn!("vote table header has no recognised vote columns");
        }

        let mut table = VoteTable::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(i as u64 + 2);
            let raw_id = record.get(id_col).unwrap_or_default();
            let galaxy_id: u64 = raw_id.parse().map_err(|_| VoteTableError::InvalidId {
                line,
                value: raw_id.to_string(),
            })?;
            let mut row = VoteRow::new(galaxy_id);
            for &(col, field) in &columns {
                let raw = record.get(col).unwrap_or_default();
                if raw.is_empty() {
                    continue;
                }
                let value: f64 = raw.parse().map_err(|_| VoteTableError::InvalidValue {
                    line,
                    field,
                    value: raw.to_string(),
                })?;
                row.set(field, value);
            }
            if let Err(err) = row.validate() {
                tracing::warn!(line, %err, "vote row fails data contract");
            }
            if table.insert(row).is_some() {
                return Err(VoteTableError::DuplicateId { line, galaxy_id });
            }
        }
        Ok(table)
    }

    /// Insert a row, returning the row previously stored under the same id.
    pub fn insert(&mut self, row: VoteRow) -> Option<VoteRow> {
        self.rows.insert(row.galaxy_id, row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.rows.keys().copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &VoteRow> {
        self.rows.values()
    }

    pub fn lookup(&self, galaxy_id: u64) -> LabelResult<&VoteRow> {
        self.rows
            .get(&galaxy_id)
            .ok_or(LabelError::UnknownIdentifier { galaxy_id })
    }

    pub fn derive_for(&self, galaxy_id: u64) -> LabelResult<GalaxyLabels> {
        derive_labels(self.lookup(galaxy_id)?)
    }

    /// Derive labels for many galaxies in parallel. Output order follows `ids`; on
    /// failure the error for the earliest offending id is returned.
    pub fn derive_many(&self, ids: &[u64]) -> LabelResult<Vec<GalaxyLabels>> {
        let results: Vec<LabelResult<GalaxyLabels>> =
            ids.par_iter().map(|&id| self.derive_for(id)).collect();
        tracing::debug!(count = results.len(), "derived galaxy labels");
        results.into_iter().collect()
    }
}

impl FromIterator<VoteRow> for VoteTable {
    fn from_iter<I: IntoIterator<Item = VoteRow>>(iter: I) -> Self {
        let mut table = VoteTable::new();
        for row in iter {
            table.insert(row);
        }
        table
    }
}
