//! Dataset provider and lookup engine.
//!
//! The dataset is a tabular CSV file fixed by convention. Required columns
//! are validated at load time; CAS cells are normalized (trimmed) once
//! here so queries are a plain map probe.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use tracing::{info, warn};

use crate::error::GradeError;
use crate::types::chemical::{ChemicalRecord, HazardTier};

pub const COL_CAS: &str = "CAS号";
pub const COL_NAME: &str = "中文名称";
pub const COL_TIER: &str = "绿色分级";
pub const COL_LIMIT: &str = "涂料现行标准限量要求";
pub const COL_CONTROL: &str = "我国新污染物相关管理要求";

const REQUIRED_COLUMNS: [&str; 5] = [COL_CAS, COL_NAME, COL_TIER, COL_LIMIT, COL_CONTROL];

/// In-memory chemical dataset, read-only after load. Shared across
/// requests behind an `Arc` without locking.
pub struct ChemicalDataset {
    records: Vec<ChemicalRecord>,
    by_cas: HashMap<String, usize>,
}

impl ChemicalDataset {
    pub fn load(path: &Path) -> Result<Self, GradeError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let mut columns = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| GradeError::DatasetColumn(name.to_string()))?;
        }
        let [cas_idx, name_idx, tier_idx, limit_idx, control_idx] = columns;

        let mut records = Vec::new();
        let mut by_cas: HashMap<String, usize> = HashMap::new();
        for row in reader.records() {
            let row = row?;
            let cell = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();

            let cas_number = cell(cas_idx);
            if cas_number.is_empty() {
                continue;
            }
            let record = ChemicalRecord {
                cas_number: cas_number.clone(),
                name: cell(name_idx),
                tier: HazardTier::from_label(row.get(tier_idx).unwrap_or("")),
                usage_limit: cell(limit_idx),
                regulatory_control: cell(control_idx),
            };
            match by_cas.entry(cas_number) {
                Entry::Vacant(slot) => {
                    slot.insert(records.len());
                }
                Entry::Occupied(_) => {
                    // Data-quality issue, not an engine error: first row wins.
                    warn!(
                        cas_number = %record.cas_number,
                        "duplicate CAS number in dataset; keeping first occurrence"
                    );
                }
            }
            records.push(record);
        }

        info!(path = %path.display(), rows = records.len(), "chemical dataset loaded");
        Ok(Self { records, by_cas })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact-match lookup. Input is trimmed; anything short of exact
    /// equality with a dataset identifier is a miss.
    pub fn find_by_cas(&self, raw: &str) -> Option<&ChemicalRecord> {
        let needle = raw.trim();
        if needle.is_empty() {
            return None;
        }
        self.by_cas.get(needle).map(|&idx| &self.records[idx])
    }
}
