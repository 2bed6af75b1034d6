use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;

use super::error::FileFailure;
use super::types::NormalizedRecord;

/// Identity used to detect the same row imported twice:
/// access key, product description and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub access_key: String,
    pub product: String,
    pub quantity: Decimal,
}

impl DedupKey {
    pub fn of(record: &NormalizedRecord) -> Self {
        Self {
            access_key: record.access_key.clone(),
            product: record.product.clone(),
            // 1.0 and 1.00 are the same quantity.
            quantity: record.quantity.normalize(),
        }
    }
}

/// Rows split against an existing working set.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// Rows not present in the working set.
    pub fresh: Vec<NormalizedRecord>,
    /// Rows whose key is already present; the caller decides whether to keep them.
    pub duplicates: Vec<NormalizedRecord>,
}

/// Split `incoming` into rows new to `existing` and rows already there.
///
/// Rows within `incoming` are not compared with each other: one invoice may
/// legitimately list the same product twice.
pub fn partition_duplicates(
    existing: &[NormalizedRecord],
    incoming: Vec<NormalizedRecord>,
) -> DedupOutcome {
    let known: HashSet<DedupKey> = existing.iter().map(DedupKey::of).collect();
    let (duplicates, fresh) = incoming
        .into_iter()
        .partition(|r| known.contains(&DedupKey::of(r)));
    DedupOutcome { fresh, duplicates }
}

/// Set the insertion date on every row.
pub fn stamp_inserted(records: &mut [NormalizedRecord], date: NaiveDate) {
    for record in records {
        record.extension.inserted_at = Some(date);
    }
}

/// Result of processing several files one after another.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Rows of every file that parsed, in input order.
    pub records: Vec<NormalizedRecord>,
    /// Files that produced no rows.
    pub failures: Vec<FileFailure>,
    /// Number of files that produced rows.
    pub processed: usize,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
