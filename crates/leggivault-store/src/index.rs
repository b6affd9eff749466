use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use leggivault_core::LegislativeRecord;
use tracing::debug;

use crate::resolve::{Resolution, resolve};
use crate::{DuplicateKeyError, StoreError};

/// In-memory index of legislative records.
///
/// Two indexes are kept in step: the primary map keyed by codice
/// redazionale, and a secondary ordered set keyed by
/// `(data-emanazione, numero-atto, codice)` for date-range scans. Both are
/// updated inside one `&mut self` call, so a reader never sees a record in
/// one index and not the other.
///
/// Records are never removed or replaced. Derived cross-reference links are
/// held separately and dropped whenever membership changes.
#[derive(Debug, Default, Clone)]
pub struct IndexStore {
    records: BTreeMap<String, LegislativeRecord>,
    by_date: BTreeSet<(NaiveDate, u32, String)>,
    links: Option<Resolution>,
}

fn key(codice: &str) -> String {
    codice.trim().to_ascii_uppercase()
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. A codice that is already indexed is a conflict and
    /// leaves the store untouched.
    pub fn insert(&mut self, record: LegislativeRecord) -> Result<(), DuplicateKeyError> {
        let codice = key(&record.codice_redazionale);
        if self.records.contains_key(&codice) {
            return Err(DuplicateKeyError { codice });
        }
        self.by_date
            .insert((record.data_emanazione, record.numero_atto, codice.clone()));
        self.records.insert(codice.clone(), record);
        self.links = None;
        debug!(codice = %codice, "indexed record");
        Ok(())
    }

    pub fn get(&self, codice: &str) -> Result<&LegislativeRecord, StoreError> {
        self.records
            .get(&key(codice))
            .ok_or_else(|| StoreError::NotFound(codice.to_string()))
    }

    pub fn contains(&self, codice: &str) -> bool {
        self.records.contains_key(&key(codice))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with `start <= data-emanazione <= end`, ordered by date, then
    /// act number, then codice. Empty when `start > end`.
    pub fn query_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<&LegislativeRecord> {
        self.by_date
            .range((start, 0, String::new())..)
            .take_while(|(date, _, _)| *date <= end)
            .filter_map(|(_, _, codice)| self.records.get(codice))
            .collect()
    }

    /// Records enacted in `year`, in date order.
    pub fn query_by_year(&self, year: i32) -> Vec<&LegislativeRecord> {
        match (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) {
            (Some(start), Some(end)) => self.query_by_date_range(start, end),
            _ => Vec::new(),
        }
    }

    /// Records with the given act number, in date order.
    pub fn query_by_numero(&self, numero: u32) -> Vec<&LegislativeRecord> {
        self.by_date
            .iter()
            .filter(|(_, n, _)| *n == numero)
            .filter_map(|(_, _, codice)| self.records.get(codice))
            .collect()
    }

    /// Records a citation such as "n. 9/2026" can denote: act number within
    /// an enactment year. Several act types may share one.
    pub fn find_citation(&self, year: i32, numero: u32) -> Vec<&LegislativeRecord> {
        self.query_by_year(year)
            .into_iter()
            .filter(|r| r.numero_atto == numero)
            .collect()
    }

    /// Every record in codice order. The iterator is lazy and can be cloned
    /// to restart from the beginning.
    pub fn list_all(&self) -> impl Iterator<Item = &LegislativeRecord> + Clone + '_ {
        self.records.values()
    }

    /// Links computed since the last membership change, if any.
    pub fn links(&self) -> Option<&Resolution> {
        self.links.as_ref()
    }

    /// Recompute and keep cross-reference links for the current membership.
    pub fn refresh_links(&mut self) -> &Resolution {
        let resolution = resolve(self);
        self.links.insert(resolution)
    }
}

impl Extend<LegislativeRecord> for IndexStore {
    /// Insert each record, skipping duplicates.
    fn extend<T: IntoIterator<Item = LegislativeRecord>>(&mut self, iter: T) {
        for record in iter {
            if let Err(err) = self.insert(record) {
                debug!(error = %err, "skipped duplicate");
            }
        }
    }
}
