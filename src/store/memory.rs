//! In-memory [`BillingStore`] and [`OrgDirectory`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::lifecycle::{RecordEffect, Transition};
use crate::models::{Invoice, InvoiceStatus, Organization, Shift, ShiftPattern, WorkRecord};

use super::{BillableRecordQuery, BillingStore, OrgDirectory, TransitionOutcome};

#[derive(Debug, Default)]
struct StoreState {
    agencies: HashMap<String, Organization>,
    facilities: HashMap<String, Organization>,
    temporary_facilities: HashMap<String, Organization>,
    shift_patterns: HashMap<String, ShiftPattern>,
    shifts: HashMap<String, Shift>,
    work_records: BTreeMap<String, WorkRecord>,
    invoices: HashMap<Uuid, Invoice>,
}

/// A thread-safe store keeping everything in memory behind one `RwLock`.
///
/// Reads share the lock; every write operation holds the write lock for its
/// whole check-then-write sequence.
///
/// # Example
///
/// ```
/// use invoice_engine::models::Organization;
/// use invoice_engine::store::{MemoryStore, OrgDirectory};
///
/// let store = MemoryStore::new();
/// store.insert_agency(Organization {
///     id: "agency_001".to_string(),
///     name: "CareForce".to_string(),
///     email: None,
///     phone: None,
///     address: None,
/// }).unwrap();
///
/// assert!(store.agency("agency_001").unwrap().is_some());
/// assert!(store.facility("agency_001").unwrap().is_none());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded from configuration: directory, shift patterns,
    /// and the optional seed shifts and work records.
    pub fn from_config(config: &EngineConfig) -> Self {
        let directory = config.directory();
        let seed = config.seed();

        let state = StoreState {
            agencies: by_id(&directory.agencies),
            facilities: by_id(&directory.facilities),
            temporary_facilities: by_id(&directory.temporary_facilities),
            shift_patterns: config.shift_patterns().clone(),
            shifts: seed
                .shifts
                .iter()
                .map(|s| (s.id.clone(), s.clone()))
                .collect(),
            work_records: seed
                .work_records
                .iter()
                .map(|r| (r.id.clone(), r.clone()))
                .collect(),
            invoices: HashMap::new(),
        };

        debug!(
            shifts = state.shifts.len(),
            work_records = state.work_records.len(),
            "Seeded memory store"
        );

        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| poisoned())
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| poisoned())
    }

    /// Adds or replaces an agency.
    pub fn insert_agency(&self, agency: Organization) -> EngineResult<()> {
        self.write()?.agencies.insert(agency.id.clone(), agency);
        Ok(())
    }

    /// Adds or replaces a verified facility.
    pub fn insert_facility(&self, facility: Organization) -> EngineResult<()> {
        self.write()?.facilities.insert(facility.id.clone(), facility);
        Ok(())
    }

    /// Adds or replaces a temporary facility.
    pub fn insert_temporary_facility(&self, facility: Organization) -> EngineResult<()> {
        self.write()?
            .temporary_facilities
            .insert(facility.id.clone(), facility);
        Ok(())
    }

    /// Adds or replaces a shift pattern.
    pub fn insert_shift_pattern(&self, pattern: ShiftPattern) -> EngineResult<()> {
        self.write()?.shift_patterns.insert(pattern.id.clone(), pattern);
        Ok(())
    }

    /// Adds or replaces a shift.
    pub fn insert_shift(&self, shift: Shift) -> EngineResult<()> {
        self.write()?.shifts.insert(shift.id.clone(), shift);
        Ok(())
    }

    /// Adds or replaces a work record.
    pub fn insert_work_record(&self, record: WorkRecord) -> EngineResult<()> {
        self.write()?.work_records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Removes a work record, returning it if it existed.
    pub fn remove_work_record(&self, work_record_id: &str) -> EngineResult<Option<WorkRecord>> {
        Ok(self.write()?.work_records.remove(work_record_id))
    }

    /// Returns all stored invoices ordered by creation time.
    pub fn invoices(&self) -> EngineResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self.read()?.invoices.values().cloned().collect();
        invoices.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(invoices)
    }
}

fn by_id(organizations: &[Organization]) -> HashMap<String, Organization> {
    organizations
        .iter()
        .map(|o| (o.id.clone(), o.clone()))
        .collect()
}

fn poisoned() -> EngineError {
    EngineError::StoreUnavailable {
        message: "store lock poisoned".to_string(),
    }
}

impl OrgDirectory for MemoryStore {
    fn agency(&self, agency_id: &str) -> EngineResult<Option<Organization>> {
        Ok(self.read()?.agencies.get(agency_id).cloned())
    }

    fn facility(&self, facility_id: &str) -> EngineResult<Option<Organization>> {
        Ok(self.read()?.facilities.get(facility_id).cloned())
    }

    fn temporary_facility(&self, facility_id: &str) -> EngineResult<Option<Organization>> {
        Ok(self.read()?.temporary_facilities.get(facility_id).cloned())
    }
}

impl BillingStore for MemoryStore {
    fn shift_pattern(&self, pattern_id: &str) -> EngineResult<Option<ShiftPattern>> {
        Ok(self.read()?.shift_patterns.get(pattern_id).cloned())
    }

    fn shift(&self, shift_id: &str) -> EngineResult<Option<Shift>> {
        Ok(self.read()?.shifts.get(shift_id).cloned())
    }

    fn work_record(&self, work_record_id: &str) -> EngineResult<Option<WorkRecord>> {
        Ok(self.read()?.work_records.get(work_record_id).cloned())
    }

    fn billable_records(&self, query: &BillableRecordQuery<'_>) -> EngineResult<Vec<WorkRecord>> {
        let state = self.read()?;

        let mut matched: Vec<(&Shift, &WorkRecord)> = state
            .work_records
            .values()
            .filter_map(|record| {
                let shift = state.shifts.get(&record.shift_id)?;
                query.matches(record, shift).then_some((shift, record))
            })
            .collect();
        matched.sort_by(|(a, ra), (b, rb)| a.date.cmp(&b.date).then(ra.id.cmp(&rb.id)));

        Ok(matched.into_iter().map(|(_, record)| record.clone()).collect())
    }

    fn invoice(&self, invoice_id: Uuid) -> EngineResult<Option<Invoice>> {
        Ok(self.read()?.invoices.get(&invoice_id).cloned())
    }

    fn insert_invoice(&self, invoice: Invoice) -> EngineResult<Invoice> {
        let mut state = self.write()?;

        if let Some(missing) = invoice
            .work_record_ids
            .iter()
            .find(|id| !state.work_records.contains_key(*id))
        {
            return Err(EngineError::WorkRecordNotFound {
                work_record_id: missing.clone(),
            });
        }

        let mut conflicting_records = Vec::new();
        let mut conflicting_numbers = Vec::new();
        for existing in state.invoices.values() {
            let overlap: Vec<&String> = invoice
                .work_record_ids
                .iter()
                .filter(|id| existing.references(id))
                .collect();
            if !overlap.is_empty() {
                conflicting_records.extend(overlap.into_iter().cloned());
                conflicting_numbers.push(existing.invoice_number.clone());
            }
        }
        if !conflicting_records.is_empty() {
            conflicting_records.sort();
            conflicting_numbers.sort();
            return Err(EngineError::DuplicateInvoiceReference {
                work_record_ids: conflicting_records,
                invoice_numbers: conflicting_numbers,
            });
        }

        let query = BillableRecordQuery::for_invoice(&invoice);
        for id in &invoice.work_record_ids {
            let Some(record) = state.work_records.get(id) else {
                continue;
            };
            let exclusion = match state.shifts.get(&record.shift_id) {
                Some(shift) => query.exclusion(record, shift),
                None => Some("has no shift"),
            };
            if let Some(reason) = exclusion {
                debug!(work_record_id = %id, reason, "Work record refused for invoice");
                return Err(EngineError::validation(
                    "work_record_ids",
                    format!("work record '{}' {}", id, reason),
                ));
            }
        }

        if state
            .invoices
            .values()
            .any(|existing| existing.invoice_number == invoice.invoice_number)
        {
            return Err(EngineError::DuplicateInvoiceNumber {
                invoice_number: invoice.invoice_number,
            });
        }

        for id in &invoice.work_record_ids {
            if let Some(record) = state.work_records.get_mut(id) {
                record.attach_to_invoice(invoice.id, &invoice.invoice_number);
            }
        }
        state.invoices.insert(invoice.id, invoice.clone());

        Ok(invoice)
    }

    fn apply_transition(
        &self,
        invoice_id: Uuid,
        transition: &Transition,
        at: DateTime<Utc>,
    ) -> EngineResult<TransitionOutcome> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let invoice = state
            .invoices
            .get_mut(&invoice_id)
            .ok_or(EngineError::InvoiceNotFound { invoice_id })?;

        if invoice.status != transition.from {
            return Err(EngineError::InvalidTransition {
                current: invoice.status,
                requested: transition.to,
            });
        }

        invoice.status = transition.to;
        invoice.updated_at = at;

        let mut missing_records = Vec::new();
        if let RecordEffect::Set(record_status) = transition.effect.records {
            for id in &invoice.work_record_ids {
                match state.work_records.get_mut(id) {
                    Some(record) => record.invoice_status = record_status,
                    None => missing_records.push(id.clone()),
                }
            }
        }

        Ok(TransitionOutcome {
            invoice: invoice.clone(),
            missing_records,
        })
    }

    fn delete_invoice(&self, invoice_id: Uuid, deletable: &[InvoiceStatus]) -> EngineResult<Invoice> {
        let mut state = self.write()?;

        let status = state
            .invoices
            .get(&invoice_id)
            .map(|invoice| invoice.status)
            .ok_or(EngineError::InvoiceNotFound { invoice_id })?;

        if !deletable.contains(&status) {
            return Err(EngineError::InvoiceNotDeletable { status });
        }

        let invoice = state
            .invoices
            .remove(&invoice_id)
            .ok_or(EngineError::InvoiceNotFound { invoice_id })?;

        for id in &invoice.work_record_ids {
            if let Some(record) = state.work_records.get_mut(id) {
                record.detach_from_invoice();
            }
        }

        Ok(invoice)
    }
}
