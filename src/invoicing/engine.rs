//! The invoice engine: preview, creation, status transitions and deletion.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{
    calculate_hours, classify_bucket, classify_day, facility_candidates, normalize_role,
    resolve_rate, HolidaySet, RateQuery, SummaryAggregator,
};
use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::lifecycle::{self, NotifyParty, Transition};
use crate::models::{
    summary_total, CalculationResult, FacilityKind, FacilitySnapshot, Invoice, InvoiceStatus,
    RecordBreakdown, ShiftPattern, SkipReason, SkippedRecord, WorkRecord,
};
use crate::outbound::{Notification, Notifier, PdfJobQueue, PdfJobRequest, Recipient};
use crate::store::{BillableRecordQuery, BillingStore, OrgDirectory};

use super::number::InvoiceNumberGenerator;
use super::request::{CreateInvoiceRequest, DeleteOutcome, PreviewRequest};

/// Statuses in which an invoice is removed outright.
const DELETABLE: [InvoiceStatus; 4] = [
    InvoiceStatus::Cancelled,
    InvoiceStatus::Pending,
    InvoiceStatus::Rejected,
    InvoiceStatus::Invalidated,
];

/// Statuses in which deletion cancels the invoice instead.
const CANCEL_ON_DELETE: [InvoiceStatus; 2] = [InvoiceStatus::Paid, InvoiceStatus::Accepted];

/// Computes invoice previews and drives invoices through their lifecycle.
///
/// The engine holds no state of its own besides its collaborators, so one
/// instance is shared behind an `Arc` by every request.
pub struct InvoiceEngine {
    store: Arc<dyn BillingStore>,
    directory: Arc<dyn OrgDirectory>,
    notifier: Arc<dyn Notifier>,
    pdf_queue: Arc<dyn PdfJobQueue>,
    numbers: InvoiceNumberGenerator,
    number_attempts: u32,
}

impl InvoiceEngine {
    /// Creates an engine over its collaborators.
    pub fn new(
        store: Arc<dyn BillingStore>,
        directory: Arc<dyn OrgDirectory>,
        notifier: Arc<dyn Notifier>,
        pdf_queue: Arc<dyn PdfJobQueue>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            pdf_queue,
            numbers: InvoiceNumberGenerator::new(settings.invoice_number_prefix.clone()),
            number_attempts: settings.invoice_number_attempts.max(1),
        }
    }

    /// Replaces the invoice number generator.
    pub fn with_number_generator(mut self, numbers: InvoiceNumberGenerator) -> Self {
        self.numbers = numbers;
        self
    }

    /// Prices the billable work records of an agency at a facility over a
    /// date range. Nothing is persisted.
    ///
    /// Records that cannot be priced are left out of the summary and total
    /// and listed in [`CalculationResult::skipped`] with the reason.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] for empty ids, a reversed date range or
    ///   unparseable holidays
    /// - [`EngineError::AgencyNotFound`] / [`EngineError::FacilityNotFound`]
    /// - [`EngineError::StoreUnavailable`]
    pub fn preview_invoice(&self, request: &PreviewRequest) -> EngineResult<CalculationResult> {
        let start_time = Instant::now();

        require_id("agency_id", &request.agency_id)?;
        require_id("facility_id", &request.facility_id)?;
        require_date_range(request.start_date, request.end_date)?;
        let holidays = HolidaySet::parse(&request.holidays)?;

        self.resolve_agency(&request.agency_id)?;
        let facility = self.resolve_facility(&request.facility_id)?;

        let records = self.store.billable_records(&BillableRecordQuery {
            agency_id: &request.agency_id,
            facility_id: &request.facility_id,
            start_date: request.start_date,
            end_date: request.end_date,
        })?;

        let mut patterns: HashMap<String, Option<ShiftPattern>> = HashMap::new();
        let mut aggregator = SummaryAggregator::new();
        let mut breakdowns = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();

        for record in &records {
            let Some(shift) = self.store.shift(&record.shift_id)? else {
                skip(&mut skipped, record, SkipReason::ShiftNotFound);
                continue;
            };

            if !patterns.contains_key(&shift.shift_pattern_id) {
                let pattern = self.store.shift_pattern(&shift.shift_pattern_id)?;
                patterns.insert(shift.shift_pattern_id.clone(), pattern);
            }
            let Some(Some(pattern)) = patterns.get(&shift.shift_pattern_id) else {
                skip(&mut skipped, record, SkipReason::ShiftPatternNotFound);
                continue;
            };

            let candidates = facility_candidates(&request.facility_id, facility.kind, &shift);
            let Some(timing) = pattern.timing_for(&candidates) else {
                skip(&mut skipped, record, SkipReason::TimingNotFound);
                continue;
            };

            let day = classify_day(shift.date, &holidays);
            let role = normalize_role(&record.worker_role);
            let query = RateQuery {
                role: &role,
                facility_candidates: &candidates,
                day,
                is_emergency: shift.is_emergency,
            };
            let Some(rate) = resolve_rate(pattern, &query) else {
                skip(&mut skipped, record, SkipReason::RateUnresolved);
                continue;
            };

            let hours = calculate_hours(timing);
            let Some(amount) = aggregator.add(&pattern.name, &rate, &hours, day, shift.is_emergency)
            else {
                skip(&mut skipped, record, SkipReason::AmountOverflow);
                continue;
            };

            breakdowns.push(RecordBreakdown {
                work_record_id: record.id.clone(),
                shift_id: shift.id.clone(),
                date: shift.date,
                shift_type: pattern.name.clone(),
                role,
                is_weekend: day.is_weekend,
                is_holiday: day.is_holiday,
                is_emergency: shift.is_emergency,
                bucket: classify_bucket(day, shift.is_emergency),
                rate_source: rate.source,
                rate_field: rate.field,
                hourly_rate: rate.rate,
                duration_hours: hours.duration_hours,
                break_hours: hours.break_hours,
                billable_hours: hours.billable_hours,
                amount,
            });
        }

        let (summary, total_amount) = aggregator.finish();
        let work_record_ids = breakdowns.iter().map(|b| b.work_record_id.clone()).collect();
        let duration_us = start_time.elapsed().as_micros() as u64;

        info!(
            agency_id = %request.agency_id,
            facility_id = %request.facility_id,
            records_count = breakdowns.len(),
            skipped_count = skipped.len(),
            total_amount = %total_amount,
            duration_us,
            "Invoice preview completed"
        );

        Ok(CalculationResult {
            calculation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            agency_id: request.agency_id.clone(),
            facility,
            start_date: request.start_date,
            end_date: request.end_date,
            records: breakdowns,
            skipped,
            summary,
            total_amount,
            work_record_ids,
            duration_us,
        })
    }

    /// Creates a `pending` invoice with the given summary frozen onto it and
    /// moves its work records to `pending_invoice`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] for empty or duplicate ids, a reversed
    ///   date range, a negative total, bucket totals that overflow, a total
    ///   that disagrees with the summary, or a work record that is not
    ///   billable for this agency, facility and period
    /// - [`EngineError::AgencyNotFound`] / [`EngineError::FacilityNotFound`] /
    ///   [`EngineError::WorkRecordNotFound`]
    /// - [`EngineError::DuplicateInvoiceReference`] if a record is already on
    ///   an invoice
    /// - [`EngineError::DuplicateInvoiceNumber`] if every generated number was
    ///   taken
    pub fn create_invoice(&self, request: CreateInvoiceRequest) -> EngineResult<Invoice> {
        require_id("agency_id", &request.agency_id)?;
        require_id("facility_id", &request.facility_id)?;
        require_date_range(request.start_date, request.end_date)?;
        require_record_ids(&request.work_record_ids)?;
        let expected_total = summary_total(&request.summary)
            .ok_or_else(|| EngineError::validation("summary", "bucket totals overflow"))?;
        require_total(request.total_amount, expected_total)?;

        self.resolve_agency(&request.agency_id)?;
        let facility = self.resolve_facility(&request.facility_id)?;

        for id in &request.work_record_ids {
            if self.store.work_record(id)?.is_none() {
                return Err(EngineError::WorkRecordNotFound {
                    work_record_id: id.clone(),
                });
            }
        }

        let now = Utc::now();
        let mut invoice = Invoice {
            id: Uuid::new_v4(),
            invoice_number: String::new(),
            agency_id: request.agency_id,
            facility_id: request.facility_id,
            facility,
            start_date: request.start_date,
            end_date: request.end_date,
            total_amount: request.total_amount,
            work_record_ids: request.work_record_ids,
            shift_summary: request.summary,
            status: InvoiceStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            invoice.invoice_number = self.numbers.next(now);

            match self.store.insert_invoice(invoice.clone()) {
                Ok(created) => {
                    info!(
                        invoice_id = %created.id,
                        invoice_number = %created.invoice_number,
                        agency_id = %created.agency_id,
                        facility_id = %created.facility_id,
                        records_count = created.work_record_ids.len(),
                        total_amount = %created.total_amount,
                        "Invoice created"
                    );
                    return Ok(created);
                }
                Err(EngineError::DuplicateInvoiceNumber { invoice_number })
                    if attempt < self.number_attempts =>
                {
                    debug!(
                        invoice_number = %invoice_number,
                        attempt,
                        "Invoice number taken, drawing another"
                    );
                }
                Err(err) => {
                    warn!(
                        agency_id = %invoice.agency_id,
                        facility_id = %invoice.facility_id,
                        error = %err,
                        "Invoice creation failed"
                    );
                    return Err(err);
                }
            }
        }
    }

    /// Moves an invoice to `requested`, applying the transition's record
    /// effect in the same store write and dispatching its notification
    /// afterwards.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvoiceNotFound`]
    /// - [`EngineError::InvalidTransition`] if the pair is not allowed or the
    ///   invoice changed status concurrently
    /// - [`EngineError::PartialFailure`] if the status was written but some
    ///   referenced work records no longer exist
    pub fn transition_invoice_status(
        &self,
        invoice_id: Uuid,
        requested: InvoiceStatus,
    ) -> EngineResult<Invoice> {
        let current = self.get_invoice(invoice_id)?;

        let transition = lifecycle::transition(current.status, requested).inspect_err(|err| {
            warn!(invoice_id = %invoice_id, error = %err, "Status transition rejected");
        })?;

        let outcome = self
            .store
            .apply_transition(invoice_id, &transition, Utc::now())?;

        self.dispatch_notification(&transition, &outcome.invoice);

        if !outcome.missing_records.is_empty() {
            warn!(
                invoice_id = %invoice_id,
                status = %requested,
                missing_records = ?outcome.missing_records,
                "Invoice status written but work records were not updated"
            );
            return Err(EngineError::PartialFailure {
                invoice_id,
                status: requested,
                missing_records: outcome.missing_records,
            });
        }

        info!(
            invoice_id = %invoice_id,
            from = %transition.from,
            to = %transition.to,
            "Invoice status changed"
        );

        Ok(outcome.invoice)
    }

    /// Deletes an invoice, or cancels it when it has been accepted or paid.
    ///
    /// Invoices in `cancelled`, `pending`, `rejected` or `invalidated` are
    /// removed and their work records released. `paid` and `accepted`
    /// invoices go through the `cancelled` transition instead.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvoiceNotFound`]
    /// - [`EngineError::InvoiceNotDeletable`] for `draft`, `sent` and
    ///   `partially_paid`
    pub fn delete_invoice(&self, invoice_id: Uuid) -> EngineResult<DeleteOutcome> {
        let invoice = self.get_invoice(invoice_id)?;

        if CANCEL_ON_DELETE.contains(&invoice.status) {
            let cancelled = self.transition_invoice_status(invoice_id, InvoiceStatus::Cancelled)?;
            info!(invoice_id = %invoice_id, "Invoice cancelled instead of deleted");
            return Ok(DeleteOutcome::Cancelled { invoice: cancelled });
        }

        if !DELETABLE.contains(&invoice.status) {
            return Err(EngineError::InvoiceNotDeletable {
                status: invoice.status,
            });
        }

        let removed = self.store.delete_invoice(invoice_id, &DELETABLE)?;
        info!(
            invoice_id = %invoice_id,
            invoice_number = %removed.invoice_number,
            released_records = removed.work_record_ids.len(),
            "Invoice deleted"
        );

        Ok(DeleteOutcome::Deleted)
    }

    /// Returns a stored invoice with its frozen summary.
    pub fn get_invoice(&self, invoice_id: Uuid) -> EngineResult<Invoice> {
        self.store
            .invoice(invoice_id)?
            .ok_or(EngineError::InvoiceNotFound { invoice_id })
    }

    /// Enqueues PDF generation for an invoice and returns the job id without
    /// waiting for the PDF.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] if `requested_by` is empty
    /// - [`EngineError::InvoiceNotFound`]
    /// - [`EngineError::QueueUnavailable`] if the job could not be enqueued
    pub fn request_pdf(
        &self,
        invoice_id: Uuid,
        include_detailed: bool,
        requested_by: &str,
    ) -> EngineResult<Uuid> {
        require_id("requested_by", requested_by)?;
        self.get_invoice(invoice_id)?;

        let job = PdfJobRequest {
            job_id: Uuid::new_v4(),
            invoice_id,
            include_detailed,
            requested_by: requested_by.to_string(),
            requested_at: Utc::now(),
        };
        let job_id = job.job_id;

        self.pdf_queue
            .enqueue(job)
            .map_err(|err| EngineError::QueueUnavailable {
                message: err.to_string(),
            })?;

        info!(invoice_id = %invoice_id, job_id = %job_id, include_detailed, "PDF job enqueued");
        Ok(job_id)
    }

    fn resolve_agency(&self, agency_id: &str) -> EngineResult<()> {
        match self.directory.agency(agency_id)? {
            Some(_) => Ok(()),
            None => Err(EngineError::AgencyNotFound {
                agency_id: agency_id.to_string(),
            }),
        }
    }

    /// Looks in the permanent collection first, then the temporary one.
    fn resolve_facility(&self, facility_id: &str) -> EngineResult<FacilitySnapshot> {
        if let Some(details) = self.directory.facility(facility_id)? {
            return Ok(FacilitySnapshot {
                kind: FacilityKind::Permanent,
                details,
            });
        }
        if let Some(details) = self.directory.temporary_facility(facility_id)? {
            return Ok(FacilitySnapshot {
                kind: FacilityKind::Temporary,
                details,
            });
        }
        Err(EngineError::FacilityNotFound {
            facility_id: facility_id.to_string(),
        })
    }

    /// Fire-and-forget: failures are logged and never returned.
    fn dispatch_notification(&self, transition: &Transition, invoice: &Invoice) {
        let Some((party, kind)) = transition.effect.notify else {
            return;
        };

        let recipient = match party {
            NotifyParty::Agency => match self.directory.agency(&invoice.agency_id) {
                Ok(Some(agency)) => Recipient {
                    party,
                    id: agency.id,
                    name: agency.name,
                    email: agency.email,
                },
                Ok(None) => {
                    warn!(
                        invoice_id = %invoice.id,
                        agency_id = %invoice.agency_id,
                        "Notification skipped, agency not found"
                    );
                    return;
                }
                Err(err) => {
                    warn!(invoice_id = %invoice.id, error = %err, "Notification skipped");
                    return;
                }
            },
            NotifyParty::Facility => Recipient {
                party,
                id: invoice.facility.details.id.clone(),
                name: invoice.facility.details.name.clone(),
                email: invoice.facility.details.email.clone(),
            },
        };

        let notification = Notification {
            kind,
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            status: invoice.status,
            recipient,
        };

        if let Err(err) = self.notifier.notify(notification) {
            warn!(
                invoice_id = %invoice.id,
                kind = ?kind,
                error = %err,
                "Notification dispatch failed"
            );
        }
    }
}

fn skip(skipped: &mut Vec<SkippedRecord>, record: &WorkRecord, reason: SkipReason) {
    warn!(
        work_record_id = %record.id,
        shift_id = %record.shift_id,
        role = %record.worker_role,
        reason = ?reason,
        "Work record left out of invoice"
    );
    skipped.push(SkippedRecord {
        work_record_id: record.id.clone(),
        reason,
    });
}

fn require_id(field: &str, value: &str) -> EngineResult<()> {
    if value.trim().is_empty() {
        return Err(EngineError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn require_date_range(start_date: NaiveDate, end_date: NaiveDate) -> EngineResult<()> {
    if start_date > end_date {
        return Err(EngineError::validation(
            "end_date",
            format!("{} is before start date {}", end_date, start_date),
        ));
    }
    Ok(())
}

fn require_record_ids(ids: &[String]) -> EngineResult<()> {
    if ids.is_empty() {
        return Err(EngineError::validation(
            "work_record_ids",
            "at least one work record is required",
        ));
    }
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        require_id("work_record_ids", id)?;
        if !seen.insert(id.as_str()) {
            return Err(EngineError::validation(
                "work_record_ids",
                format!("duplicate work record id '{}'", id),
            ));
        }
    }
    Ok(())
}

fn require_total(total_amount: Decimal, summary_total: Decimal) -> EngineResult<()> {
    if total_amount < Decimal::ZERO {
        return Err(EngineError::validation("total_amount", "must not be negative"));
    }
    if total_amount != summary_total {
        return Err(EngineError::validation(
            "total_amount",
            format!(
                "{} does not match the summary total {}",
                total_amount, summary_total
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::NotificationKind;
    use crate::models::{
        FacilityTiming, Organization, RateEntry, RateField, RateSource, RecordInvoiceStatus,
        Shift, ShiftSummary, ShiftSummaryBucket, Timing, WorkRecordStatus,
    };
    use crate::outbound::{ChannelPdfQueue, OutboxNotifier};
    use crate::store::MemoryStore;
    use chrono::NaiveTime;
    use std::str::FromStr;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn org(id: &str, name: &str) -> Organization {
        Organization {
            id: id.to_string(),
            name: name.to_string(),
            email: Some(format!("{}@example.com", id)),
            phone: None,
            address: None,
        }
    }

    fn rate_entry(facility_id: Option<&str>, role: &str, weekday: &str, weekend: &str) -> RateEntry {
        RateEntry {
            facility_id: facility_id.map(str::to_string),
            user_type: role.to_string(),
            weekday_rate: dec(weekday),
            weekend_rate: dec(weekend),
            holiday_rate: Some(dec("40.00")),
            emergency_weekday_rate: Some(dec("35.00")),
            emergency_weekend_rate: None,
            emergency_holiday_rate: None,
        }
    }

    fn night_pattern() -> ShiftPattern {
        ShiftPattern {
            id: "night".to_string(),
            name: "Night".to_string(),
            timings: vec![FacilityTiming {
                facility_id: "fac_001".to_string(),
                timing: Timing {
                    start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                    billable_hours: None,
                    break_hours: Some(dec("0.5")),
                },
            }],
            rates: vec![rate_entry(Some("fac_001"), "senior carer", "30.00", "36.00")],
            user_type_rates: vec![rate_entry(None, "nurse", "20.00", "25.00")],
        }
    }

    fn shift(id: &str, day: u32, is_emergency: bool) -> Shift {
        Shift {
            id: id.to_string(),
            date: date(day),
            is_emergency,
            shift_pattern_id: "night".to_string(),
            home_id: Some("fac_001".to_string()),
            temporary_home_id: None,
        }
    }

    fn record(id: &str, shift_id: &str, role: &str) -> WorkRecord {
        WorkRecord {
            id: id.to_string(),
            shift_id: shift_id.to_string(),
            worker_id: format!("worker_{}", id),
            worker_role: role.to_string(),
            agency_id: "agency_001".to_string(),
            status: WorkRecordStatus::Approved,
            invoice_status: RecordInvoiceStatus::None,
            invoice_id: None,
            invoice_number: None,
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        engine: InvoiceEngine,
        outbox: UnboundedReceiver<Notification>,
        pdf_jobs: UnboundedReceiver<PdfJobRequest>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        store.insert_agency(org("agency_001", "CareForce")).unwrap();
        store.insert_facility(org("fac_001", "Harbour View")).unwrap();
        store.insert_shift_pattern(night_pattern()).unwrap();

        // 2026-01-12 Monday, 2026-01-17 Saturday
        store.insert_shift(shift("s_mon", 12, false)).unwrap();
        store.insert_shift(shift("s_sat", 17, false)).unwrap();
        store.insert_shift(shift("s_emg", 13, true)).unwrap();
        store.insert_work_record(record("wr_1", "s_mon", "Senior_Carer")).unwrap();
        store.insert_work_record(record("wr_2", "s_sat", "nurse")).unwrap();
        store.insert_work_record(record("wr_3", "s_emg", "nurse")).unwrap();
        store.insert_work_record(record("wr_4", "s_mon", "cook")).unwrap();

        let (notifier, outbox) = OutboxNotifier::channel();
        let (pdf_queue, pdf_jobs) = ChannelPdfQueue::channel();
        let engine = InvoiceEngine::new(
            store.clone(),
            store.clone(),
            Arc::new(notifier),
            Arc::new(pdf_queue),
            &EngineSettings::default(),
        );

        Harness {
            store,
            engine,
            outbox,
            pdf_jobs,
        }
    }

    fn preview_request() -> PreviewRequest {
        PreviewRequest {
            agency_id: "agency_001".to_string(),
            facility_id: "fac_001".to_string(),
            start_date: date(1),
            end_date: date(31),
            holidays: vec![],
        }
    }

    fn create_from_preview(h: &Harness) -> Invoice {
        let preview = h.engine.preview_invoice(&preview_request()).unwrap();
        h.engine
            .create_invoice(CreateInvoiceRequest {
                agency_id: preview.agency_id,
                facility_id: preview.facility.details.id,
                start_date: preview.start_date,
                end_date: preview.end_date,
                work_record_ids: preview.work_record_ids,
                total_amount: preview.total_amount,
                summary: preview.summary,
            })
            .unwrap()
    }

    #[test]
    fn test_preview_prices_and_skips() {
        let h = harness();
        let result = h.engine.preview_invoice(&preview_request()).unwrap();

        // Ordered by shift date: wr_1 (12th), wr_4 (12th), wr_3 (13th), wr_2 (17th)
        assert_eq!(result.work_record_ids, vec!["wr_1", "wr_3", "wr_2"]);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].work_record_id, "wr_4");
        assert_eq!(result.skipped[0].reason, SkipReason::RateUnresolved);

        let senior = &result.records[0];
        assert_eq!(senior.role, "senior carer");
        assert_eq!(senior.rate_source, RateSource::FacilityRate);
        assert_eq!(senior.hourly_rate, dec("30.00"));
        assert_eq!(senior.duration_hours, Some(dec("8")));
        assert_eq!(senior.billable_hours, dec("7.5"));
        assert_eq!(senior.amount, dec("225.00"));

        let emergency = &result.records[1];
        assert_eq!(emergency.rate_field, RateField::EmergencyWeekday);
        assert_eq!(emergency.amount, dec("262.50"));

        let weekend = &result.records[2];
        assert!(weekend.is_weekend);
        assert_eq!(weekend.rate_source, RateSource::UserTypeRate);
        assert_eq!(weekend.amount, dec("187.50"));

        assert_eq!(result.total_amount, dec("675.00"));
        assert_eq!(summary_total(&result.summary), Some(result.total_amount));
        assert_eq!(result.summary["Night"].count, 3);
    }

    #[test]
    fn test_preview_holiday_wins_over_emergency() {
        let h = harness();
        let mut request = preview_request();
        request.holidays = vec!["2026-01-13".to_string()];

        let result = h.engine.preview_invoice(&request).unwrap();
        let emergency = result
            .records
            .iter()
            .find(|r| r.work_record_id == "wr_3")
            .unwrap();

        assert_eq!(emergency.rate_field, RateField::Holiday);
        assert_eq!(emergency.hourly_rate, dec("40.00"));
        assert_eq!(result.summary["Night"].holiday_hours, dec("7.5"));
        assert_eq!(result.summary["Night"].emergency_hours, Decimal::ZERO);
    }

    #[test]
    fn test_preview_skips_missing_timing() {
        let h = harness();
        let mut other = night_pattern();
        other.id = "day".to_string();
        other.name = "Day".to_string();
        other.timings.clear();
        h.store.insert_shift_pattern(other).unwrap();

        let mut day_shift = shift("s_day", 14, false);
        day_shift.shift_pattern_id = "day".to_string();
        h.store.insert_shift(day_shift).unwrap();
        h.store.insert_work_record(record("wr_5", "s_day", "nurse")).unwrap();

        let mut lost = shift("s_lost", 15, false);
        lost.shift_pattern_id = "gone".to_string();
        h.store.insert_shift(lost).unwrap();
        h.store.insert_work_record(record("wr_6", "s_lost", "nurse")).unwrap();

        let result = h.engine.preview_invoice(&preview_request()).unwrap();
        let reasons: Vec<(&str, SkipReason)> = result
            .skipped
            .iter()
            .map(|s| (s.work_record_id.as_str(), s.reason))
            .collect();

        assert!(reasons.contains(&("wr_5", SkipReason::TimingNotFound)));
        assert!(reasons.contains(&("wr_6", SkipReason::ShiftPatternNotFound)));
    }

    #[test]
    fn test_preview_skips_overflowing_amount() {
        let h = harness();
        let mut huge = night_pattern();
        huge.id = "huge".to_string();
        huge.name = "Huge".to_string();
        huge.user_type_rates = vec![rate_entry(None, "nurse", "1", "1")];
        huge.user_type_rates[0].weekday_rate = Decimal::MAX;
        h.store.insert_shift_pattern(huge).unwrap();

        let mut huge_shift = shift("s_huge", 14, false);
        huge_shift.shift_pattern_id = "huge".to_string();
        h.store.insert_shift(huge_shift).unwrap();
        h.store.insert_work_record(record("wr_7", "s_huge", "nurse")).unwrap();

        let result = h.engine.preview_invoice(&preview_request()).unwrap();

        assert!(result
            .skipped
            .iter()
            .any(|s| s.work_record_id == "wr_7" && s.reason == SkipReason::AmountOverflow));
        assert!(!result.summary.contains_key("Huge"));
        assert_eq!(result.total_amount, dec("675.00"));
    }

    #[test]
    fn test_create_invoice_rejects_overflowing_summary() {
        let h = harness();
        let bucket = ShiftSummaryBucket {
            count: 1,
            total_amount: Decimal::MAX,
            ..Default::default()
        };
        let mut summary = ShiftSummary::new();
        summary.insert("Day".to_string(), bucket.clone());
        summary.insert("Night".to_string(), bucket);

        let result = h.engine.create_invoice(CreateInvoiceRequest {
            agency_id: "agency_001".to_string(),
            facility_id: "fac_001".to_string(),
            start_date: date(1),
            end_date: date(31),
            work_record_ids: vec!["wr_1".to_string()],
            total_amount: Decimal::MAX,
            summary,
        });

        assert!(matches!(
            result,
            Err(EngineError::Validation { field, .. }) if field == "summary"
        ));
        assert_eq!(
            h.store.work_record("wr_1").unwrap().unwrap().invoice_status,
            RecordInvoiceStatus::None
        );
    }

    #[test]
    fn test_create_invoice_rejects_record_that_is_not_billable_here() {
        let h = harness();
        let mut other_agency = record("wr_8", "s_mon", "nurse");
        other_agency.agency_id = "agency_002".to_string();
        h.store.insert_work_record(other_agency).unwrap();

        let result = h.engine.create_invoice(CreateInvoiceRequest {
            agency_id: "agency_001".to_string(),
            facility_id: "fac_001".to_string(),
            start_date: date(1),
            end_date: date(31),
            work_record_ids: vec!["wr_1".to_string(), "wr_8".to_string()],
            total_amount: Decimal::ZERO,
            summary: ShiftSummary::new(),
        });

        match result {
            Err(EngineError::Validation { field, message }) => {
                assert_eq!(field, "work_record_ids");
                assert!(message.contains("wr_8"));
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
        // Nothing was stamped
        assert_eq!(
            h.store.work_record("wr_1").unwrap().unwrap().invoice_status,
            RecordInvoiceStatus::None
        );
    }

    #[test]
    fn test_preview_validation() {
        let h = harness();

        let mut reversed = preview_request();
        reversed.start_date = date(20);
        reversed.end_date = date(10);
        assert!(matches!(
            h.engine.preview_invoice(&reversed),
            Err(EngineError::Validation { field, .. }) if field == "end_date"
        ));

        let mut bad_holiday = preview_request();
        bad_holiday.holidays = vec!["next tuesday".to_string()];
        assert!(matches!(
            h.engine.preview_invoice(&bad_holiday),
            Err(EngineError::Validation { .. })
        ));

        let mut unknown_agency = preview_request();
        unknown_agency.agency_id = "agency_404".to_string();
        assert!(matches!(
            h.engine.preview_invoice(&unknown_agency),
            Err(EngineError::AgencyNotFound { .. })
        ));

        let mut unknown_facility = preview_request();
        unknown_facility.facility_id = "fac_404".to_string();
        assert!(matches!(
            h.engine.preview_invoice(&unknown_facility),
            Err(EngineError::FacilityNotFound { .. })
        ));
    }

    #[test]
    fn test_create_invoice_freezes_summary() {
        let h = harness();
        let invoice = create_from_preview(&h);

        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.total_amount, dec("675.00"));
        assert!(invoice.invoice_number.starts_with("INV-"));
        assert_eq!(invoice.facility.details.name, "Harbour View");

        // Changing live rates does not affect the stored invoice
        let mut repriced = night_pattern();
        repriced.user_type_rates[0].weekend_rate = dec("99.00");
        h.store.insert_shift_pattern(repriced).unwrap();
        let stored = h.engine.get_invoice(invoice.id).unwrap();
        assert_eq!(stored.shift_summary, invoice.shift_summary);

        let stamped = h.store.work_record("wr_2").unwrap().unwrap();
        assert_eq!(stamped.invoice_status, RecordInvoiceStatus::PendingInvoice);
        assert_eq!(stamped.invoice_number, Some(invoice.invoice_number));
    }

    #[test]
    fn test_create_invoice_validation() {
        let h = harness();
        let preview = h.engine.preview_invoice(&preview_request()).unwrap();
        let base = CreateInvoiceRequest {
            agency_id: preview.agency_id.clone(),
            facility_id: "fac_001".to_string(),
            start_date: preview.start_date,
            end_date: preview.end_date,
            work_record_ids: preview.work_record_ids.clone(),
            total_amount: preview.total_amount,
            summary: preview.summary.clone(),
        };

        let mut empty = base.clone();
        empty.work_record_ids.clear();
        assert!(matches!(
            h.engine.create_invoice(empty),
            Err(EngineError::Validation { field, .. }) if field == "work_record_ids"
        ));

        let mut duplicated = base.clone();
        duplicated.work_record_ids.push("wr_1".to_string());
        assert!(matches!(
            h.engine.create_invoice(duplicated),
            Err(EngineError::Validation { field, .. }) if field == "work_record_ids"
        ));

        let mut mismatched = base.clone();
        mismatched.total_amount = dec("1.00");
        assert!(matches!(
            h.engine.create_invoice(mismatched),
            Err(EngineError::Validation { field, .. }) if field == "total_amount"
        ));

        let mut unknown = base.clone();
        unknown.work_record_ids = vec!["wr_404".to_string()];
        unknown.total_amount = Decimal::ZERO;
        unknown.summary.clear();
        assert!(matches!(
            h.engine.create_invoice(unknown),
            Err(EngineError::WorkRecordNotFound { .. })
        ));
    }

    #[test]
    fn test_create_invoice_redraws_taken_number() {
        let h = harness();
        let first_draw = InvoiceNumberGenerator::with_seed("INV", 7).next(Utc::now());

        let engine = InvoiceEngine::new(
            h.store.clone(),
            h.store.clone(),
            Arc::new(OutboxNotifier::channel().0),
            Arc::new(ChannelPdfQueue::channel().0),
            &EngineSettings::default(),
        )
        .with_number_generator(InvoiceNumberGenerator::with_seed("INV", 7));

        // Occupy the number the seeded generator draws first
        let mut blocker = create_from_preview(&h);
        h.engine.delete_invoice(blocker.id).unwrap();
        blocker.invoice_number = first_draw.clone();
        blocker.work_record_ids = vec!["wr_1".to_string()];
        h.store.insert_invoice(blocker).unwrap();

        let created = engine
            .create_invoice(CreateInvoiceRequest {
                agency_id: "agency_001".to_string(),
                facility_id: "fac_001".to_string(),
                start_date: date(1),
                end_date: date(31),
                work_record_ids: vec!["wr_2".to_string()],
                total_amount: Decimal::ZERO,
                summary: Default::default(),
            })
            .unwrap();

        assert_ne!(created.invoice_number, first_draw);
    }

    #[test]
    fn test_accept_sets_records_invoiced_and_notifies_agency() {
        let mut h = harness();
        let invoice = create_from_preview(&h);

        let accepted = h
            .engine
            .transition_invoice_status(invoice.id, InvoiceStatus::Accepted)
            .unwrap();
        assert_eq!(accepted.status, InvoiceStatus::Accepted);

        for id in &invoice.work_record_ids {
            let record = h.store.work_record(id).unwrap().unwrap();
            assert_eq!(record.invoice_status, RecordInvoiceStatus::Invoiced);
        }

        let notification = h.outbox.try_recv().unwrap();
        assert_eq!(notification.kind, NotificationKind::InvoiceAccepted);
        assert_eq!(notification.recipient.party, NotifyParty::Agency);
        assert_eq!(notification.recipient.id, "agency_001");
    }

    #[test]
    fn test_reject_releases_records() {
        let mut h = harness();
        let invoice = create_from_preview(&h);

        h.engine
            .transition_invoice_status(invoice.id, InvoiceStatus::Rejected)
            .unwrap();

        let record = h.store.work_record("wr_1").unwrap().unwrap();
        assert_eq!(record.invoice_status, RecordInvoiceStatus::None);
        assert_eq!(
            h.outbox.try_recv().unwrap().kind,
            NotificationKind::InvoiceRejected
        );
    }

    #[test]
    fn test_invalid_transition_changes_nothing() {
        let mut h = harness();
        let invoice = create_from_preview(&h);

        let result = h
            .engine
            .transition_invoice_status(invoice.id, InvoiceStatus::Paid);
        assert!(matches!(
            result,
            Err(EngineError::InvalidTransition {
                current: InvoiceStatus::Pending,
                requested: InvoiceStatus::Paid,
            })
        ));
        assert_eq!(
            h.engine.get_invoice(invoice.id).unwrap().status,
            InvoiceStatus::Pending
        );
        assert!(h.outbox.try_recv().is_err());
    }

    #[test]
    fn test_transition_with_missing_record_is_partial_failure() {
        let h = harness();
        let invoice = create_from_preview(&h);
        h.store.remove_work_record("wr_2").unwrap();

        let result = h
            .engine
            .transition_invoice_status(invoice.id, InvoiceStatus::Accepted);
        match result {
            Err(EngineError::PartialFailure {
                invoice_id,
                status,
                missing_records,
            }) => {
                assert_eq!(invoice_id, invoice.id);
                assert_eq!(status, InvoiceStatus::Accepted);
                assert_eq!(missing_records, vec!["wr_2"]);
            }
            other => panic!("Expected PartialFailure, got {:?}", other),
        }

        assert_eq!(
            h.engine.get_invoice(invoice.id).unwrap().status,
            InvoiceStatus::Accepted
        );
    }

    #[test]
    fn test_notification_failure_does_not_fail_transition() {
        let h = harness();
        let (notifier, outbox) = OutboxNotifier::channel();
        drop(outbox);
        let engine = InvoiceEngine::new(
            h.store.clone(),
            h.store.clone(),
            Arc::new(notifier),
            Arc::new(ChannelPdfQueue::channel().0),
            &EngineSettings::default(),
        );
        let invoice = create_from_preview(&h);

        let accepted = engine
            .transition_invoice_status(invoice.id, InvoiceStatus::Accepted)
            .unwrap();
        assert_eq!(accepted.status, InvoiceStatus::Accepted);
    }

    #[test]
    fn test_delete_pending_releases_records() {
        let h = harness();
        let invoice = create_from_preview(&h);

        assert_eq!(
            h.engine.delete_invoice(invoice.id).unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(matches!(
            h.engine.get_invoice(invoice.id),
            Err(EngineError::InvoiceNotFound { .. })
        ));

        let preview = h.engine.preview_invoice(&preview_request()).unwrap();
        assert_eq!(preview.work_record_ids.len(), 3);
    }

    #[test]
    fn test_delete_accepted_cancels() {
        let h = harness();
        let invoice = create_from_preview(&h);
        h.engine
            .transition_invoice_status(invoice.id, InvoiceStatus::Accepted)
            .unwrap();

        match h.engine.delete_invoice(invoice.id).unwrap() {
            DeleteOutcome::Cancelled { invoice: cancelled } => {
                assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
            }
            DeleteOutcome::Deleted => panic!("accepted invoice must not be removed"),
        }

        // Cancelled invoices are removable
        assert_eq!(
            h.engine.delete_invoice(invoice.id).unwrap(),
            DeleteOutcome::Deleted
        );
    }

    #[test]
    fn test_request_pdf_enqueues_job() {
        let mut h = harness();
        let invoice = create_from_preview(&h);

        let job_id = h.engine.request_pdf(invoice.id, true, "user_001").unwrap();
        let job = h.pdf_jobs.try_recv().unwrap();

        assert_eq!(job.job_id, job_id);
        assert_eq!(job.invoice_id, invoice.id);
        assert!(job.include_detailed);

        assert!(matches!(
            h.engine.request_pdf(Uuid::new_v4(), false, "user_001"),
            Err(EngineError::InvoiceNotFound { .. })
        ));
    }

    #[test]
    fn test_request_pdf_closed_queue() {
        let h = harness();
        let invoice = create_from_preview(&h);
        let (queue, jobs) = ChannelPdfQueue::channel();
        drop(jobs);
        let engine = InvoiceEngine::new(
            h.store.clone(),
            h.store.clone(),
            Arc::new(OutboxNotifier::channel().0),
            Arc::new(queue),
            &EngineSettings::default(),
        );

        assert!(matches!(
            engine.request_pdf(invoice.id, false, "user_001"),
            Err(EngineError::QueueUnavailable { .. })
        ));
    }
}
