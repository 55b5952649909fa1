//! Invoice number generation.
//!
//! Numbers look like `INV-2601-0427`: a prefix, the two-digit year and month
//! of creation in UTC, and four random digits. They are not guaranteed
//! unique; the store rejects a taken number and the engine draws again.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws invoice numbers from a shared random source.
#[derive(Debug)]
pub struct InvoiceNumberGenerator {
    prefix: String,
    rng: Mutex<StdRng>,
}

impl InvoiceNumberGenerator {
    /// Creates a generator seeded from the operating system.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a generator with a fixed seed, producing a repeatable sequence.
    pub fn with_seed(prefix: impl Into<String>, seed: u64) -> Self {
        Self {
            prefix: prefix.into(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draws the next number for an invoice created at `at`.
    ///
    /// # Example
    ///
    /// ```
    /// use invoice_engine::invoicing::InvoiceNumberGenerator;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let generator = InvoiceNumberGenerator::new("INV");
    /// let at = Utc.with_ymd_and_hms(2026, 1, 17, 9, 0, 0).unwrap();
    /// let number = generator.next(at);
    ///
    /// assert!(number.starts_with("INV-2601-"));
    /// assert_eq!(number.len(), "INV-2601-0000".len());
    /// ```
    pub fn next(&self, at: DateTime<Utc>) -> String {
        // A poisoned lock still holds a usable generator
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        format_invoice_number(&self.prefix, at, rng.gen_range(0..10_000))
    }
}

/// Formats an invoice number from its parts.
pub fn format_invoice_number(prefix: &str, at: DateTime<Utc>, sequence: u32) -> String {
    format!("{}-{}-{:04}", prefix, at.format("%y%m"), sequence)
}
