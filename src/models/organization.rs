//! Organization and facility snapshot models.
//!
//! Agencies and facilities are owned by the identity provider; the engine only
//! reads their display details and freezes them onto invoices.

use serde::{Deserialize, Serialize};

/// Display details of an agency or facility as provided by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email, used as notification recipient.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
}

/// Whether a facility is a verified organization or a temporary/unclaimed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityKind {
    /// Linked to a verified organization account.
    Permanent,
    /// Not yet linked to a verified organization account.
    Temporary,
}

/// Facility details frozen at the time a calculation or invoice was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitySnapshot {
    /// Which collection the facility was found in.
    pub kind: FacilityKind,
    /// The facility's details at snapshot time.
    #[serde(flatten)]
    pub details: Organization,
}
