//! Invoice generation and billing-rate resolution for staffing agencies.
//!
//! This crate prices approved work records for an agency at a care facility
//! over a billing period, freezes the result onto invoices, and drives those
//! invoices through a status lifecycle that keeps the work records' billing
//! status in step.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod invoicing;
pub mod lifecycle;
pub mod models;
pub mod outbound;
pub mod store;
