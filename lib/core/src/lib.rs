//! Core domain types and utilities for the hillcrest client.
//!
//! This crate provides the foundational ID types and error handling shared
//! by the hillcrest property-management client crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{AgreementId, AnnouncementId, ApartmentId, PaymentId, ProviderUid};
