//! Backend REST API client for Hillcrest.
//!
//! [`ApiClient`] covers the full backend surface: users and roles,
//! apartment listings, tenancy agreements, payments, coupons,
//! announcements, and the admin endpoints. [`payments::PaymentFlow`]
//! sequences a rent payment across the payment endpoints and the card
//! processor.

pub mod client;
pub mod error;
pub mod models;
pub mod payments;

pub use client::ApiClient;
pub use error::BackendError;
pub use models::{
    AdminSummary, Agreement, AgreementAction, AgreementDecision, AgreementRequest, Announcement,
    Apartment, ApartmentPage, Coupon, ListingSort, Member, NewAnnouncement, NewCoupon,
    PaymentIntent, PaymentRecord, UserProfile, UserUpsert, refine_listings,
};
pub use payments::{CardProcessor, PaymentError, PaymentFlow, PaymentLedger, PaymentRequest};
