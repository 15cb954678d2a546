//! Wire models for the backend REST API.
//!
//! Field names follow the backend's JSON contract (camelCase, Mongo-style
//! `_id`). Decoders are tolerant where the backend is known to vary: the
//! apartment listing arrives either as `{apartments, totalPages}` or as a
//! bare array depending on whether pagination parameters were sent.

use chrono::{DateTime, Utc};
use hillcrest_access::Role;
use hillcrest_core::{AgreementId, AnnouncementId, ApartmentId, PaymentId};
use serde::{Deserialize, Serialize};

/// A rentable apartment listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apartment {
    #[serde(rename = "_id")]
    pub id: ApartmentId,
    #[serde(default)]
    pub image: Option<String>,
    pub block: String,
    pub number: String,
    pub floor: u32,
    pub rent: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of apartment listings.
#[derive(Debug, Clone, PartialEq)]
pub struct ApartmentPage {
    pub apartments: Vec<Apartment>,
    pub total_pages: u32,
}

/// The listing endpoint answers `{apartments, totalPages}` when paginated
/// and a bare array otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApartmentsWire {
    Paged {
        apartments: Vec<Apartment>,
        #[serde(rename = "totalPages", default = "one_page")]
        total_pages: u32,
    },
    Bare(Vec<Apartment>),
}

fn one_page() -> u32 {
    1
}

impl From<ApartmentsWire> for ApartmentPage {
    fn from(wire: ApartmentsWire) -> Self {
        match wire {
            ApartmentsWire::Paged {
                apartments,
                total_pages,
            } => Self {
                apartments,
                total_pages,
            },
            ApartmentsWire::Bare(apartments) => Self {
                apartments,
                total_pages: 1,
            },
        }
    }
}

/// Sort order for the apartment listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingSort {
    /// Newest first by creation time; listings without a timestamp sort last.
    #[default]
    Newest,
    RentLowToHigh,
    RentHighToLow,
}

/// Applies the listing page's client-side refinement: rent bounds, then
/// the selected sort order.
#[must_use]
pub fn refine_listings(
    mut listings: Vec<Apartment>,
    min_rent: Option<u64>,
    max_rent: Option<u64>,
    sort: ListingSort,
) -> Vec<Apartment> {
    if let Some(min) = min_rent {
        listings.retain(|a| a.rent >= min);
    }
    if let Some(max) = max_rent {
        listings.retain(|a| a.rent <= max);
    }
    match sort {
        ListingSort::Newest => {
            listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        ListingSort::RentLowToHigh => listings.sort_by_key(|a| a.rent),
        ListingSort::RentHighToLow => {
            listings.sort_by(|a, b| b.rent.cmp(&a.rent));
        }
    }
    listings
}

/// A tenancy agreement, as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    #[serde(rename = "_id")]
    pub id: AgreementId,
    pub apartment_id: ApartmentId,
    pub block: String,
    pub number: String,
    pub floor: u32,
    pub rent: u64,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default = "pending_status")]
    pub status: String,
    #[serde(default)]
    pub request_date: Option<DateTime<Utc>>,
}

fn pending_status() -> String {
    "pending".to_string()
}

impl Agreement {
    /// Whether this agreement is still awaiting an admin decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == "pending"
    }
}

/// Body for creating an agreement request from a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementRequest {
    pub apartment_id: ApartmentId,
    pub block: String,
    pub number: String,
    pub floor: u32,
    pub rent: u64,
}

impl AgreementRequest {
    /// Builds a request for the given listing.
    #[must_use]
    pub fn for_apartment(apartment: &Apartment) -> Self {
        Self {
            apartment_id: apartment.id.clone(),
            block: apartment.block.clone(),
            number: apartment.number.clone(),
            floor: apartment.floor,
            rent: apartment.rent,
        }
    }
}

/// An admin's verdict on a pending agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementAction {
    Accept,
    Reject,
}

/// Body for `PATCH /api/agreements/:id`.
///
/// Accepting promotes the requester to member; rejecting leaves them a
/// plain user. Either way the agreement is marked checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementDecision {
    pub action: AgreementAction,
    pub user_email: String,
    pub status: String,
    pub user_role: Role,
}

impl AgreementDecision {
    /// Builds the decision body, deriving the resulting role from the
    /// action.
    #[must_use]
    pub fn new(action: AgreementAction, user_email: String) -> Self {
        let user_role = match action {
            AgreementAction::Accept => Role::Member,
            AgreementAction::Reject => Role::User,
        };
        Self {
            action,
            user_email,
            status: "checked".to_string(),
            user_role,
        }
    }
}

/// Body for `POST /api/payments/create-payment-intent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    /// Amount to charge, in the smallest currency unit.
    pub amount: u64,
}

/// Response from the payment-intent endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
}

/// A rent payment record, both as posted after a successful charge and as
/// returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Backend record id; absent on the record being posted.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PaymentId>,
    pub user_name: String,
    pub user_email: String,
    pub floor: u32,
    pub block: String,
    pub number: String,
    pub rent: u64,
    pub month: String,
    pub discount: u32,
    pub status: String,
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// A discount coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    pub discount_percentage: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default = "coupon_active")]
    pub is_active: bool,
}

fn coupon_active() -> bool {
    true
}

/// Body for creating a coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCoupon {
    pub code: String,
    pub discount_percentage: u32,
    pub description: String,
}

/// A building-wide announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AnnouncementId>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body for posting an announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub description: String,
}

/// Occupancy and population statistics for the admin landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub total_rooms: u64,
    pub available_percentage: f64,
    pub rented_percentage: f64,
    pub total_users: u64,
    pub total_members: u64,
}

/// A member as listed on the manage-members page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub email: String,
}

/// The signed-in user's backend profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Body for `PUT /api/users`, used both at registration (with the default
/// role) and for later profile edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpsert {
    pub name: String,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl UserUpsert {
    /// The registration-time upsert: every account starts as a plain user.
    #[must_use]
    pub fn registration(name: String, email: String, photo_url: String) -> Self {
        Self {
            name,
            email,
            photo_url,
            role: Some(Role::User),
            phone: None,
            address: None,
        }
    }
}

/// Response from the role endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RoleResponse {
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, rent: u64, created_at: Option<&str>) -> Apartment {
        Apartment {
            id: ApartmentId::from(id),
            image: None,
            block: "A".to_string(),
            number: "A-101".to_string(),
            floor: 1,
            rent,
            created_at: created_at.map(|s| s.parse().expect("valid timestamp")),
        }
    }

    #[test]
    fn decodes_paged_listing_response() {
        let json = r#"{
            "apartments": [{
                "_id": "apt1",
                "block": "B",
                "number": "B-201",
                "floor": 2,
                "rent": 1200
            }],
            "totalPages": 4
        }"#;
        let page: ApartmentPage = serde_json::from_str::<ApartmentsWire>(json)
            .expect("deserialize")
            .into();
        assert_eq!(page.apartments.len(), 1);
        assert_eq!(page.apartments[0].rent, 1200);
        assert_eq!(page.total_pages, 4);
    }

    #[test]
    fn decodes_bare_array_listing_response() {
        let json = r#"[{
            "_id": "apt1",
            "block": "B",
            "number": "B-201",
            "floor": 2,
            "rent": 1200
        }]"#;
        let page: ApartmentPage = serde_json::from_str::<ApartmentsWire>(json)
            .expect("deserialize")
            .into();
        assert_eq!(page.apartments.len(), 1);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn refine_filters_rent_bounds() {
        let listings = vec![
            listing("a", 800, None),
            listing("b", 1200, None),
            listing("c", 2000, None),
        ];
        let refined = refine_listings(listings, Some(1000), Some(1500), ListingSort::Newest);
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].rent, 1200);
    }

    #[test]
    fn refine_sorts_by_rent() {
        let listings = vec![
            listing("a", 1200, None),
            listing("b", 800, None),
            listing("c", 2000, None),
        ];
        let low_first = refine_listings(listings.clone(), None, None, ListingSort::RentLowToHigh);
        let rents: Vec<u64> = low_first.iter().map(|a| a.rent).collect();
        assert_eq!(rents, vec![800, 1200, 2000]);

        let high_first = refine_listings(listings, None, None, ListingSort::RentHighToLow);
        let rents: Vec<u64> = high_first.iter().map(|a| a.rent).collect();
        assert_eq!(rents, vec![2000, 1200, 800]);
    }

    #[test]
    fn refine_sorts_newest_first_with_missing_timestamps_last() {
        let listings = vec![
            listing("a", 1000, None),
            listing("b", 1000, Some("2026-02-01T00:00:00Z")),
            listing("c", 1000, Some("2026-03-01T00:00:00Z")),
        ];
        let refined = refine_listings(listings, None, None, ListingSort::Newest);
        let ids: Vec<&str> = refined.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn accepting_an_agreement_promotes_to_member() {
        let decision =
            AgreementDecision::new(AgreementAction::Accept, "bob@example.com".to_string());
        assert_eq!(decision.user_role, Role::Member);
        assert_eq!(decision.status, "checked");

        let json = serde_json::to_value(&decision).expect("serialize");
        assert_eq!(json["action"], "accept");
        assert_eq!(json["userRole"], "member");
        assert_eq!(json["userEmail"], "bob@example.com");
    }

    #[test]
    fn rejecting_an_agreement_keeps_plain_user() {
        let decision =
            AgreementDecision::new(AgreementAction::Reject, "bob@example.com".to_string());
        assert_eq!(decision.user_role, Role::User);
    }

    #[test]
    fn coupon_without_active_flag_defaults_to_active() {
        let json = r#"{ "code": "SAVE10", "discountPercentage": 10 }"#;
        let coupon: Coupon = serde_json::from_str(json).expect("deserialize");
        assert!(coupon.is_active);
        assert_eq!(coupon.discount_percentage, 10);
    }

    #[test]
    fn registration_upsert_serializes_user_role() {
        let upsert = UserUpsert::registration(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "https://example.com/alice.png".to_string(),
        );
        let json = serde_json::to_value(&upsert).expect("serialize");
        assert_eq!(json["role"], "user");
        assert_eq!(json["photoURL"], "https://example.com/alice.png");
        assert!(json.get("phone").is_none());
    }

    #[test]
    fn payment_record_serializes_camel_case() {
        let record = PaymentRecord {
            id: None,
            user_name: "Bob".to_string(),
            user_email: "bob@example.com".to_string(),
            floor: 2,
            block: "B".to_string(),
            number: "B-201".to_string(),
            rent: 1200,
            month: "January".to_string(),
            discount: 10,
            status: "paid".to_string(),
            transaction_id: "pi_123".to_string(),
            paid_at: None,
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["userEmail"], "bob@example.com");
        assert_eq!(json["transactionId"], "pi_123");
        assert!(json.get("paidAt").is_none());
    }
}
