//! HTTP client for the backend REST API.
//!
//! All authenticated calls take the bearer token as a parameter; the caller
//! fetches it per call so token refresh stays the session store's concern.
//! Errors come back as `Report<BackendError>` with HTTP 401 and 404 pinned
//! to their own variants, since callers branch on those.

use crate::error::BackendError;
use crate::models::{
    AdminSummary, Agreement, AgreementDecision, AgreementRequest, Announcement, Apartment,
    ApartmentPage, ApartmentsWire, Coupon, Member, NewAnnouncement, NewCoupon, PaymentIntent,
    PaymentIntentRequest, PaymentRecord, RoleResponse, UserProfile, UserUpsert,
};
use async_trait::async_trait;
use hillcrest_access::{RoleEndpoint, RoleEndpointError};
use hillcrest_core::{AgreementId, ApartmentId, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

/// Client for the building-management backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the given base URL. A trailing slash is
    /// tolerated.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_body<T: DeserializeOwned>(
        response: reqwest::Response,
        path: &str,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized.into());
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound {
                resource: path.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::RequestFailed {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(response
            .json()
            .await
            .map_err(|e| BackendError::Decode {
                details: e.to_string(),
            })?)
    }

    async fn check_status(response: reqwest::Response, path: &str) -> Result<(), BackendError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized.into());
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound {
                resource: path.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::RequestFailed {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<T, BackendError> {
        let mut request = self.http.get(self.endpoint(path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| BackendError::Network {
            details: e.to_string(),
        })?;
        Self::read_body(response, path).await
    }

    async fn send_body<B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        path: &str,
        bearer: &str,
        body: &B,
    ) -> Result<reqwest::Response, BackendError> {
        self.http
            .request(method, self.endpoint(path))
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                BackendError::Network {
                    details: e.to_string(),
                }
                .into()
            })
    }

    // --- users ---

    /// Upserts the signed-in user's backend profile.
    #[instrument(skip(self, bearer, upsert), fields(email = %upsert.email))]
    pub async fn upsert_user(&self, bearer: &str, upsert: &UserUpsert) -> Result<(), BackendError> {
        let response = self
            .send_body(reqwest::Method::PUT, "/api/users", bearer, upsert)
            .await?;
        Self::check_status(response, "/api/users").await
    }

    /// Fetches the signed-in user's backend profile.
    pub async fn current_user(&self, bearer: &str) -> Result<UserProfile, BackendError> {
        self.get_json("/api/users/me", Some(bearer)).await
    }

    // --- apartments ---

    /// Fetches one page of apartment listings. All parameters are optional;
    /// the backend answers a bare array when none are sent.
    #[instrument(skip(self))]
    pub async fn apartments(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
        min_rent: Option<u64>,
        max_rent: Option<u64>,
    ) -> Result<ApartmentPage, BackendError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(min) = min_rent {
            query.push(("minRent", min.to_string()));
        }
        if let Some(max) = max_rent {
            query.push(("maxRent", max.to_string()));
        }

        let response = self
            .http
            .get(self.endpoint("/api/apartments"))
            .query(&query)
            .send()
            .await
            .map_err(|e| BackendError::Network {
                details: e.to_string(),
            })?;
        let wire: ApartmentsWire = Self::read_body(response, "/api/apartments").await?;
        Ok(wire.into())
    }

    /// Fetches a single listing; `Ok(None)` when it does not exist.
    pub async fn apartment(&self, id: &ApartmentId) -> Result<Option<Apartment>, BackendError> {
        let path = format!("/api/apartments/{}", id.as_str());
        let response = self
            .http
            .get(self.endpoint(&path))
            .send()
            .await
            .map_err(|e| BackendError::Network {
                details: e.to_string(),
            })?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::read_body(response, &path).await?))
    }

    // --- agreements ---

    /// Submits an agreement request for a listing.
    #[instrument(skip(self, bearer, request), fields(apartment = %request.apartment_id))]
    pub async fn request_agreement(
        &self,
        bearer: &str,
        request: &AgreementRequest,
    ) -> Result<(), BackendError> {
        let response = self
            .send_body(reqwest::Method::POST, "/api/agreements", bearer, request)
            .await?;
        Self::check_status(response, "/api/agreements").await
    }

    /// Fetches the signed-in user's agreement; `Ok(None)` when they have
    /// none.
    pub async fn user_agreement(&self, bearer: &str) -> Result<Option<Agreement>, BackendError> {
        let response = self
            .http
            .get(self.endpoint("/api/agreements/user"))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| BackendError::Network {
                details: e.to_string(),
            })?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::read_body(response, "/api/agreements/user").await?))
    }

    /// Fetches agreement requests still awaiting a decision.
    pub async fn pending_agreements(&self, bearer: &str) -> Result<Vec<Agreement>, BackendError> {
        let all: Vec<Agreement> = self.get_json("/api/admin/agreements", Some(bearer)).await?;
        Ok(all.into_iter().filter(Agreement::is_pending).collect())
    }

    /// Records an admin decision on a pending agreement.
    #[instrument(skip(self, bearer, decision), fields(agreement = %id))]
    pub async fn decide_agreement(
        &self,
        bearer: &str,
        id: &AgreementId,
        decision: &AgreementDecision,
    ) -> Result<(), BackendError> {
        let path = format!("/api/agreements/{}", id.as_str());
        let response = self
            .send_body(reqwest::Method::PATCH, &path, bearer, decision)
            .await?;
        Self::check_status(response, &path).await
    }

    // --- payments ---

    /// Creates a payment intent for the given amount (smallest currency
    /// unit).
    #[instrument(skip(self, bearer))]
    pub async fn create_payment_intent(
        &self,
        bearer: &str,
        amount: u64,
    ) -> Result<PaymentIntent, BackendError> {
        let response = self
            .send_body(
                reqwest::Method::POST,
                "/api/payments/create-payment-intent",
                bearer,
                &PaymentIntentRequest { amount },
            )
            .await?;
        Self::read_body(response, "/api/payments/create-payment-intent").await
    }

    /// Saves a payment record after a successful charge.
    pub async fn record_payment(
        &self,
        bearer: &str,
        record: &PaymentRecord,
    ) -> Result<(), BackendError> {
        let response = self
            .send_body(reqwest::Method::POST, "/api/payments", bearer, record)
            .await?;
        Self::check_status(response, "/api/payments").await
    }

    /// Fetches the payment history for an email address.
    pub async fn user_payments(
        &self,
        bearer: &str,
        email: &str,
    ) -> Result<Vec<PaymentRecord>, BackendError> {
        let path = format!("/api/payments/user?email={}", encode_component(email));
        self.get_json(&path, Some(bearer)).await
    }

    /// Validates a coupon code during payment; `Ok(None)` when the code is
    /// unknown.
    pub async fn payment_coupon(
        &self,
        bearer: &str,
        code: &str,
    ) -> Result<Option<Coupon>, BackendError> {
        let path = format!("/api/payments/coupon/{}", encode_component(code));
        let response = self
            .http
            .get(self.endpoint(&path))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| BackendError::Network {
                details: e.to_string(),
            })?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::read_body(response, &path).await?))
    }

    // --- coupons ---

    /// Fetches the publicly visible active coupons.
    pub async fn active_coupons(&self) -> Result<Vec<Coupon>, BackendError> {
        self.get_json("/api/coupons/active", None).await
    }

    /// Fetches all coupons, active or not.
    pub async fn all_coupons(&self, bearer: &str) -> Result<Vec<Coupon>, BackendError> {
        self.get_json("/api/admin/coupons", Some(bearer)).await
    }

    /// Creates a coupon.
    #[instrument(skip(self, bearer, coupon), fields(code = %coupon.code))]
    pub async fn add_coupon(&self, bearer: &str, coupon: &NewCoupon) -> Result<(), BackendError> {
        let response = self
            .send_body(reqwest::Method::POST, "/api/admin/coupons", bearer, coupon)
            .await?;
        Self::check_status(response, "/api/admin/coupons").await
    }

    /// Flips a coupon between active and inactive.
    #[instrument(skip(self, bearer))]
    pub async fn toggle_coupon(&self, bearer: &str, code: &str) -> Result<(), BackendError> {
        let path = format!("/api/admin/coupons/{}/toggle", encode_component(code));
        let response = self
            .http
            .patch(self.endpoint(&path))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| BackendError::Network {
                details: e.to_string(),
            })?;
        Self::check_status(response, &path).await
    }

    // --- announcements ---

    /// Fetches all announcements, newest first as the backend returns them.
    pub async fn announcements(&self, bearer: &str) -> Result<Vec<Announcement>, BackendError> {
        self.get_json("/api/admin/announcements", Some(bearer)).await
    }

    /// Posts an announcement.
    #[instrument(skip(self, bearer, announcement), fields(title = %announcement.title))]
    pub async fn post_announcement(
        &self,
        bearer: &str,
        announcement: &NewAnnouncement,
    ) -> Result<(), BackendError> {
        let response = self
            .send_body(
                reqwest::Method::POST,
                "/api/admin/announcements",
                bearer,
                announcement,
            )
            .await?;
        Self::check_status(response, "/api/admin/announcements").await
    }

    // --- admin ---

    /// Fetches the admin landing-page summary.
    pub async fn admin_summary(&self, bearer: &str) -> Result<AdminSummary, BackendError> {
        self.get_json("/api/admin/summary", Some(bearer)).await
    }

    /// Lists current members.
    pub async fn members(&self, bearer: &str) -> Result<Vec<Member>, BackendError> {
        self.get_json("/api/admin/members", Some(bearer)).await
    }

    /// Demotes a member back to a plain user, deleting their agreement.
    #[instrument(skip(self, bearer))]
    pub async fn demote_member(&self, bearer: &str, email: &str) -> Result<(), BackendError> {
        let path = format!("/api/admin/members/{}/demote", encode_component(email));
        let response = self
            .http
            .patch(self.endpoint(&path))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| BackendError::Network {
                details: e.to_string(),
            })?;
        debug!(status = %response.status(), "demote response");
        Self::check_status(response, &path).await
    }
}

/// The backend role endpoint, as consumed by the role resolver.
#[async_trait]
impl RoleEndpoint for ApiClient {
    async fn fetch_role(&self, bearer: &str) -> std::result::Result<String, RoleEndpointError> {
        let response = self
            .http
            .get(self.endpoint("/api/users/role"))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| RoleEndpointError::Network {
                details: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RoleEndpointError::Unauthorized);
        }
        if !status.is_success() {
            return Err(RoleEndpointError::Http {
                status: status.as_u16(),
            });
        }

        let body: RoleResponse =
            response
                .json()
                .await
                .map_err(|e| RoleEndpointError::Malformed {
                    details: e.to_string(),
                })?;
        Ok(body.role)
    }
}

/// Percent-encodes one path or query component.
fn encode_component(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
