//! Rent payment flow.
//!
//! Sequencing mirrors the payment form: the month must not already be
//! paid, a payment intent must be in hand, the card charge is confirmed
//! through the processor, and only then is the record saved. A record-save
//! failure after a successful charge is its own error carrying the
//! transaction id, since at that point money has moved.

use crate::client::ApiClient;
use crate::error::BackendError;
use crate::models::PaymentRecord;
use async_trait::async_trait;
use hillcrest_core::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Errors from the payment flow, ordered by how far the flow got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// No payment intent is in hand yet.
    NotReady,
    /// A payment for this month already exists.
    DuplicateMonth { month: String },
    /// The payment history could not be checked.
    HistoryUnavailable { details: String },
    /// The card charge was declined or failed.
    Card { message: String },
    /// The charge succeeded but the record could not be saved.
    RecordSave {
        transaction_id: String,
        details: String,
    },
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => {
                write!(f, "payment is not ready yet")
            }
            Self::DuplicateMonth { month } => {
                write!(f, "a payment for {month} already exists")
            }
            Self::HistoryUnavailable { details } => {
                write!(f, "could not check existing payments: {details}")
            }
            Self::Card { message } => {
                write!(f, "card payment failed: {message}")
            }
            Self::RecordSave {
                transaction_id,
                details,
            } => {
                write!(
                    f,
                    "charge {transaction_id} succeeded but saving the record failed: {details}"
                )
            }
        }
    }
}

impl std::error::Error for PaymentError {}

/// The card processor behind the payment form.
///
/// Confirms a charge against a payment-intent client secret and returns the
/// processor's transaction id.
#[async_trait]
pub trait CardProcessor: Send + Sync {
    async fn confirm_payment(
        &self,
        client_secret: &str,
        billing_name: &str,
        billing_email: &str,
    ) -> std::result::Result<String, PaymentError>;
}

/// The backend's payment bookkeeping, as the flow needs it.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Payment history for an email address.
    async fn payments_for(
        &self,
        bearer: &str,
        email: &str,
    ) -> Result<Vec<PaymentRecord>, BackendError>;

    /// Saves a payment record after a successful charge.
    async fn save_record(&self, bearer: &str, record: &PaymentRecord)
    -> Result<(), BackendError>;
}

#[async_trait]
impl PaymentLedger for ApiClient {
    async fn payments_for(
        &self,
        bearer: &str,
        email: &str,
    ) -> Result<Vec<PaymentRecord>, BackendError> {
        self.user_payments(bearer, email).await
    }

    async fn save_record(
        &self,
        bearer: &str,
        record: &PaymentRecord,
    ) -> Result<(), BackendError> {
        self.record_payment(bearer, record).await
    }
}

/// Everything the flow needs to charge one month of rent.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub user_name: String,
    pub user_email: String,
    pub floor: u32,
    pub block: String,
    pub number: String,
    pub rent: u64,
    pub month: String,
    /// Discount percentage from an applied coupon, zero when none.
    pub discount: u32,
    /// Client secret from the payment intent, when one has been created.
    pub client_secret: Option<String>,
}

/// Drives one rent payment end to end.
pub struct PaymentFlow {
    ledger: Arc<dyn PaymentLedger>,
    processor: Arc<dyn CardProcessor>,
}

impl PaymentFlow {
    #[must_use]
    pub fn new(ledger: Arc<dyn PaymentLedger>, processor: Arc<dyn CardProcessor>) -> Self {
        Self { ledger, processor }
    }

    /// Submits a payment.
    ///
    /// Returns the saved record on success. Errors identify the stage that
    /// failed; in particular [`PaymentError::RecordSave`] means the charge
    /// itself went through.
    #[instrument(skip_all, fields(month = %request.month))]
    pub async fn submit(
        &self,
        bearer: &str,
        request: PaymentRequest,
    ) -> std::result::Result<PaymentRecord, PaymentError> {
        let client_secret = request.client_secret.as_deref().ok_or(PaymentError::NotReady)?;

        let existing = self
            .ledger
            .payments_for(bearer, &request.user_email)
            .await
            .map_err(|e| PaymentError::HistoryUnavailable {
                details: e.to_string(),
            })?;
        if existing
            .iter()
            .any(|p| p.month.eq_ignore_ascii_case(&request.month))
        {
            return Err(PaymentError::DuplicateMonth {
                month: request.month,
            });
        }

        let transaction_id = self
            .processor
            .confirm_payment(client_secret, &request.user_name, &request.user_email)
            .await?;

        let record = PaymentRecord {
            id: None,
            user_name: request.user_name,
            user_email: request.user_email,
            floor: request.floor,
            block: request.block,
            number: request.number,
            rent: request.rent,
            month: request.month,
            discount: request.discount,
            status: "paid".to_string(),
            transaction_id: transaction_id.clone(),
            paid_at: None,
        };

        if let Err(e) = self.ledger.save_record(bearer, &record).await {
            warn!(%transaction_id, "charge succeeded but record save failed");
            return Err(PaymentError::RecordSave {
                transaction_id,
                details: e.to_string(),
            });
        }

        Ok(record)
    }
}

/// The amount to charge after a percentage discount, in the smallest
/// currency unit.
#[must_use]
pub fn discounted_amount(rent: u64, discount_percentage: u32) -> u64 {
    let discount = u64::from(discount_percentage.min(100));
    rent * 100 * (100 - discount) / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLedger {
        existing: Vec<PaymentRecord>,
        fail_history: bool,
        fail_save: bool,
        saved: Mutex<Vec<PaymentRecord>>,
    }

    impl FakeLedger {
        fn empty() -> Self {
            Self {
                existing: Vec::new(),
                fail_history: false,
                fail_save: false,
                saved: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentLedger for FakeLedger {
        async fn payments_for(
            &self,
            _bearer: &str,
            _email: &str,
        ) -> Result<Vec<PaymentRecord>, BackendError> {
            if self.fail_history {
                return Err(BackendError::Network {
                    details: "connection refused".to_string(),
                }
                .into());
            }
            Ok(self.existing.clone())
        }

        async fn save_record(
            &self,
            _bearer: &str,
            record: &PaymentRecord,
        ) -> Result<(), BackendError> {
            if self.fail_save {
                return Err(BackendError::RequestFailed {
                    status: 500,
                    body: "write failed".to_string(),
                }
                .into());
            }
            self.saved.lock().expect("lock").push(record.clone());
            Ok(())
        }
    }

    struct FakeProcessor {
        decline: bool,
        charges: AtomicUsize,
    }

    impl FakeProcessor {
        fn approving() -> Self {
            Self {
                decline: false,
                charges: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CardProcessor for FakeProcessor {
        async fn confirm_payment(
            &self,
            _client_secret: &str,
            _billing_name: &str,
            _billing_email: &str,
        ) -> std::result::Result<String, PaymentError> {
            if self.decline {
                return Err(PaymentError::Card {
                    message: "card declined".to_string(),
                });
            }
            let n = self.charges.fetch_add(1, Ordering::SeqCst);
            Ok(format!("pi_{n}"))
        }
    }

    fn request(month: &str) -> PaymentRequest {
        PaymentRequest {
            user_name: "Bob".to_string(),
            user_email: "bob@example.com".to_string(),
            floor: 2,
            block: "B".to_string(),
            number: "B-201".to_string(),
            rent: 1200,
            month: month.to_string(),
            discount: 0,
            client_secret: Some("cs_test".to_string()),
        }
    }

    fn paid(month: &str) -> PaymentRecord {
        PaymentRecord {
            id: None,
            user_name: "Bob".to_string(),
            user_email: "bob@example.com".to_string(),
            floor: 2,
            block: "B".to_string(),
            number: "B-201".to_string(),
            rent: 1200,
            month: month.to_string(),
            discount: 0,
            status: "paid".to_string(),
            transaction_id: "pi_old".to_string(),
            paid_at: None,
        }
    }

    #[tokio::test]
    async fn successful_payment_saves_a_paid_record() {
        let ledger = Arc::new(FakeLedger::empty());
        let processor = Arc::new(FakeProcessor::approving());
        let flow = PaymentFlow::new(ledger.clone(), processor);

        let record = flow.submit("token", request("January")).await.expect("paid");

        assert_eq!(record.status, "paid");
        assert_eq!(record.transaction_id, "pi_0");
        assert_eq!(ledger.saved.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn missing_client_secret_is_not_ready() {
        let flow = PaymentFlow::new(
            Arc::new(FakeLedger::empty()),
            Arc::new(FakeProcessor::approving()),
        );
        let mut req = request("January");
        req.client_secret = None;

        let err = flow.submit("token", req).await.expect_err("should fail");
        assert_eq!(err, PaymentError::NotReady);
    }

    #[tokio::test]
    async fn duplicate_month_is_rejected_case_insensitively() {
        let ledger = Arc::new(FakeLedger {
            existing: vec![paid("january")],
            ..FakeLedger::empty()
        });
        let processor = Arc::new(FakeProcessor::approving());
        let flow = PaymentFlow::new(ledger, processor.clone());

        let err = flow
            .submit("token", request("January"))
            .await
            .expect_err("should fail");

        assert_eq!(
            err,
            PaymentError::DuplicateMonth {
                month: "January".to_string()
            }
        );
        assert_eq!(processor.charges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn declined_card_surfaces_as_card_error() {
        let ledger = Arc::new(FakeLedger::empty());
        let flow = PaymentFlow::new(
            ledger.clone(),
            Arc::new(FakeProcessor {
                decline: true,
                charges: AtomicUsize::new(0),
            }),
        );

        let err = flow
            .submit("token", request("January"))
            .await
            .expect_err("should fail");

        assert!(matches!(err, PaymentError::Card { .. }));
        assert!(ledger.saved.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn record_save_failure_carries_the_transaction_id() {
        let ledger = Arc::new(FakeLedger {
            fail_save: true,
            ..FakeLedger::empty()
        });
        let flow = PaymentFlow::new(ledger, Arc::new(FakeProcessor::approving()));

        let err = flow
            .submit("token", request("January"))
            .await
            .expect_err("should fail");

        match err {
            PaymentError::RecordSave { transaction_id, .. } => {
                assert_eq!(transaction_id, "pi_0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unavailable_history_blocks_the_charge() {
        let ledger = Arc::new(FakeLedger {
            fail_history: true,
            ..FakeLedger::empty()
        });
        let processor = Arc::new(FakeProcessor::approving());
        let flow = PaymentFlow::new(ledger, processor.clone());

        let err = flow
            .submit("token", request("January"))
            .await
            .expect_err("should fail");

        assert!(matches!(err, PaymentError::HistoryUnavailable { .. }));
        assert_eq!(processor.charges.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn discount_applies_to_the_cent_amount() {
        assert_eq!(discounted_amount(1200, 0), 120_000);
        assert_eq!(discounted_amount(1200, 10), 108_000);
        assert_eq!(discounted_amount(1200, 100), 0);
        // discounts over 100% clamp rather than underflow
        assert_eq!(discounted_amount(1200, 150), 0);
    }
}
