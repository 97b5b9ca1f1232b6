//! Stripe checkout integration
//!
//! Implements the hosted-checkout approach: the server creates a Checkout
//! session priced from the package table and redirects the author to
//! Stripe's page. The outcome comes back two ways:
//! - the signed webhook (`CallbackEvent`), which is the source of truth for
//!   stored payment state
//! - the verify endpoint, which polls the session for user-facing display

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use stripe::{
    CheckoutSession, CheckoutSessionId, CheckoutSessionMode, CheckoutSessionPaymentStatus,
    CheckoutSessionStatus, Client, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData, CreateCheckoutSessionLineItemsPriceDataProductData,
    Currency, Event, EventObject, EventType, Webhook,
};

use crate::config::StripeConfig;
use crate::models::{InterviewPackage, PaymentStatus};

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Metadata keys attached to every checkout session
mod metadata_keys {
    pub const ARTICLE_ID: &str = "article_id";
    pub const PACKAGE: &str = "package";
    pub const INTERVIEW_DATE: &str = "interview_date";
    pub const INTERVIEW_TIME: &str = "interview_time";
}

/// Stripe client wrapper
pub struct StripeGateway {
    client: Client,
    webhook_secret: Option<String>,
}

impl StripeGateway {
    /// Create a new gateway
    pub fn new(secret_key: &str, webhook_secret: Option<String>) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret,
        }
    }

    /// Build a gateway from configuration
    ///
    /// Returns `None` when no secret key is configured; checkout endpoints
    /// surface that as a descriptive service-unavailable error.
    pub fn from_config(config: &StripeConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }

        Some(Self::new(
            config.secret_key.as_deref().unwrap_or_default(),
            config.webhook_secret.clone(),
        ))
    }

    /// Create a Checkout session for an article's package purchase
    ///
    /// Returns a URL to redirect the author to Stripe's hosted checkout
    /// page. The amount is read from the package table, never from the
    /// client.
    pub async fn create_package_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutRedirect> {
        let pricing = request.package.pricing();

        let mut params = CreateCheckoutSession::new();
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.mode = Some(CheckoutSessionMode::Payment);

        // Metadata carries everything the webhook needs to apply the outcome
        let mut metadata = std::collections::HashMap::new();
        metadata.insert(
            metadata_keys::ARTICLE_ID.to_string(),
            request.article_id.to_string(),
        );
        metadata.insert(
            metadata_keys::PACKAGE.to_string(),
            request.package.as_str().to_string(),
        );
        if let Some(ref date) = request.interview_date {
            metadata.insert(metadata_keys::INTERVIEW_DATE.to_string(), date.clone());
        }
        if let Some(ref time) = request.interview_time {
            metadata.insert(metadata_keys::INTERVIEW_TIME.to_string(), time.clone());
        }
        params.metadata = Some(metadata);

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::USD,
                unit_amount: Some(pricing.cents),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: pricing.name.to_string(),
                    description: Some(pricing.description.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let checkout_url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        Ok(CheckoutRedirect {
            session_id: session.id.to_string(),
            checkout_url,
        })
    }

    /// Retrieve a session and map its state for user-facing display
    pub async fn verify_session(&self, session_id: &str) -> Result<SessionVerification> {
        let id = CheckoutSessionId::from_str(session_id)
            .map_err(|e| PaymentError::Stripe(format!("Invalid session id: {}", e)))?;

        let session = CheckoutSession::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        Ok(SessionVerification {
            status: map_session_status(&session),
            session_id: session.id.to_string(),
            payment_status: session.payment_status.to_string(),
            session_status: session.status.map(|s| s.to_string()),
            amount: session.amount_total,
            currency: session.currency.map(|c| c.to_string()),
        })
    }

    /// Verify the webhook signature and parse the raw payload into an event
    pub fn construct_event(&self, payload: &str, signature: &str) -> Result<Event> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| PaymentError::Config("Webhook secret not configured".into()))?;

        Webhook::construct_event(payload, signature, secret)
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))
    }
}

/// Map a session's provider state onto our payment status
///
/// `paid` maps to Paid, `unpaid` or an expired session maps to Failed,
/// everything else stays Pending.
fn map_session_status(session: &CheckoutSession) -> PaymentStatus {
    match session.payment_status {
        CheckoutSessionPaymentStatus::Paid => PaymentStatus::Paid,
        CheckoutSessionPaymentStatus::Unpaid => PaymentStatus::Failed,
        _ => {
            if session.status == Some(CheckoutSessionStatus::Expired) {
                PaymentStatus::Failed
            } else {
                PaymentStatus::Pending
            }
        }
    }
}

/// Request to create a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Article being paid for
    pub article_id: i64,

    /// Package to purchase
    pub package: InterviewPackage,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,

    /// Requested interview date (YYYY-MM-DD), carried through metadata
    #[serde(default)]
    pub interview_date: Option<String>,

    /// Requested interview time (HH:MM), carried through metadata
    #[serde(default)]
    pub interview_time: Option<String>,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    /// Stripe session ID
    pub session_id: String,

    /// URL to redirect the author to
    pub checkout_url: String,
}

/// User-facing session verification result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionVerification {
    /// Mapped payment status
    pub status: PaymentStatus,
    /// Stripe session ID
    pub session_id: String,
    /// Raw provider payment status
    pub payment_status: String,
    /// Raw provider session status
    pub session_status: Option<String>,
    /// Total amount in cents
    pub amount: Option<i64>,
    /// Currency code
    pub currency: Option<String>,
}

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq)]
pub enum CallbackEvent {
    /// Checkout completed: mark the article paid, upsert the interview
    CheckoutCompleted {
        article_id: i64,
        package: InterviewPackage,
        schedule: Option<DateTime<Utc>>,
    },

    /// Completed checkout without usable article metadata; nothing to apply
    CheckoutWithoutArticle,

    /// Any other well-signed event: log and acknowledge
    Ignored { event_type: String },
}

/// Parse a verified Stripe event into our callback type
pub fn parse_callback(event: &Event) -> Result<CallbackEvent> {
    match event.type_ {
        EventType::CheckoutSessionCompleted => {
            if let EventObject::CheckoutSession(session) = &event.data.object {
                let metadata = session.metadata.clone().unwrap_or_default();

                let article_id = match metadata
                    .get(metadata_keys::ARTICLE_ID)
                    .and_then(|v| v.parse::<i64>().ok())
                {
                    Some(id) => id,
                    None => return Ok(CallbackEvent::CheckoutWithoutArticle),
                };

                let package = metadata
                    .get(metadata_keys::PACKAGE)
                    .and_then(|p| InterviewPackage::from_str(p))
                    .unwrap_or(InterviewPackage::Basic);

                let schedule = parse_schedule(
                    metadata.get(metadata_keys::INTERVIEW_DATE).map(|s| s.as_str()),
                    metadata.get(metadata_keys::INTERVIEW_TIME).map(|s| s.as_str()),
                );

                Ok(CallbackEvent::CheckoutCompleted {
                    article_id,
                    package,
                    schedule,
                })
            } else {
                Err(PaymentError::WebhookParse(
                    "Invalid checkout session data".into(),
                ))
            }
        }

        _ => Ok(CallbackEvent::Ignored {
            event_type: event.type_.to_string(),
        }),
    }
}

/// Combine a YYYY-MM-DD date and HH:MM time into a UTC timestamp
///
/// Returns None if either part is absent or unparseable; the callback then
/// marks the payment without touching the interview schedule.
pub fn parse_schedule(date: Option<&str>, time: Option<&str>) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date?, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time?, "%H:%M").ok()?;
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_gateway_from_empty_config_is_none() {
        let config = StripeConfig::default();
        assert!(StripeGateway::from_config(&config).is_none());
    }

    #[test]
    fn test_gateway_from_config() {
        let config = StripeConfig {
            secret_key: Some("sk_test_abc".to_string()),
            webhook_secret: Some("whsec_abc".to_string()),
        };
        assert!(StripeGateway::from_config(&config).is_some());
    }

    #[test]
    fn test_construct_event_rejects_bad_signature() {
        let gateway = StripeGateway::new("sk_test_abc", Some("whsec_abc".to_string()));
        let result = gateway.construct_event("{}", "t=1,v1=deadbeef");
        assert!(matches!(result, Err(PaymentError::WebhookSignature(_))));
    }

    #[test]
    fn test_construct_event_without_secret_is_config_error() {
        let gateway = StripeGateway::new("sk_test_abc", None);
        let result = gateway.construct_event("{}", "t=1,v1=deadbeef");
        assert!(matches!(result, Err(PaymentError::Config(_))));
    }

    #[test]
    fn test_parse_schedule() {
        let parsed = parse_schedule(Some("2026-09-15"), Some("14:30")).unwrap();
        assert_eq!(parsed.hour(), 14);
        assert_eq!(parsed.minute(), 30);

        assert!(parse_schedule(None, Some("14:30")).is_none());
        assert!(parse_schedule(Some("2026-09-15"), None).is_none());
        assert!(parse_schedule(Some("not-a-date"), Some("14:30")).is_none());
        assert!(parse_schedule(Some("2026-09-15"), Some("25:99")).is_none());
    }
}
