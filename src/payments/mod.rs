//! Payment provider integration.
//!
//! The gateway is a trait object so the checkout orchestrator and the
//! webhook reconciler can be exercised in tests without network access;
//! `StripeClient` is the production implementation.

mod stripe;

pub use stripe::{verify_signature, StripeClient};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// One priced line sent to the provider's hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    pub unit_amount_cents: i64,
    pub quantity: i64,
}

/// Everything the provider needs to start collecting payment for an order.
/// The order id travels in session metadata and comes back on the webhook -
/// it is the correlation key, not the session handle.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub order_id: String,
    pub customer_email: String,
    pub line_items: Vec<SessionLineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Provider-side session: opaque handle plus the page to redirect to.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a hosted payment collection flow. Bounded timeout; failure
    /// leaves the already-created order pending.
    async fn create_checkout_session(&self, request: &CreateSessionRequest)
        -> Result<PaymentSession>;

    /// Verify a webhook signature header against the raw request bytes.
    /// `Ok(false)` means a well-formed header that doesn't match.
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool>;
}

pub type DynPaymentGateway = Arc<dyn PaymentGateway>;

/// A payment outcome notification, parsed after signature verification.
///
/// Kinds this system doesn't act on land in `Unhandled` so new provider
/// event types never break the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Payment collected; the correlated order should become paid.
    Completed { order_id: Option<String> },
    /// Session expired or was cancelled without payment.
    Expired { order_id: Option<String> },
    Unhandled { kind: String },
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    #[serde(rename = "type")]
    kind: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: WebhookObject,
}

#[derive(Debug, Deserialize)]
struct WebhookObject {
    #[serde(default)]
    metadata: WebhookMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookMetadata {
    order_id: Option<String>,
}

impl PaymentEvent {
    /// Parse a verified payload into the event union.
    pub fn parse(payload: &[u8]) -> serde_json::Result<Self> {
        let envelope: WebhookEnvelope = serde_json::from_slice(payload)?;
        let order_id = envelope.data.object.metadata.order_id;
        Ok(match envelope.kind.as_str() {
            "checkout.session.completed" => PaymentEvent::Completed { order_id },
            "checkout.session.expired" => PaymentEvent::Expired { order_id },
            _ => PaymentEvent::Unhandled {
                kind: envelope.kind,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_completed_with_order_id() {
        let payload = br#"{"type":"checkout.session.completed","data":{"object":{"metadata":{"order_id":"ord-1"}}}}"#;
        assert_eq!(
            PaymentEvent::parse(payload).unwrap(),
            PaymentEvent::Completed {
                order_id: Some("ord-1".to_string())
            }
        );
    }

    #[test]
    fn parses_completed_without_metadata() {
        let payload = br#"{"type":"checkout.session.completed","data":{"object":{}}}"#;
        assert_eq!(
            PaymentEvent::parse(payload).unwrap(),
            PaymentEvent::Completed { order_id: None }
        );
    }

    #[test]
    fn parses_expired() {
        let payload = br#"{"type":"checkout.session.expired","data":{"object":{"metadata":{"order_id":"ord-2"}}}}"#;
        assert_eq!(
            PaymentEvent::parse(payload).unwrap(),
            PaymentEvent::Expired {
                order_id: Some("ord-2".to_string())
            }
        );
    }

    #[test]
    fn unknown_kind_is_unhandled() {
        let payload = br#"{"type":"invoice.paid","data":{"object":{}}}"#;
        assert_eq!(
            PaymentEvent::parse(payload).unwrap(),
            PaymentEvent::Unhandled {
                kind: "invoice.paid".to_string()
            }
        );
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(PaymentEvent::parse(b"not json").is_err());
        assert!(PaymentEvent::parse(br#"{"type":"x"}"#).is_err());
    }
}
