use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{msg, AppError, Result};

use super::{CreateSessionRequest, PaymentGateway, PaymentSession};

type HmacSha256 = Hmac<Sha256>;

/// Bounded timeout for calls to the Stripe API. On timeout the checkout
/// fails and the pending order is left untouched.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum age of a webhook timestamp before it's rejected.
/// Stripe recommends 300 seconds (5 minutes).
const WEBHOOK_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Deserialize)]
struct CreateCheckoutSessionResponse {
    id: String,
    url: String,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    webhook_secret: String,
}

impl StripeClient {
    pub fn new(secret_key: &str, webhook_secret: &str) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.to_string(),
            webhook_secret: webhook_secret.to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    /// Create a Stripe checkout session with ad-hoc `price_data` per line,
    /// priced from the order's item snapshots. The order id rides along in
    /// `metadata[order_id]` and comes back on the webhook.
    async fn create_checkout_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<PaymentSession> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("success_url".into(), request.success_url.clone()),
            ("cancel_url".into(), request.cancel_url.clone()),
            ("customer_email".into(), request.customer_email.clone()),
            ("metadata[order_id]".into(), request.order_id.clone()),
        ];
        for (i, item) in request.line_items.iter().enumerate() {
            form.push((format!("line_items[{}][price_data][currency]", i), "usd".into()));
            form.push((
                format!("line_items[{}][price_data][unit_amount]", i),
                item.unit_amount_cents.to_string(),
            ));
            form.push((
                format!("line_items[{}][price_data][product_data][name]", i),
                item.name.clone(),
            ));
            form.push((format!("line_items[{}][quantity]", i), item.quantity.to_string()));
        }

        let response = self
            .client
            .post("https://api.stripe.com/v1/checkout/sessions")
            .basic_auth(&self.secret_key, None::<&str>)
            .timeout(REQUEST_TIMEOUT)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::UpstreamPayment(format!("Stripe API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamPayment(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: CreateCheckoutSessionResponse = response.json().await.map_err(|e| {
            AppError::UpstreamPayment(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(PaymentSession {
            id: session.id,
            url: session.url,
        })
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        verify_signature(&self.webhook_secret, payload, signature)
    }
}

/// Verify a Stripe-style webhook signature header against raw payload bytes.
///
/// Header format: `t=timestamp,v1=signature` where the signature is
/// hex-encoded HMAC-SHA256 over `"{timestamp}.{payload}"`.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> Result<bool> {
    let mut timestamp = None;
    let mut sig_v1 = None;

    for part in signature.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(s) = part.strip_prefix("v1=") {
            sig_v1 = Some(s);
        }
    }

    let timestamp_str = timestamp
        .ok_or_else(|| AppError::SignatureVerification(msg::INVALID_SIGNATURE_FORMAT.into()))?;
    let sig_v1 = sig_v1
        .ok_or_else(|| AppError::SignatureVerification(msg::INVALID_SIGNATURE_FORMAT.into()))?;

    // Reject replayed webhooks: the timestamp is covered by the signature,
    // so an old-but-valid header cannot be resent past the tolerance.
    let timestamp: i64 = timestamp_str
        .parse()
        .map_err(|_| AppError::SignatureVerification(msg::INVALID_SIGNATURE_TIMESTAMP.into()))?;

    let now = chrono::Utc::now().timestamp();
    let age = now - timestamp;

    if age > WEBHOOK_TIMESTAMP_TOLERANCE_SECS {
        tracing::warn!(
            "webhook rejected: timestamp too old (age={}s, max={}s)",
            age,
            WEBHOOK_TIMESTAMP_TOLERANCE_SECS
        );
        return Ok(false);
    }

    // Clock skew tolerance for timestamps from the future: 60 seconds
    if age < -60 {
        tracing::warn!("webhook rejected: timestamp in the future (age={}s)", age);
        return Ok(false);
    }

    let signed_payload = format!("{}.{}", timestamp_str, String::from_utf8_lossy(payload));

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Invalid webhook secret".into()))?;
    mac.update(signed_payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks. The length check
    // is not constant-time, but signature length is not secret (always 64
    // hex chars for SHA-256).
    let expected_bytes = expected.as_bytes();
    let provided_bytes = sig_v1.as_bytes();

    if expected_bytes.len() != provided_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(provided_bytes).into())
}
