//! The payment event reconciler.
//!
//! Consumes signed notifications from the payment provider and applies at
//! most one terminal transition per order. The provider delivers at least
//! once, out of order, and possibly late; correctness rests on two rules:
//!
//! - the `pending → paid` claim is a single conditional UPDATE, so of any
//!   number of concurrent deliveries exactly one wins and deducts stock;
//! - once the signature checks out we always acknowledge 200, because a
//!   non-2xx makes the provider retry forever and redelivery is already
//!   safe. Internal failures are logged, never returned.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Router,
};
use rusqlite::Connection;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::models::Order;
use crate::payments::PaymentEvent;

pub fn router() -> Router<AppState> {
    Router::new().route("/orders/webhook", post(payment_webhook))
}

/// POST /orders/webhook
///
/// Takes the raw body - signature verification runs over the exact bytes
/// the provider signed, so nothing may parse or reserialize them first.
/// 400 only when authenticity cannot be established; 200 for everything
/// after that.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::SignatureVerification(msg::MISSING_SIGNATURE.into()))?;

    if !state.gateway.verify_webhook_signature(&body, signature)? {
        return Err(AppError::SignatureVerification(
            msg::INVALID_SIGNATURE.into(),
        ));
    }

    match PaymentEvent::parse(&body) {
        Ok(PaymentEvent::Completed { order_id }) => handle_completed(&state, order_id),
        Ok(PaymentEvent::Expired { order_id }) => handle_expired(&state, order_id),
        Ok(PaymentEvent::Unhandled { kind }) => {
            tracing::debug!("ignoring webhook event kind: {}", kind);
        }
        Err(e) => {
            // Authentic but unparseable; retrying won't change the bytes
            tracing::warn!("unparseable webhook payload: {}", e);
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

/// Payment collected: claim the `pending → paid` transition, then deduct
/// stock per line item. Losing the claim means another delivery already
/// handled this order, so stock must not be touched again.
fn handle_completed(state: &AppState, order_id: Option<String>) {
    let Some(order_id) = order_id else {
        tracing::warn!("completed event carries no order id in metadata, ignoring");
        return;
    };

    let conn = match state.db.get() {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("webhook: failed to get db connection: {}", e);
            return;
        }
    };

    let order = match queries::get_order_by_id(&conn, &order_id) {
        Ok(Some(order)) => order,
        Ok(None) => {
            tracing::warn!("completed event for unknown order {}, ignoring", order_id);
            return;
        }
        Err(e) => {
            tracing::error!("webhook: failed to load order {}: {}", order_id, e);
            return;
        }
    };

    match queries::try_mark_order_paid(&conn, &order.id) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(
                "order {} already settled, skipping stock deduction",
                order.id
            );
            return;
        }
        Err(e) => {
            tracing::error!("webhook: failed to mark order {} paid: {}", order.id, e);
            return;
        }
    }

    deduct_stock(&conn, &order);
    tracing::info!(
        "order {} paid, {} line item(s) deducted from stock",
        order.id,
        order.items.len()
    );
}

/// Stock deduction after a won claim. Each line is attempted
/// independently: the payment is already authoritative and irreversible,
/// so one failed decrement must not roll back the status or starve the
/// remaining lines. Failures are an operational concern, visible in logs.
fn deduct_stock(conn: &Connection, order: &Order) {
    for item in &order.items {
        match queries::decrement_product_stock(conn, &item.product_id, item.quantity) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    "order {}: product {} no longer exists, stock not deducted",
                    order.id,
                    item.product_id
                );
            }
            Err(e) => {
                tracing::error!(
                    "order {}: failed to deduct stock for product {}: {}",
                    order.id,
                    item.product_id,
                    e
                );
            }
        }
    }
}

/// Session expired or cancelled: fail the order if it is still pending.
/// The conditional update keeps a late expiry from clobbering `paid`.
fn handle_expired(state: &AppState, order_id: Option<String>) {
    let Some(order_id) = order_id else {
        tracing::warn!("expired event carries no order id in metadata, ignoring");
        return;
    };

    let conn = match state.db.get() {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("webhook: failed to get db connection: {}", e);
            return;
        }
    };

    match queries::mark_order_failed_if_pending(&conn, &order_id) {
        Ok(true) => tracing::info!("order {} marked failed (session expired)", order_id),
        Ok(false) => tracing::debug!(
            "expired event for order {} ignored (not pending)",
            order_id
        ),
        Err(e) => tracing::error!("webhook: failed to mark order {} failed: {}", order_id, e),
    }
}
