//! The checkout orchestrator and the customer's order history.
//!
//! Checkout deliberately commits no stock: the order is created pending,
//! the provider session is attached, and fulfillment waits for the signed
//! webhook. An abandoned checkout therefore never reserves inventory.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::config::RateLimitConfig;
use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{AuthUser, Json};
use crate::models::{CheckoutRequest, CheckoutResponse, OrderItem};
use crate::payments::{CreateSessionRequest, SessionLineItem};
use crate::rate_limit;
use crate::response::ok;

pub fn router(rate_limit_config: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .layer(rate_limit::strict_layer(rate_limit_config.strict_rpm))
        .route("/orders/mine", get(my_orders))
}

/// POST /checkout
///
/// Order of operations matters:
/// 1. validate and snapshot line items (no mutation on failure),
/// 2. persist the pending order - the session request needs its id as
///    correlation metadata,
/// 3. ask the provider for a session,
/// 4. attach the session handle.
///
/// If step 3 fails, the pending order stays behind with no session
/// attached. That is the accepted degraded state: it never gets paid, never
/// touches stock, and the customer simply retries checkout.
pub async fn checkout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    request.validate()?;

    let conn = state.db.get()?;

    // Availability check and price snapshot in one pass. The check is
    // advisory - stock is not re-validated at webhook time.
    let mut items = Vec::with_capacity(request.items.len());
    for line in &request.items {
        let product = queries::get_product_by_id(&conn, &line.product_id)?.ok_or_else(|| {
            AppError::NotFound(format!("Product not found: {}", line.product_id))
        })?;

        if line.quantity > product.stock_quantity {
            return Err(AppError::InsufficientStock {
                title: product.title,
                available: product.stock_quantity,
                requested: line.quantity,
            });
        }

        items.push(OrderItem {
            product_id: product.id,
            title: product.title,
            quantity: line.quantity,
            unit_price_cents: product.price_cents,
        });
    }

    let order = queries::create_order(&conn, &user.id, &items)?;

    // Don't hold a pool connection across the provider round trip
    drop(conn);

    let session_request = CreateSessionRequest {
        order_id: order.id.clone(),
        customer_email: user.email.clone(),
        line_items: items
            .iter()
            .map(|item| SessionLineItem {
                name: item.title.clone(),
                unit_amount_cents: item.unit_price_cents,
                quantity: item.quantity,
            })
            .collect(),
        success_url: format!("{}/checkout/success?order={}", state.client_url, order.id),
        cancel_url: format!("{}/checkout/cancel", state.client_url),
    };

    let session = state
        .gateway
        .create_checkout_session(&session_request)
        .await?;

    let conn = state.db.get()?;
    queries::attach_payment_session(&conn, &order.id, &session.id)?;

    tracing::info!(
        "checkout: order {} for user {} awaiting payment (session {})",
        order.id,
        user.id,
        session.id
    );

    Ok(ok(CheckoutResponse {
        redirect_url: session.url,
    }))
}

/// GET /orders/mine - the caller's orders, newest first.
pub async fn my_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse> {
    let conn = state.db.get()?;
    let orders = queries::list_orders_by_user(&conn, &user.id)?;
    Ok(ok(orders))
}
