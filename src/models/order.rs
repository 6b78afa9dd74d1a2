use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

/// Payment-status state machine for an order.
///
/// `Pending → Paid` and `Pending → Failed` are the only transitions; both
/// targets are terminal. The reconciler enforces this with conditional
/// updates, so a redelivered or late webhook can never overwrite a settled
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One priced line within an order, snapshotted at checkout time.
///
/// Title and unit price are copied from the product row as it looked when
/// the order was created and are never re-read from the live catalog, so a
/// later price change cannot alter what the customer agreed to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub title: String,
    pub quantity: i64,
    #[serde(rename = "unitPriceAtPurchase")]
    pub unit_price_cents: i64,
}

/// One checkout attempt and its payment outcome. Never deleted.
///
/// `payment_session_id` is NULL between order creation and the payment
/// provider responding with a session - the order has to exist first so the
/// session can carry its id as correlation metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    #[serde(rename = "totalAmount")]
    pub total_amount_cents: i64,
    pub payment_session_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Sum of quantity × unit price over the items. Always equals
    /// `total_amount_cents`; the total is computed from the items once at
    /// creation and never mutated independently.
    pub fn computed_total_cents(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.quantity * item.unit_price_cents)
            .sum()
    }
}

/// Order joined with its customer's identity, for the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithCustomer {
    #[serde(flatten)]
    pub order: Order,
    pub customer_name: String,
    pub customer_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(AppError::Validation(msg::CART_EMPTY.into()));
        }
        for item in &self.items {
            if item.product_id.trim().is_empty() {
                return Err(AppError::Validation(msg::PRODUCT_REF_REQUIRED.into()));
            }
            if item.quantity < 1 {
                return Err(AppError::Validation(msg::INVALID_QUANTITY.into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub redirect_url: String,
}
