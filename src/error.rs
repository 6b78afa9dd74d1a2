use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Shared user-facing message strings.
pub mod msg {
    pub const PRODUCT_NOT_FOUND: &str = "Product not found";
    pub const ORDER_NOT_FOUND: &str = "Order not found";
    pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
    pub const EMAIL_TAKEN: &str = "User with this email already exists";
    pub const NO_TOKEN: &str = "Not authorized, no token provided";
    pub const INVALID_TOKEN: &str = "Not authorized, invalid or expired token";
    pub const USER_GONE: &str = "Not authorized, user not found";
    pub const ADMIN_ONLY: &str = "Not authorized, admin access required";

    pub const NAME_REQUIRED: &str = "Name is required";
    pub const NAME_TOO_LONG: &str = "Name must be 50 characters or less";
    pub const INVALID_EMAIL: &str = "Invalid email address";
    pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

    pub const CART_EMPTY: &str = "Order must contain at least one item";
    pub const INVALID_QUANTITY: &str = "Each item needs a positive quantity";
    pub const PRODUCT_REF_REQUIRED: &str = "Each item needs a product id";

    pub const TITLE_REQUIRED: &str = "Title is required";
    pub const TITLE_TOO_LONG: &str = "Title must be 150 characters or less";
    pub const DESCRIPTION_TOO_LONG: &str = "Description must be 2000 characters or less";
    pub const CATEGORY_REQUIRED: &str = "Category is required";
    pub const PRICE_NEGATIVE: &str = "Price cannot be negative";
    pub const STOCK_NEGATIVE: &str = "Stock quantity cannot be negative";
    pub const NO_UPDATE_FIELDS: &str = "No fields to update";
    pub const INVALID_SORT: &str = "Invalid sort option";

    pub const MISSING_SIGNATURE: &str = "Missing stripe-signature header";
    pub const INVALID_SIGNATURE_FORMAT: &str = "Invalid signature header format";
    pub const INVALID_SIGNATURE_TIMESTAMP: &str = "Invalid timestamp in signature header";
    pub const INVALID_SIGNATURE: &str = "Signature verification failed";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Insufficient stock for \"{title}\". Available: {available}, Requested: {requested}")]
    InsufficientStock {
        title: String,
        available: i64,
        requested: i64,
    },

    #[error("Webhook Error: {0}")]
    SignatureVerification(String),

    #[error("Payment provider error: {0}")]
    UpstreamPayment(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body shared by every non-2xx response.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::SignatureVerification(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::UpstreamPayment(m) => {
                tracing::error!("Payment provider error: {}", m);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Payment provider error".to_string(),
                )
            }
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Json(e) => (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e)),
            AppError::Internal(m) => {
                tracing::error!("Internal error: {}", m);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Converts extractor rejections (bad JSON body, bad query string, bad path
/// params) into the standard error envelope.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<axum::extract::rejection::PathRejection> for AppError {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

pub trait OptionExt<T> {
    /// Maps `None` to `AppError::NotFound` with the given message.
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
