//! Success envelope for API responses.
//!
//! Every 2xx body is `{"success": true, "data": ...}`; error bodies are
//! produced by [`crate::error::AppError`].

use serde::Serialize;

use crate::extractors::Json;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

/// Wrap a payload in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}
