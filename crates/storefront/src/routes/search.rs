//! Assistant product search handler.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::models::Product;
use crate::services::assistant::{AssistantError, AssistantService};
use crate::state::AppState;

const FALLBACK_EXPLANATION: &str =
    "Sorry, I encountered an error while searching for products. Please try again.";

/// Body of `POST /api/product-search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

impl SearchRequest {
    /// Parse a raw request body. An empty body is a request without a query.
    ///
    /// The content type is not checked.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::InvalidRequest` if the body is not a JSON
    /// object with an optional string `query`.
    pub fn from_body(body: &[u8]) -> Result<Self, AssistantError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }
}

/// Error body. Carries an empty product list so clients can render it as a result.
#[derive(Debug, Serialize)]
struct SearchFailure {
    error: String,
    products: Vec<Product>,
    explanation: &'static str,
}

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            tracing::debug!(error = %self, "Rejected assistant search");
        } else {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Assistant search failed"
            );
        }

        let body = SearchFailure {
            error: self.public_message(),
            products: Vec::new(),
            explanation: FALLBACK_EXPLANATION,
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Ask the assistant for products matching a free-text query.
///
/// Every failure, including an unreadable body, answers with the fallback body.
///
/// POST /api/product-search
#[instrument(skip(state, body))]
pub async fn product_search(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match SearchRequest::from_body(&body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    let service = AssistantService::new(state.pool(), state.assistant());
    match service.search(request.query.as_deref()).await {
        Ok(result) => {
            tracing::info!(
                query = %result.query,
                matches = result.products.len(),
                "Assistant search completed"
            );
            Json(result).into_response()
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_body_parsing() {
        let request = SearchRequest::from_body(br#"{"query": "soapstone"}"#).unwrap();
        assert_eq!(request.query.as_deref(), Some("soapstone"));

        assert!(SearchRequest::from_body(b"").unwrap().query.is_none());
        assert!(SearchRequest::from_body(b"{}").unwrap().query.is_none());
    }

    #[test]
    fn test_unreadable_bodies_are_rejected() {
        for body in [&b"{not json"[..], br#"{"query": 5}"#, br#""soapstone""#] {
            let err = SearchRequest::from_body(body).unwrap_err();
            assert!(matches!(err, AssistantError::InvalidRequest(_)), "{err}");
        }
    }
}
