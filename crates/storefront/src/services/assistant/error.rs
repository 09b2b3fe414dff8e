//! Error types for the shopping assistant.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during an assistant product search.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The request carried no usable query.
    #[error("No search query provided")]
    EmptyQuery,

    /// The request body was not a JSON object with a string `query`.
    #[error("Invalid search request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    /// Loading the catalog failed.
    #[error("Failed to fetch products from database: {0}")]
    Catalog(#[from] RepositoryError),

    /// HTTP request to the chat API failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The chat API answered with a non-success status.
    #[error("OpenAI API error ({status}): {body}")]
    Api {
        /// HTTP status returned by the API.
        status: reqwest::StatusCode,
        /// Response body text.
        body: String,
    },

    /// The API key cannot be used as a header value.
    #[error("invalid API key header")]
    InvalidApiKey,

    /// The model's reply was not the expected JSON object.
    #[error("Invalid response from AI")]
    InvalidResponse,
}

impl AssistantError {
    /// Message returned to the client in the `error` field.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::EmptyQuery | Self::InvalidResponse => self.to_string(),
            Self::InvalidRequest(_) => "Invalid search request".to_string(),
            Self::Catalog(_) => "Failed to fetch products from database".to_string(),
            Self::Http(_) | Self::Api { .. } | Self::InvalidApiKey => {
                "AI service error".to_string()
            }
        }
    }

    /// Whether this failure came from the caller rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyQuery | Self::InvalidRequest(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_messages() {
        assert_eq!(
            AssistantError::EmptyQuery.public_message(),
            "No search query provided"
        );
        assert_eq!(
            AssistantError::InvalidResponse.public_message(),
            "Invalid response from AI"
        );

        let err = AssistantError::Api {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "{\"error\": \"bad key sk-123\"}".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert_eq!(err.public_message(), "AI service error");
    }

    #[test]
    fn test_only_request_problems_are_client_errors() {
        assert!(AssistantError::EmptyQuery.is_client_error());
        assert!(!AssistantError::InvalidResponse.is_client_error());

        let malformed = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = AssistantError::from(malformed);
        assert!(err.is_client_error());
        assert_eq!(err.public_message(), "Invalid search request");
    }
}
