//! Shopping assistant: natural-language product search.
//!
//! The whole catalog is formatted into a system prompt and sent with the
//! shopper's query to an `OpenAI`-compatible chat completions API. The model
//! answers with product IDs, which are matched back against the catalog.

mod error;
pub mod prompt;

pub use error::AssistantError;
pub use prompt::Recommendation;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;

use crate::config::AssistantConfig;
use crate::db::ProductRepository;
use crate::models::Product;

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Chat completions client.
#[derive(Clone)]
pub struct AssistantClient {
    inner: Arc<AssistantClientInner>,
}

struct AssistantClientInner {
    client: reqwest::Client,
    completions_url: String,
    model: String,
}

impl AssistantClient {
    /// Create a new chat client.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::InvalidApiKey` if the key cannot be sent as a
    /// header, or `AssistantError::Http` if the client cannot be built.
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
                .map_err(|_| AssistantError::InvalidApiKey)?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(AssistantClientInner {
                client,
                completions_url: format!("{}/chat/completions", config.base_url),
                model: config.model.clone(),
            }),
        })
    }

    /// Send one system + user exchange and return the first choice's content.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Api` with the response body on a non-success
    /// status, or `AssistantError::InvalidResponse` if there is no choice.
    #[instrument(skip(self, system, user), fields(model = %self.inner.model))]
    pub async fn complete(&self, system: String, user: &str) -> Result<String, AssistantError> {
        let request = ChatRequest {
            model: &self.inner.model,
            messages: vec![
                ChatMessage::new("system", system),
                ChatMessage::new("user", user),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.completions_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Api { status, body });
        }

        let response: ChatResponse = response.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(AssistantError::InvalidResponse)
    }
}

/// Result of an assistant search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub products: Vec<Product>,
    pub explanation: String,
    pub query: String,
}

/// Runs assistant searches against the live catalog.
pub struct AssistantService<'a> {
    products: ProductRepository<'a>,
    client: &'a AssistantClient,
}

impl<'a> AssistantService<'a> {
    /// Create a new assistant service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, client: &'a AssistantClient) -> Self {
        Self {
            products: ProductRepository::new(pool),
            client,
        }
    }

    /// Find the products matching a natural-language query.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::EmptyQuery` for a missing or blank query, and
    /// the catalog, API or parse error otherwise.
    #[instrument(skip(self))]
    pub async fn search(&self, query: Option<&str>) -> Result<SearchResult, AssistantError> {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or(AssistantError::EmptyQuery)?;

        let catalog = self.products.list_all().await?;
        tracing::debug!(products = catalog.len(), "Loaded catalog for assistant");

        let content = self
            .client
            .complete(prompt::system_prompt(&catalog), query)
            .await?;
        let recommendation = prompt::parse_reply(&content)?;

        Ok(SearchResult {
            explanation: recommendation.explanation.clone(),
            products: recommendation.select(catalog),
            query: query.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage::new("system", "catalog"),
                ChatMessage::new("user", "a gift for my mother"),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "a gift for my mother");
        assert!((json["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"product_ids\": []}"}}
            ]
        }"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        let content = &response.choices.first().unwrap().message.content;
        assert_eq!(content, "{\"product_ids\": []}");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_http_error() {
        let config = crate::config::StorefrontConfig::for_tests();
        let client = AssistantClient::new(&config.assistant).unwrap();
        let err = client.complete("system".to_string(), "query").await.unwrap_err();
        assert!(matches!(err, AssistantError::Http(_)));
    }
}
