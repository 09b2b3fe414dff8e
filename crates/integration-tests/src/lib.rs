//! Integration tests for Sammy's Market.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the API against a migrated, seeded database
//! cargo run -p sammys-market-cli -- migrate
//! cargo run -p sammys-market-cli -- seed catalog -f crates/cli/seed/catalog.yaml
//! cargo run -p sammys-market-storefront
//!
//! # Run integration tests
//! cargo test -p sammys-market-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `MARKET_TEST_URL` - API base URL (default: `http://localhost:3000`)
//! - `MARKET_TEST_ACCESS_TOKEN` - Auth provider access token for a customer
//!   account; signed-in tests are skipped without it
//! - `MARKET_TEST_SELLER_TOKEN`, `MARKET_TEST_OTHER_SELLER_TOKEN` - Tokens for
//!   two different seller accounts
//! - `MARKET_TEST_ADMIN_TOKEN` - Token for an account already promoted to admin

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("MARKET_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Shared state for one test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// A context with a fresh cookie jar.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url(),
        }
    }

    /// A context signed in with `MARKET_TEST_ACCESS_TOKEN`, or `None` when
    /// the variable is unset.
    ///
    /// # Panics
    ///
    /// Panics if the token exchange fails.
    pub async fn signed_in() -> Option<Self> {
        Self::signed_in_as("MARKET_TEST_ACCESS_TOKEN").await
    }

    /// A context signed in with the token held in `token_var`, or `None`
    /// when the variable is unset.
    ///
    /// # Panics
    ///
    /// Panics if the token exchange fails.
    pub async fn signed_in_as(token_var: &str) -> Option<Self> {
        let token = std::env::var(token_var).ok()?;
        let ctx = Self::new();
        let resp = ctx
            .post("/auth/session", &json!({ "access_token": token }))
            .await;
        assert_eq!(
            resp.status(),
            StatusCode::OK,
            "token exchange failed for {token_var}"
        );
        Some(ctx)
    }

    /// Full URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    /// POST `body` as JSON to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    /// PUT `body` as JSON to `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    /// DELETE `path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("request failed")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("response body is not JSON")
}
