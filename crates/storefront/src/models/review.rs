//! Review domain types.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use sammys_market_core::{OrderId, ProductId, ProfileId, ReviewId};

use super::product::non_blank;

/// Lowest allowed rating.
pub const MIN_RATING: u8 = 1;

/// Highest allowed rating.
pub const MAX_RATING: u8 = 5;

/// A buyer's review of a product from one order.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub buyer_id: ProfileId,
    /// Reviewer's display name, when the profile still exists.
    pub buyer_name: Option<String>,
    pub seller_id: ProfileId,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Average rating and review count for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    /// Mean rating to one decimal place, `None` without reviews.
    pub average_rating: Option<Decimal>,
    pub review_count: usize,
}

impl ReviewSummary {
    /// Summarize a set of reviews.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let review_count = reviews.len();
        let average_rating = (review_count > 0).then(|| {
            let total: Decimal = reviews.iter().map(|r| Decimal::from(r.rating)).sum();
            (total / Decimal::from(review_count))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        });

        Self {
            average_rating,
            review_count,
        }
    }
}

/// Body of `POST /reviews`.
#[derive(Debug, Deserialize)]
pub struct NewReview {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A review that passed input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReview {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub rating: u8,
    pub comment: Option<String>,
}

impl NewReview {
    /// Check the rating range and normalize the comment.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message for an out-of-range rating.
    pub fn validate(&self) -> Result<ValidReview, String> {
        let rating = u8::try_from(self.rating)
            .ok()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .ok_or_else(|| format!("Rating must be between {MIN_RATING} and {MAX_RATING}"))?;

        Ok(ValidReview {
            order_id: self.order_id,
            product_id: self.product_id,
            rating,
            comment: non_blank(self.comment.as_deref()),
        })
    }
}
