//! Catalog formatting and reply parsing for the shopping assistant.

use std::collections::HashSet;

use serde::Deserialize;

use sammys_market_core::ProductId;

use super::AssistantError;
use crate::models::Product;

/// Structured answer the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

impl Recommendation {
    /// The products from `catalog` the model picked, in catalog order.
    /// IDs the catalog does not contain are dropped.
    #[must_use]
    pub fn select(&self, catalog: Vec<Product>) -> Vec<Product> {
        let picked: HashSet<ProductId> = self
            .product_ids
            .iter()
            .filter_map(|id| id.trim().parse().ok())
            .collect();

        catalog
            .into_iter()
            .filter(|product| picked.contains(&product.id))
            .collect()
    }
}

/// One catalog line as the model sees it.
#[must_use]
pub fn product_line(product: &Product) -> String {
    format!(
        "ID: {}, Name: {}, Description: {}, Price: {}, Category: {}, Stock: {}",
        product.id,
        product.name,
        product.description.as_deref().unwrap_or("No description"),
        product.price,
        product.category_name.as_deref().unwrap_or("No category"),
        product.stock,
    )
}

/// System prompt embedding the whole catalog.
#[must_use]
pub fn system_prompt(catalog: &[Product]) -> String {
    let inventory = catalog
        .iter()
        .map(product_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful shopping assistant for Sammy's Market, a Zimbabwe marketplace. Your job is to help customers find products that match their needs.

Here is the current product inventory:
{inventory}

When a user asks for product recommendations:
1. Analyze their request carefully
2. Find products that match their description (look for keywords, cultural references, occasions, etc.)
3. Return the product IDs of ALL matching items as a JSON array (not just one product)
4. If multiple products could work, include them all (up to 5 most relevant)
5. If no products match, return an empty array
6. Consider synonyms, cultural context, and related terms (e.g., "soko" relates to elephant/traditional items, "jewellery" could match necklaces or beaded items, "traditional" could match sculptures or cultural items)
7. Look at both product names AND descriptions for matches

Respond with ONLY a JSON object in this format:
{{
  "product_ids": ["id1", "id2", "id3"],
  "explanation": "Brief explanation of why these products match the request and how many options were found"
}}"#
    )
}

/// Parse the model's reply. A Markdown code fence around the JSON is
/// tolerated.
///
/// # Errors
///
/// Returns `AssistantError::InvalidResponse` if the content is not the
/// expected JSON object.
pub fn parse_reply(content: &str) -> Result<Recommendation, AssistantError> {
    serde_json::from_str(strip_fence(content)).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse AI response");
        AssistantError::InvalidResponse
    })
}

fn strip_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use sammys_market_core::{Price, ProfileId};

    use super::*;

    fn product(name: &str, description: Option<&str>, category: Option<&str>) -> Product {
        Product {
            id: ProductId::generate(),
            seller_id: ProfileId::generate(),
            category_id: None,
            category_name: category.map(String::from),
            name: name.to_string(),
            description: description.map(String::from),
            price: Price::new(Decimal::new(4550, 2)).unwrap(),
            stock: 3,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_product_line_with_fallbacks() {
        let p = product("Soapstone Elephant", None, None);
        assert_eq!(
            product_line(&p),
            format!(
                "ID: {}, Name: Soapstone Elephant, Description: No description, \
                 Price: $45.50, Category: No category, Stock: 3",
                p.id
            )
        );
    }

    #[test]
    fn test_system_prompt_lists_every_product() {
        let catalog = vec![
            product("Beaded Necklace", Some("Ndebele glass beads"), Some("Jewelry")),
            product("Woven Basket", Some("Ilala palm"), Some("Crafts")),
        ];
        let prompt = system_prompt(&catalog);
        assert!(prompt.contains("Name: Beaded Necklace"));
        assert!(prompt.contains("Category: Crafts"));
        assert!(prompt.contains("\"product_ids\""));
        assert!(prompt.starts_with("You are a helpful shopping assistant for Sammy's Market"));
    }

    #[test]
    fn test_parse_plain_json() {
        let reply = parse_reply(r#"{"product_ids": ["a"], "explanation": "One match"}"#).unwrap();
        assert_eq!(reply.product_ids, vec!["a".to_string()]);
        assert_eq!(reply.explanation, "One match");
    }

    #[test]
    fn test_parse_fenced_json() {
        let content = "```json\n{\"product_ids\": [], \"explanation\": \"Nothing found\"}\n```";
        let reply = parse_reply(content).unwrap();
        assert!(reply.product_ids.is_empty());
        assert_eq!(reply.explanation, "Nothing found");
    }

    #[test]
    fn test_parse_prose_is_invalid() {
        let err = parse_reply("Here are some great baskets!").unwrap_err();
        assert!(matches!(err, AssistantError::InvalidResponse));
    }

    #[test]
    fn test_select_keeps_catalog_order_and_drops_unknown_ids() {
        let catalog = vec![
            product("First", None, None),
            product("Second", None, None),
            product("Third", None, None),
        ];
        let recommendation = Recommendation {
            product_ids: vec![
                catalog[2].id.to_string(),
                "not-a-uuid".to_string(),
                ProductId::generate().to_string(),
                catalog[0].id.to_string(),
            ],
            explanation: String::new(),
        };

        let names: Vec<String> = recommendation
            .select(catalog)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["First", "Third"]);
    }
}
