use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::lenient;
use crate::utils::format_price;

/// A catalog entry. `id` is assigned by the catalog service on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub title: String,
    /// Category name. Matched against `Category::name` by exact string equality.
    pub category: String,
    #[serde(deserialize_with = "lenient::price")]
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
}

impl Game {
    /// Image URL, or `None` when the entry has no image and a placeholder should be shown.
    pub fn image_url(&self) -> Option<&str> {
        let trimmed = self.image.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    pub fn price_display(&self) -> String {
        format_price(self.price)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please fill in all required fields ({0} is empty)")]
    MissingField(&'static str),

    #[error("Price must be a valid number (got {0:?})")]
    InvalidPrice(String),
}

/// Raw "add game" form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewGame {
    pub title: String,
    pub category: String,
    pub price: String,
    pub image: String,
    #[serde(default)]
    pub description: String,
}

impl NewGame {
    /// Check required fields and coerce the price.
    ///
    /// Required fields are checked in form order (title, category, price,
    /// image) and the first empty one is reported. The price is trimmed and
    /// must parse as a finite number.
    pub fn validate(&self) -> Result<GameDraft, ValidationError> {
        let required = [
            ("title", &self.title),
            ("category", &self.category),
            ("price", &self.price),
            ("image", &self.image),
        ];
        if let Some(&(field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(ValidationError::MissingField(field));
        }

        let price = self
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_else(|| ValidationError::InvalidPrice(self.price.clone()))?;

        Ok(GameDraft {
            title: self.title.clone(),
            category: self.category.clone(),
            price,
            image: self.image.clone(),
            description: self.description.clone(),
        })
    }
}

/// Validated create request body for `POST /Games`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameDraft {
    pub title: String,
    pub category: String,
    pub price: f64,
    pub image: String,
    pub description: String,
}
