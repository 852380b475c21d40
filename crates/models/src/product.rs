use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "lenient::string")]
    pub key: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    /// Empty when the product sits directly under its category.
    #[serde(default, deserialize_with = "lenient::string")]
    pub subcategory: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    /// A price that never parsed is persisted as `null` and read back as NaN.
    #[serde(default = "missing_price", deserialize_with = "lenient::price")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub images: Vec<String>,
    /// Raw ISO-8601 text; see [`Product::created`].
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Fields this crate does not know. Written after the known ones, sorted by key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn missing_price() -> f64 {
    f64::NAN
}

impl Product {
    /// Creation instant, when `createdAt` is present and well formed.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(crate::timestamp::parse)
    }
}

/// Form posts send the price as text, scripted clients as a number, and an
/// empty form field arrives as `null`. Text is read by its numeric prefix;
/// whatever yields no number becomes NaN and is stored as `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Default for PriceInput {
    fn default() -> Self {
        Self::Other(Value::Null)
    }
}

impl PriceInput {
    pub fn value(&self) -> f64 {
        match self {
            Self::Number(n) if n.is_finite() => *n,
            Self::Text(s) => lenient::parse_float(s),
            _ => f64::NAN,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub description: String,
    #[serde(default)]
    pub price: PriceInput,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

impl NewProduct {
    pub fn into_product(self, key: String, created_at: DateTime<Utc>) -> Product {
        Product {
            key,
            name: self.name.trim().to_string(),
            category: self.category,
            subcategory: self.subcategory.unwrap_or_default(),
            description: self.description.trim().to_string(),
            price: self.price.value(),
            images: self.images.unwrap_or_default(),
            created_at: Some(crate::timestamp::format(created_at)),
            extra: Map::new(),
        }
    }
}
