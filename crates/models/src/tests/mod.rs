

use chrono::{TimeZone, Utc};
use serde_json::Map;

use crate::{CatalogDocument, Category, Product, Subcategory};

pub(crate) fn category(key: &str, name: &str) -> Category {
    Category { key: key.into(), name: name.into(), extra: Map::new() }
}

pub(crate) fn subcategory(key: &str, name: &str, parent: &str) -> Subcategory {
    Subcategory { key: key.into(), name: name.into(), parent_category: parent.into(), extra: Map::new() }
}

pub(crate) fn product(key: &str, category: &str, subcategory: &str) -> Product {
    Product {
        key: key.into(),
        name: format!("product {key}"),
        category: category.into(),
        subcategory: subcategory.into(),
        description: "desc".into(),
        price: 9.99,
        images: vec![],
        created_at: Some(crate::timestamp::format(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())),
        extra: Map::new(),
    }
}

/// Two categories, three subcategories, three products spread across them.
pub(crate) fn sample() -> CatalogDocument {
    CatalogDocument {
        categories: vec![category("c1", "Drinks"), category("c2", "Food")],
        subcategories: vec![
            subcategory("s1", "Hot", "c1"),
            subcategory("s2", "Cold", "c1"),
            subcategory("s3", "Snacks", "c2"),
        ],
        products: vec![product("p1", "c1", "s1"), product("p2", "c1", ""), product("p3", "c2", "s3")],
    }
}
