use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    #[serde(default, deserialize_with = "crate::lenient::string")]
    pub key: String,
    #[serde(default, deserialize_with = "crate::lenient::string")]
    pub name: String,
    /// Key of the owning category; not checked against `categories`.
    #[serde(default, deserialize_with = "crate::lenient::string")]
    pub parent_category: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubcategory {
    pub name: String,
    pub parent_category: String,
}

impl NewSubcategory {
    pub fn into_subcategory(self, key: String) -> Subcategory {
        Subcategory {
            key,
            name: self.name.trim().to_string(),
            parent_category: self.parent_category,
            extra: Map::new(),
        }
    }
}

/// Body of a rename request; only subcategories can be renamed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenameSubcategory {
    pub key: String,
    pub name: String,
}
