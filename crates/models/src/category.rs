use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "crate::lenient::string")]
    pub key: String,
    #[serde(default, deserialize_with = "crate::lenient::string")]
    pub name: String,
    /// Fields written by other tools are carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a category creation request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

impl NewCategory {
    pub fn into_category(self, key: String) -> Category {
        Category { key, name: self.name.trim().to_string(), extra: Map::new() }
    }
}
