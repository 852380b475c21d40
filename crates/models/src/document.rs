use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{Category, Product, Subcategory};

/// The single persisted unit: every write replaces the whole document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Value of the `type` discriminator carried by every mutating request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Category,
    Subcategory,
    Product,
    All,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::Product => "product",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Self::Category),
            "subcategory" => Ok(Self::Subcategory),
            "product" => Ok(Self::Product),
            "all" => Ok(Self::All),
            other => Err(ModelError::UnknownType(other.to_string())),
        }
    }
}

/// How many entities a delete took out of each collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Removed {
    pub categories: usize,
    pub subcategories: usize,
    pub products: usize,
}

impl Removed {
    pub fn total(&self) -> usize {
        self.categories + self.subcategories + self.products
    }
}

fn retain_counting<T>(items: &mut Vec<T>, keep: impl FnMut(&T) -> bool) -> usize {
    let before = items.len();
    items.retain(keep);
    before - items.len()
}

impl CatalogDocument {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.subcategories.is_empty() && self.products.is_empty()
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn subcategory(&self, key: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.key == key)
    }

    pub fn product(&self, key: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.key == key)
    }

    /// Removes the category and every subcategory parented to it.
    ///
    /// Products that point at the category (or at one of the removed
    /// subcategories) are left as they are.
    pub fn remove_category(&mut self, key: &str) -> Removed {
        Removed {
            categories: retain_counting(&mut self.categories, |c| c.key != key),
            subcategories: retain_counting(&mut self.subcategories, |s| s.parent_category != key),
            products: 0,
        }
    }

    pub fn remove_subcategory(&mut self, key: &str) -> Removed {
        Removed {
            subcategories: retain_counting(&mut self.subcategories, |s| s.key != key),
            ..Removed::default()
        }
    }

    pub fn remove_product(&mut self, key: &str) -> Removed {
        Removed {
            products: retain_counting(&mut self.products, |p| p.key != key),
            ..Removed::default()
        }
    }

    pub fn clear(&mut self) -> Removed {
        let removed = Removed {
            categories: self.categories.len(),
            subcategories: self.subcategories.len(),
            products: self.products.len(),
        };
        self.categories.clear();
        self.subcategories.clear();
        self.products.clear();
        removed
    }

    /// Delete dispatch shared by the API and the offline client.
    ///
    /// A missing key matches nothing; `All` ignores the key.
    pub fn apply_delete(&mut self, kind: EntityKind, key: Option<&str>) -> Removed {
        match (kind, key) {
            (EntityKind::All, _) => self.clear(),
            (_, None) => Removed::default(),
            (EntityKind::Category, Some(k)) => self.remove_category(k),
            (EntityKind::Subcategory, Some(k)) => self.remove_subcategory(k),
            (EntityKind::Product, Some(k)) => self.remove_product(k),
        }
    }

    /// Renames a subcategory in place; `None` when no subcategory has `key`.
    pub fn rename_subcategory(&mut self, key: &str, name: &str) -> Option<&Subcategory> {
        let sub = self.subcategories.iter_mut().find(|s| s.key == key)?;
        sub.name = name.trim().to_string();
        Some(&*sub)
    }

    /// Replaces `old` with `new` as an entity key and in every reference to it.
    pub fn rekey(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        for c in self.categories.iter_mut().filter(|c| c.key == old) {
            c.key = new.to_string();
        }
        for s in self.subcategories.iter_mut() {
            if s.key == old {
                s.key = new.to_string();
            }
            if s.parent_category == old {
                s.parent_category = new.to_string();
            }
        }
        for p in self.products.iter_mut() {
            if p.key == old {
                p.key = new.to_string();
            }
            if p.category == old {
                p.category = new.to_string();
            }
            if p.subcategory == old {
                p.subcategory = new.to_string();
            }
        }
    }
}
