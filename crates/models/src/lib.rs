//! Catalog data model: the three entity types, the persisted document that
//! holds them, and the pure mutations applied to that document.

pub mod errors;
pub mod keys;
pub mod lenient;
pub mod timestamp;
pub mod category;
pub mod subcategory;
pub mod product;
pub mod document;

pub use category::{Category, NewCategory};
pub use document::{CatalogDocument, EntityKind, Removed};
pub use product::{NewProduct, PriceInput, Product};
pub use subcategory::{NewSubcategory, RenameSubcategory, Subcategory};

#[cfg(test)]
mod tests;
