//! Catalog operations: each one reads the whole document, changes one
//! collection and writes the whole document back.

use std::sync::Arc;

use chrono::Utc;
use models::{
    keys, CatalogDocument, Category, EntityKind, NewCategory, NewProduct, NewSubcategory, Product, Removed,
    RenameSubcategory, Subcategory,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::storage::DocumentStore;

pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
    // Serializes read-modify-write inside this process. Other processes
    // sharing the same backend can still interleave (last writer wins).
    write_lock: Mutex<()>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Arc<Self> {
        Arc::new(Self { store, write_lock: Mutex::new(()) })
    }

    /// The full document as currently persisted.
    pub async fn document(&self) -> CatalogDocument {
        self.store.read().await
    }

    /// Read, apply `f`, write back. Nothing is written when `f` fails.
    async fn mutate<T, F>(&self, what: &str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut CatalogDocument) -> Result<T, ServiceError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.store.read().await;
        let out = f(&mut doc)?;
        if !self.store.write(&doc).await {
            warn!(what, store = %self.store.describe(), "catalog write rejected by store");
            return Err(ServiceError::Storage(format!("failed to save {what}")));
        }
        Ok(out)
    }

    pub async fn create_category(&self, input: NewCategory) -> Result<Category, ServiceError> {
        let created = self
            .mutate("category", |doc| {
                let category = input.into_category(keys::new_key());
                doc.categories.push(category.clone());
                Ok(category)
            })
            .await?;
        info!(key = %created.key, name = %created.name, "created category");
        Ok(created)
    }

    pub async fn create_subcategory(&self, input: NewSubcategory) -> Result<Subcategory, ServiceError> {
        let created = self
            .mutate("subcategory", |doc| {
                let sub = input.into_subcategory(keys::new_key());
                doc.subcategories.push(sub.clone());
                Ok(sub)
            })
            .await?;
        info!(key = %created.key, parent = %created.parent_category, "created subcategory");
        Ok(created)
    }

    pub async fn create_product(&self, input: NewProduct) -> Result<Product, ServiceError> {
        let created = self
            .mutate("product", |doc| {
                let now = Utc::now();
                let product = input.into_product(keys::key_at(now), now);
                doc.products.push(product.clone());
                Ok(product)
            })
            .await?;
        info!(key = %created.key, category = %created.category, price = created.price, "created product");
        Ok(created)
    }

    /// Delete by kind and key. An unrecognised kind removes nothing but the
    /// document is still written back.
    pub async fn delete(&self, kind: Option<EntityKind>, key: Option<&str>) -> Result<Removed, ServiceError> {
        let removed = self
            .mutate("deletion", |doc| Ok(kind.map(|k| doc.apply_delete(k, key)).unwrap_or_default()))
            .await?;
        info!(
            kind = kind.map(|k| k.as_str()).unwrap_or("none"),
            key = key.unwrap_or(""),
            categories = removed.categories,
            subcategories = removed.subcategories,
            products = removed.products,
            "deleted catalog entries"
        );
        Ok(removed)
    }

    pub async fn rename_subcategory(&self, input: RenameSubcategory) -> Result<Subcategory, ServiceError> {
        let renamed = self
            .mutate("subcategory", |doc| {
                doc.rename_subcategory(&input.key, &input.name)
                    .cloned()
                    .ok_or_else(|| ServiceError::not_found("subcategory"))
            })
            .await?;
        info!(key = %renamed.key, name = %renamed.name, "renamed subcategory");
        Ok(renamed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonDocumentStore;
    use crate::test_support::{temp_path, ReadOnlyStore};
    use models::PriceInput;

    async fn file_service(prefix: &str) -> anyhow::Result<(Arc<CatalogService>, std::path::PathBuf)> {
        let path = temp_path(prefix);
        let store = JsonDocumentStore::new(&path).await?;
        Ok((CatalogService::new(store), path))
    }

    fn tea(category: &str, subcategory: Option<&str>) -> NewProduct {
        NewProduct {
            name: " Tea ".into(),
            category: category.into(),
            subcategory: subcategory.map(str::to_string),
            description: "green".into(),
            price: PriceInput::Text("12.5".into()),
            images: None,
        }
    }

    #[tokio::test]
    async fn create_then_list_returns_trimmed_entities() -> anyhow::Result<()> {
        let (svc, path) = file_service("catalog_create").await?;

        let cat = svc.create_category(NewCategory { name: "  Drinks ".into() }).await?;
        assert!(!cat.key.is_empty());
        assert_eq!(cat.name, "Drinks");

        let sub = svc
            .create_subcategory(NewSubcategory { name: "Hot".into(), parent_category: cat.key.clone() })
            .await?;
        let product = svc.create_product(tea(&cat.key, Some(&sub.key))).await?;
        assert_eq!(product.price, 12.5);
        assert_eq!(product.created().map(|at| at.timestamp_millis().to_string()), Some(product.key.clone()));

        let doc = svc.document().await;
        assert_eq!(doc.categories, vec![cat]);
        assert_eq!(doc.subcategories, vec![sub]);
        assert_eq!(doc.products, vec![product]);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_category_keeps_orphaned_products() -> anyhow::Result<()> {
        let (svc, path) = file_service("catalog_cascade").await?;
        let cat = svc.create_category(NewCategory { name: "Drinks".into() }).await?;
        let sub = svc
            .create_subcategory(NewSubcategory { name: "Hot".into(), parent_category: cat.key.clone() })
            .await?;
        svc.create_product(tea(&cat.key, Some(&sub.key))).await?;

        let removed = svc.delete(Some(EntityKind::Category), Some(&cat.key)).await?;
        assert_eq!((removed.categories, removed.subcategories, removed.products), (1, 1, 0));

        let doc = svc.document().await;
        assert!(doc.categories.is_empty());
        assert!(doc.subcategories.is_empty());
        assert_eq!(doc.products.len(), 1);
        assert_eq!(doc.products[0].category, cat.key);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn rename_unknown_subcategory_is_not_found_and_untouched() -> anyhow::Result<()> {
        let (svc, path) = file_service("catalog_rename").await?;
        svc.create_category(NewCategory { name: "Drinks".into() }).await?;
        let before = tokio::fs::read(&path).await?;

        let err = svc
            .rename_subcategory(RenameSubcategory { key: "missing".into(), name: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(tokio::fs::read(&path).await?, before);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_all_and_unknown_kind() -> anyhow::Result<()> {
        let (svc, path) = file_service("catalog_clear").await?;
        let cat = svc.create_category(NewCategory { name: "Drinks".into() }).await?;
        svc.create_product(tea(&cat.key, None)).await?;

        assert_eq!(svc.delete(None, Some(&cat.key)).await?.total(), 0);
        assert_eq!(svc.document().await.categories.len(), 1);

        svc.delete(Some(EntityKind::All), None).await?;
        assert!(svc.document().await.is_empty());

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn unparseable_price_is_stored_as_null() -> anyhow::Result<()> {
        let (svc, path) = file_service("catalog_price").await?;
        let mut blank = tea("1", None);
        blank.price = PriceInput::Text(String::new());
        let mut suffixed = tea("1", None);
        suffixed.price = PriceInput::Text("12.5abc".into());

        assert!(svc.create_product(blank).await?.price.is_nan());
        assert_eq!(svc.create_product(suffixed).await?.price, 12.5);

        let on_disk: serde_json::Value = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
        assert_eq!(on_disk["products"][0]["price"], serde_json::Value::Null);
        assert_eq!(on_disk["products"][1]["price"], 12.5);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn create_over_sparse_document_keeps_existing_entries() -> anyhow::Result<()> {
        let path = temp_path("catalog_sparse");
        let sparse = r#"{"categories":[{"key":"1","name":"Drinks"}],"subcategories":[{"key":"2","name":"Hot"}],"products":[{"key":"3","name":"Tea","price":null}]}"#;
        tokio::fs::write(&path, sparse).await?;
        let svc = CatalogService::new(JsonDocumentStore::new(&path).await?);

        svc.create_category(NewCategory { name: "Food".into() }).await?;

        let doc = svc.document().await;
        let names: Vec<_> = doc.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Drinks", "Food"]);
        assert_eq!(doc.subcategories.len(), 1);
        assert_eq!(doc.subcategories[0].name, "Hot");
        assert_eq!(doc.products.len(), 1);
        assert_eq!(doc.products[0].key, "3");

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn rejected_write_surfaces_as_storage_error() -> anyhow::Result<()> {
        let store = ReadOnlyStore::new(CatalogDocument::default());
        let svc = CatalogService::new(store.clone());

        let err = svc.create_category(NewCategory { name: "Drinks".into() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(ref m) if m == "failed to save category"));
        assert!(matches!(svc.delete(Some(EntityKind::All), None).await, Err(ServiceError::Storage(_))));
        assert_eq!(*store.write_attempts.lock().await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_creates_in_one_process_are_not_lost() -> anyhow::Result<()> {
        let (svc, path) = file_service("catalog_concurrent").await?;
        let mut handles = Vec::new();
        for i in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.create_category(NewCategory { name: format!("cat {i}") }).await
            }));
        }
        for h in handles {
            h.await??;
        }
        assert_eq!(svc.document().await.categories.len(), 8);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }
}
