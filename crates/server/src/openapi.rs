use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct CategoryDoc { pub key: String, pub name: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryDoc { pub key: String, pub name: String, pub parent_category: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDoc {
    pub key: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    /// Null when the submitted price held no number.
    pub price: Option<f64>,
    pub images: Vec<String>,
    /// ISO-8601, millisecond precision.
    pub created_at: String,
}

#[derive(ToSchema)]
pub struct CatalogDocumentDoc {
    pub categories: Vec<CategoryDoc>,
    pub subcategories: Vec<SubcategoryDoc>,
    pub products: Vec<ProductDoc>,
}

/// Creation payload; which fields are required depends on `type`:
/// category → name; subcategory → name, parentCategory;
/// product → name, category, description, price.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestDoc {
    #[serde(rename = "type")]
    #[schema(example = "product")]
    pub kind: String,
    pub name: String,
    pub parent_category: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    /// Number or numeric string.
    #[schema(example = "12.5")]
    pub price: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct RenameRequestDoc {
    #[serde(rename = "type")]
    #[schema(example = "subcategory")]
    pub kind: String,
    pub key: String,
    pub name: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::data::list,
        crate::routes::data::create,
        crate::routes::data::remove,
        crate::routes::data::update,
    ),
    components(
        schemas(
            HealthResponse,
            CategoryDoc,
            SubcategoryDoc,
            ProductDoc,
            CatalogDocumentDoc,
            CreateRequestDoc,
            RenameRequestDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "catalog")
    )
)]
pub struct ApiDoc;
