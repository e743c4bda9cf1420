//! Product repository for database operations
//!
//! Every query here takes the owning tenant id and filters on it. Updates and
//! deletes match on `id` AND `tenant_id`, so a foreign id behaves exactly like
//! a missing one.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::product::{
    ActiveModel as ProductActiveModel, Column as ProductColumn, Entity as Product,
    Model as ProductModel,
};

/// Categories promoted to the home page carousel
pub const FEATURED_CATEGORIES: [&str; 2] = ["Trending", "New Arrival"];

/// Maximum number of slides in the featured carousel
pub const FEATURED_LIMIT: u64 = 5;

/// Validated product fields, as written by the admin back office
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub discount: f64,
    pub description: String,
    pub in_stock: bool,
    /// Final ordered gallery (never empty once it reaches the repository)
    pub image_urls: Vec<String>,
}

/// Repository for product database operations
pub struct ProductRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ProductRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All products of a tenant, newest first (admin views)
    pub async fn list_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<ProductModel>, RepositoryError> {
        Product::find()
            .filter(ProductColumn::TenantId.eq(tenant_id))
            .order_by_desc(ProductColumn::CreatedAt)
            .order_by_desc(ProductColumn::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Publicly visible products of a tenant, newest first
    pub async fn list_in_stock_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<ProductModel>, RepositoryError> {
        Product::find()
            .filter(in_stock_for(tenant_id))
            .order_by_desc(ProductColumn::CreatedAt)
            .order_by_desc(ProductColumn::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Newest in-stock products in a featured category
    pub async fn list_featured_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<ProductModel>, RepositoryError> {
        Product::find()
            .filter(
                in_stock_for(tenant_id).add(ProductColumn::Category.is_in(FEATURED_CATEGORIES)),
            )
            .order_by_desc(ProductColumn::CreatedAt)
            .order_by_desc(ProductColumn::Id)
            .limit(FEATURED_LIMIT)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Any product of the tenant, visible or hidden (admin edit form)
    pub async fn find_for_tenant(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<ProductModel>, RepositoryError> {
        Product::find_by_id(product_id)
            .filter(ProductColumn::TenantId.eq(tenant_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// A publicly visible product of the tenant (product detail page)
    pub async fn find_in_stock_for_tenant(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<ProductModel>, RepositoryError> {
        Product::find_by_id(product_id)
            .filter(in_stock_for(tenant_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert a product owned by `tenant_id`
    pub async fn create(
        &self,
        tenant_id: Uuid,
        record: ProductRecord,
    ) -> Result<ProductModel, RepositoryError> {
        let now = Utc::now();

        let product = ProductActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(record.name),
            brand: Set(record.brand),
            category: Set(record.category),
            price: Set(record.price),
            discount: Set(record.discount),
            description: Set(record.description),
            in_stock: Set(record.in_stock),
            image_urls: Set(Some(gallery_json(record.image_urls))),
            image_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        product
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Overwrite every editable field of a tenant's product.
    ///
    /// The legacy single-image column is cleared; the gallery becomes the
    /// only source of images from here on.
    pub async fn update_for_tenant(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        record: ProductRecord,
    ) -> Result<ProductModel, RepositoryError> {
        let existing = self
            .find_for_tenant(tenant_id, product_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Product"))?;

        let mut product: ProductActiveModel = existing.into();
        product.name = Set(record.name);
        product.brand = Set(record.brand);
        product.category = Set(record.category);
        product.price = Set(record.price);
        product.discount = Set(record.discount);
        product.description = Set(record.description);
        product.in_stock = Set(record.in_stock);
        product.image_urls = Set(Some(gallery_json(record.image_urls)));
        product.image_url = Set(None);
        product.updated_at = Set(Utc::now().into());

        product
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Delete a tenant's product. Returns `false` when nothing matched.
    pub async fn delete_for_tenant(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let result = Product::delete_many()
            .filter(ProductColumn::Id.eq(product_id))
            .filter(ProductColumn::TenantId.eq(tenant_id))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_for_tenant(&self, tenant_id: Uuid) -> Result<u64, RepositoryError> {
        Product::find()
            .filter(ProductColumn::TenantId.eq(tenant_id))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn count_in_stock_for_tenant(&self, tenant_id: Uuid) -> Result<u64, RepositoryError> {
        Product::find()
            .filter(in_stock_for(tenant_id))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

fn in_stock_for(tenant_id: Uuid) -> Condition {
    Condition::all()
        .add(ProductColumn::TenantId.eq(tenant_id))
        .add(ProductColumn::InStock.eq(true))
}

fn gallery_json(urls: Vec<String>) -> JsonValue {
    JsonValue::Array(urls.into_iter().map(JsonValue::String).collect())
}
