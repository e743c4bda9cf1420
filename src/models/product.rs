//! Product entity model
//!
//! This module contains the SeaORM entity model for the products table and
//! the accessor that normalises the two image storage layouts (legacy single
//! `image_url` column vs the `image_urls` gallery array) into one ordered list.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

use crate::catalog::effective_price;

/// Image shown when a product has no stored images at all
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/400x300?text=No+Image";

/// Product entity, always owned by exactly one tenant
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning tenant
    pub tenant_id: Uuid,

    pub name: String,

    pub brand: String,

    /// Open category string (e.g. "Trending", "New Arrival")
    pub category: String,

    /// List price (MRP), never negative
    #[sea_orm(column_type = "Double")]
    pub price: f64,

    /// Discount percentage in `[0, 100]`
    #[sea_orm(column_type = "Double")]
    pub discount: f64,

    pub description: String,

    /// Public visibility flag
    pub in_stock: bool,

    /// Ordered gallery, stored as a JSON array of URLs
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub image_urls: Option<JsonValue>,

    /// Legacy single image column
    pub image_url: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Image layout found on a stored product row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredImages {
    /// Current layout: ordered gallery array
    Gallery(Vec<String>),
    /// Rows written before galleries existed
    Legacy(String),
    /// Neither column holds a usable URL
    Missing,
}

impl StoredImages {
    /// Classify the raw column values. A gallery wins over the legacy column
    /// as long as it holds at least one non-blank URL.
    pub fn from_columns(image_urls: Option<&JsonValue>, image_url: Option<&str>) -> Self {
        let gallery: Vec<String> = image_urls
            .and_then(JsonValue::as_array)
            .map(|urls| {
                urls.iter()
                    .filter_map(JsonValue::as_str)
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if !gallery.is_empty() {
            return StoredImages::Gallery(gallery);
        }

        match image_url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => StoredImages::Legacy(url.to_string()),
            None => StoredImages::Missing,
        }
    }

    /// Flatten into the ordered list the views work with. Never empty.
    pub fn into_urls(self) -> Vec<String> {
        match self {
            StoredImages::Gallery(urls) => urls,
            StoredImages::Legacy(url) => vec![url],
            StoredImages::Missing => vec![PLACEHOLDER_IMAGE_URL.to_string()],
        }
    }
}

impl Model {
    pub fn stored_images(&self) -> StoredImages {
        StoredImages::from_columns(self.image_urls.as_ref(), self.image_url.as_deref())
    }

    /// Normalised, non-empty image list
    pub fn images(&self) -> Vec<String> {
        self.stored_images().into_urls()
    }

    /// Price after applying the percentage discount
    pub fn effective_price(&self) -> f64 {
        effective_price(self.price, self.discount)
    }

    /// Amount saved against the list price
    pub fn savings(&self) -> f64 {
        self.price - self.effective_price()
    }
}
