//! # Common API Types
//!
//! Response shapes shared by the public catalog and the admin back office,
//! including the page wrapper used by every list endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog::Page;
use crate::models::{product, tenant};

/// Generic paginated response wrapper for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// Items on the requested page (empty when the page is past the end)
    pub data: Vec<T>,
    /// 1-based page number that was requested
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 12)]
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.data,
            page: page.page,
            per_page: page.per_page,
            total_items: page.total_items,
            total_pages: page.total_pages,
        }
    }
}

/// Product as shown to shoppers and admins
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    #[schema(value_type = String, example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "Galaxy S24")]
    pub name: String,
    #[schema(example = "Samsung")]
    pub brand: String,
    #[schema(example = "Trending")]
    pub category: String,
    /// List price (MRP)
    #[schema(example = 50000.0)]
    pub price: f64,
    /// Discount percentage
    #[schema(example = 10.0)]
    pub discount: f64,
    /// Price after discount
    #[schema(example = 45000.0)]
    pub effective_price: f64,
    /// Amount saved against the list price
    #[schema(example = 5000.0)]
    pub savings: f64,
    pub description: String,
    pub in_stock: bool,
    /// Ordered gallery; never empty
    pub images: Vec<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub updated_at: String,
}

impl From<product::Model> for ProductView {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            images: model.images(),
            effective_price: model.effective_price(),
            savings: model.savings(),
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
            name: model.name,
            brand: model.brand,
            category: model.category,
            price: model.price,
            discount: model.discount,
            description: model.description,
            in_stock: model.in_stock,
        }
    }
}

/// Branding record of the resolved storefront
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantView {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(example = "Phone Hub")]
    pub name: String,
    #[schema(example = "phonehub.example.com")]
    pub domain: String,
    #[schema(example = "+91 98765 43210")]
    pub mobile_number: String,
    #[schema(example = "#1d4ed8")]
    pub primary_color: String,
    #[schema(example = "#f59e0b")]
    pub secondary_color: String,
}

impl From<&tenant::Model> for TenantView {
    fn from(model: &tenant::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            domain: model.domain.clone(),
            mobile_number: model.mobile_number.clone(),
            primary_color: model.primary_color.clone(),
            secondary_color: model.secondary_color.clone(),
        }
    }
}
