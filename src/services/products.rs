//! Admin product writes: form validation, image upload fan-out and the
//! tenant-scoped database write.
//!
//! Uploads finish before the row is written. There is no transaction across
//! the two; objects uploaded for a write that later fails are left in place.

use axum::body::Bytes;
use axum::extract::Multipart;
use futures::future::try_join_all;
use metrics::counter;
use sea_orm::DatabaseConnection;
use serde_json::{Map, Value, json};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ApiError, ErrorType, RepositoryError, not_found, validation_error};
use crate::models::product::{self, PLACEHOLDER_IMAGE_URL};
use crate::repositories::{ProductRecord, ProductRepository};
use crate::storage::{ObjectStore, StorageError, object_key};

/// A file part from the `images` field
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Raw admin product form, as submitted
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub discount: Option<String>,
    pub description: Option<String>,
    pub in_stock: Option<String>,
    /// Gallery URLs the admin kept (edit form only)
    pub existing_images: Vec<String>,
    pub images: Vec<ImageUpload>,
}

impl ProductForm {
    /// Read a `multipart/form-data` body. Unknown fields are ignored, as are
    /// empty file parts (a file input left blank).
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "images" => {
                    let filename = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if !bytes.is_empty() {
                        form.images.push(ImageUpload {
                            filename,
                            content_type,
                            bytes,
                        });
                    }
                }
                "existing_images" => {
                    let url = field.text().await.map_err(multipart_error)?;
                    form.existing_images.push(url);
                }
                "name" | "brand" | "category" | "price" | "discount" | "description"
                | "in_stock" => {
                    let value = field.text().await.map_err(multipart_error)?;
                    let slot = match name.as_str() {
                        "name" => &mut form.name,
                        "brand" => &mut form.brand,
                        "category" => &mut form.category,
                        "price" => &mut form.price,
                        "discount" => &mut form.discount,
                        "description" => &mut form.description,
                        _ => &mut form.in_stock,
                    };
                    *slot = Some(value);
                }
                other => {
                    tracing::debug!(field = other, "Ignoring unknown product form field");
                }
            }
        }

        Ok(form)
    }

    /// Check every field and collect the failures by field name.
    pub fn validate(&self) -> Result<ValidatedProduct, ProductServiceError> {
        let mut errors = Map::new();

        let name = required_text(&self.name, "name", &mut errors);
        let brand = required_text(&self.brand, "brand", &mut errors);
        let category = required_text(&self.category, "category", &mut errors);

        let price = match parse_number(self.price.as_deref()) {
            None => {
                errors.insert("price".into(), json!("Price is required"));
                0.0
            }
            Some(Err(())) => {
                errors.insert("price".into(), json!("Price must be a number"));
                0.0
            }
            Some(Ok(value)) if value <= 0.0 => {
                errors.insert("price".into(), json!("Price must be greater than 0"));
                value
            }
            Some(Ok(value)) => value,
        };

        let discount = match parse_number(self.discount.as_deref()) {
            None => 0.0,
            Some(Err(())) => {
                errors.insert("discount".into(), json!("Discount must be a number"));
                0.0
            }
            Some(Ok(value)) if !(0.0..=100.0).contains(&value) => {
                errors.insert(
                    "discount".into(),
                    json!("Discount must be between 0 and 100"),
                );
                value
            }
            Some(Ok(value)) => value,
        };

        let in_stock = match self.in_stock.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "on" | "1" | "yes" => Some(true),
                "false" | "off" | "0" | "no" => Some(false),
                _ => {
                    errors.insert("in_stock".into(), json!("In stock must be true or false"));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(ProductServiceError::Validation(Value::Object(errors)));
        }

        Ok(ValidatedProduct {
            name,
            brand,
            category,
            price,
            discount,
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            in_stock,
        })
    }

    /// Retained gallery URLs in submitted order, without blanks or the
    /// placeholder image.
    fn retained_images(&self) -> Vec<String> {
        self.existing_images
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty() && *url != PLACEHOLDER_IMAGE_URL)
            .map(str::to_string)
            .collect()
    }
}

/// Product fields after validation, before images are attached
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedProduct {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub discount: f64,
    pub description: String,
    /// `None` when the form left the flag out
    pub in_stock: Option<bool>,
}

impl ValidatedProduct {
    /// `stocked` applies when the form did not send `in_stock`.
    fn into_record(self, image_urls: Vec<String>, stocked: bool) -> ProductRecord {
        let image_urls = if image_urls.is_empty() {
            vec![PLACEHOLDER_IMAGE_URL.to_string()]
        } else {
            image_urls
        };

        ProductRecord {
            name: self.name,
            brand: self.brand,
            category: self.category,
            price: self.price,
            discount: self.discount,
            description: self.description,
            in_stock: self.in_stock.unwrap_or(stocked),
            image_urls,
        }
    }
}

fn required_text(value: &Option<String>, field: &str, errors: &mut Map<String, Value>) -> String {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => {
            errors.insert(field.to_string(), json!(format!("{field} is required")));
            String::new()
        }
    }
}

fn parse_number(raw: Option<&str>) -> Option<Result<f64, ()>> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    Some(
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or(()),
    )
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::new(
        err.status(),
        "VALIDATION_FAILED",
        format!("Invalid multipart body: {}", err.body_text()),
    )
}

/// Which write was attempted; selects the message shown on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductAction {
    Create,
    Update,
    Delete,
}

impl ProductAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductAction::Create => "create",
            ProductAction::Update => "update",
            ProductAction::Delete => "delete",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            ProductAction::Create => "Failed to add product",
            ProductAction::Update => "Failed to update product",
            ProductAction::Delete => "Failed to delete product",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProductServiceError {
    #[error("product validation failed")]
    Validation(Value),
    #[error("product not found")]
    NotFound,
    #[error("image upload failed: {0}")]
    Storage(#[from] StorageError),
    #[error("product write failed: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ProductServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(_) => ProductServiceError::NotFound,
            other => ProductServiceError::Repository(other),
        }
    }
}

impl ProductServiceError {
    /// Convert into the HTTP error for `action`. Validation and not-found
    /// keep their own messages; everything else is logged and reported with
    /// the generic failure message.
    pub fn into_api_error(self, action: ProductAction) -> ApiError {
        match self {
            ProductServiceError::Validation(details) => {
                validation_error("Product validation failed", details)
            }
            ProductServiceError::NotFound => not_found("Product not found"),
            other => {
                tracing::error!(
                    operation = action.as_str(),
                    error = %other,
                    "Product write failed"
                );
                let mut error = match other {
                    ProductServiceError::Storage(err) => ApiError::from(err),
                    ProductServiceError::Repository(err) => ApiError::from(err),
                    _ => ApiError::of(
                        ErrorType::InternalServerError,
                        action.failure_message(),
                    ),
                };
                error.message = action.failure_message().into();
                error
            }
        }
    }
}

/// Tenant-scoped product writes
pub struct ProductService<'a> {
    db: &'a DatabaseConnection,
    store: &'a dyn ObjectStore,
}

impl<'a> ProductService<'a> {
    pub fn new(db: &'a DatabaseConnection, store: &'a dyn ObjectStore) -> Self {
        Self { db, store }
    }

    /// Validate, upload new images, then insert the product.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        form: ProductForm,
    ) -> Result<product::Model, ProductServiceError> {
        let result = self.try_create(tenant_id, form).await;

        record_write(ProductAction::Create, &result);
        if let Ok(product) = &result {
            tracing::info!(tenant_id = %tenant_id, product_id = %product.id, "Product created");
        }
        result
    }

    /// Validate, confirm the product belongs to the tenant, upload new
    /// images, then overwrite the row. Retained URLs come first in the
    /// resulting gallery.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        form: ProductForm,
    ) -> Result<product::Model, ProductServiceError> {
        let result = self.try_update(tenant_id, product_id, form).await;

        record_write(ProductAction::Update, &result);
        if result.is_ok() {
            tracing::info!(tenant_id = %tenant_id, product_id = %product_id, "Product updated");
        }
        result
    }

    /// Delete a product of the tenant, then its uploaded images. A product
    /// owned by another tenant is reported as missing and left untouched.
    pub async fn delete(&self, tenant_id: Uuid, product_id: Uuid) -> Result<(), ProductServiceError> {
        let result = self.try_delete(tenant_id, product_id).await;

        record_write(ProductAction::Delete, &result);
        match result {
            Ok(images) => {
                tracing::info!(tenant_id = %tenant_id, product_id = %product_id, "Product deleted");
                self.remove_images(tenant_id, &images).await;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn try_create(
        &self,
        tenant_id: Uuid,
        form: ProductForm,
    ) -> Result<product::Model, ProductServiceError> {
        let fields = form.validate()?;
        let uploaded = self.upload_images(tenant_id, form.images).await?;
        let record = fields.into_record(uploaded, true);

        Ok(ProductRepository::new(self.db)
            .create(tenant_id, record)
            .await?)
    }

    async fn try_update(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        form: ProductForm,
    ) -> Result<product::Model, ProductServiceError> {
        let fields = form.validate()?;
        let repo = ProductRepository::new(self.db);

        let current = repo
            .find_for_tenant(tenant_id, product_id)
            .await?
            .ok_or(ProductServiceError::NotFound)?;

        let mut gallery = form.retained_images();
        gallery.extend(self.upload_images(tenant_id, form.images).await?);
        let record = fields.into_record(gallery, current.in_stock);

        let updated = repo.update_for_tenant(tenant_id, product_id, record).await?;

        let kept = updated.images();
        let dropped: Vec<String> = current
            .images()
            .into_iter()
            .filter(|url| !kept.contains(url))
            .collect();
        self.remove_images(tenant_id, &dropped).await;

        Ok(updated)
    }

    async fn try_delete(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<String>, ProductServiceError> {
        let repo = ProductRepository::new(self.db);
        let current = repo
            .find_for_tenant(tenant_id, product_id)
            .await?
            .ok_or(ProductServiceError::NotFound)?;

        if !repo.delete_for_tenant(tenant_id, product_id).await? {
            return Err(ProductServiceError::NotFound);
        }
        Ok(current.images())
    }

    /// Best-effort removal of images this store uploaded for the tenant.
    /// Foreign URLs (seed data, CDNs, the placeholder) are skipped.
    async fn remove_images(&self, tenant_id: Uuid, urls: &[String]) {
        let prefix = format!("{tenant_id}/");
        for key in urls
            .iter()
            .filter_map(|url| self.store.key_for_url(url))
            .filter(|key| key.starts_with(&prefix))
        {
            if let Err(err) = self.store.delete(&key).await {
                tracing::warn!(tenant_id = %tenant_id, key = %key, error = %err, "Could not remove product image");
            }
        }
    }

    /// Upload all files concurrently; the first failure aborts the batch.
    async fn upload_images(
        &self,
        tenant_id: Uuid,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<String>, StorageError> {
        let puts = uploads.into_iter().map(|upload| async move {
            let key = object_key(tenant_id, upload.filename.as_deref());
            self.store
                .put(&key, upload.content_type.as_deref(), upload.bytes)
                .await
                .map(|stored| stored.public_url)
        });

        try_join_all(puts).await
    }
}

fn record_write<T>(action: ProductAction, result: &Result<T, ProductServiceError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(ProductServiceError::Validation(_)) => "invalid",
        Err(ProductServiceError::NotFound) => "not_found",
        Err(_) => "error",
    };
    counter!(
        "storefront_product_writes_total",
        "operation" => action.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn valid_form() -> ProductForm {
        ProductForm {
            name: Some("  Pixel 8 ".to_string()),
            brand: Some("Google".to_string()),
            category: Some("Trending".to_string()),
            price: Some("59999".to_string()),
            ..ProductForm::default()
        }
    }

    #[test]
    fn defaults_apply_for_optional_fields() {
        let validated = valid_form().validate().unwrap();
        assert_eq!(validated.name, "Pixel 8");
        assert_eq!(validated.discount, 0.0);
        assert_eq!(validated.description, "");
        assert_eq!(validated.in_stock, None);
        assert!(validated.into_record(Vec::new(), true).in_stock);
    }

    #[test]
    fn missing_stock_flag_keeps_the_fallback() {
        let hidden = valid_form().validate().unwrap().into_record(Vec::new(), false);
        assert!(!hidden.in_stock);

        let form = ProductForm {
            in_stock: Some("on".to_string()),
            ..valid_form()
        };
        assert!(form.validate().unwrap().into_record(Vec::new(), false).in_stock);
    }

    #[test]
    fn collects_every_field_error() {
        let form = ProductForm {
            name: Some("   ".to_string()),
            price: Some("0".to_string()),
            discount: Some("101".to_string()),
            ..ProductForm::default()
        };

        let Err(ProductServiceError::Validation(details)) = form.validate() else {
            panic!("expected validation failure");
        };

        for field in ["name", "brand", "category", "price", "discount"] {
            assert!(details.get(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn rejects_non_numeric_price_and_bad_stock_flag() {
        let form = ProductForm {
            price: Some("cheap".to_string()),
            in_stock: Some("maybe".to_string()),
            ..valid_form()
        };

        let Err(ProductServiceError::Validation(details)) = form.validate() else {
            panic!("expected validation failure");
        };
        assert_eq!(details["price"], "Price must be a number");
        assert!(details.get("in_stock").is_some());
    }

    #[test]
    fn discount_bounds_are_inclusive() {
        for discount in ["0", "100", "12.5"] {
            let form = ProductForm {
                discount: Some(discount.to_string()),
                ..valid_form()
            };
            assert!(form.validate().is_ok(), "discount {discount} should pass");
        }
    }

    #[test]
    fn stock_flag_accepts_checkbox_values() {
        let form = ProductForm {
            in_stock: Some("off".to_string()),
            ..valid_form()
        };
        assert_eq!(form.validate().unwrap().in_stock, Some(false));
    }

    #[test]
    fn empty_gallery_falls_back_to_placeholder() {
        let record = valid_form().validate().unwrap().into_record(Vec::new(), true);
        assert_eq!(record.image_urls, vec![PLACEHOLDER_IMAGE_URL.to_string()]);
    }

    #[test]
    fn retained_images_skip_blanks_and_placeholder() {
        let form = ProductForm {
            existing_images: vec![
                "https://cdn.example.com/a.jpg".to_string(),
                " ".to_string(),
                PLACEHOLDER_IMAGE_URL.to_string(),
                "https://cdn.example.com/b.jpg".to_string(),
            ],
            ..valid_form()
        };

        assert_eq!(
            form.retained_images(),
            vec![
                "https://cdn.example.com/a.jpg".to_string(),
                "https://cdn.example.com/b.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn failures_surface_generic_messages() {
        let err = ProductServiceError::Storage(StorageError::Backend("down".into()))
            .into_api_error(ProductAction::Create);
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(&*err.message, "Failed to add product");

        let err = ProductServiceError::Repository(RepositoryError::database_error(
            sea_orm::DbErr::Custom("boom".into()),
        ))
        .into_api_error(ProductAction::Delete);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&*err.message, "Failed to delete product");

        let err = ProductServiceError::NotFound.into_api_error(ProductAction::Update);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
