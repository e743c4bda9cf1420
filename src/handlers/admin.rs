//! # Admin Back Office Handlers
//!
//! Login plus the authenticated product management endpoints. Everything
//! except login sits behind the admin middleware, and every read or write is
//! scoped to the tenant the session was issued for.

use axum::{
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header::LOCATION},
    response::Json,
};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{self, AdminSession};
use crate::catalog::{self, ProductFilter, SearchScope, SortOrder};
use crate::error::{ApiError, ErrorType, not_found, validation_error};
use crate::handlers::invalid_path;
use crate::handlers::types::{PaginatedResponse, ProductView};
use crate::repositories::ProductRepository;
use crate::server::AppState;
use crate::services::{ProductAction, ProductForm, ProductService};
use crate::tenancy::ResolvedTenant;

/// Number of products shown under "recent" on the dashboard
pub const DASHBOARD_RECENT_LIMIT: usize = 5;

/// Login credentials
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "owner@phonehub.example.com")]
    pub email: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

/// Signed-in admin
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminView {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub email: String,
}

/// Session issued on successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// HS256 session token, sent back as `Authorization: Bearer <token>`
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Expiry (RFC 3339)
    pub expires_at: String,
    pub admin: AdminView,
}

/// Sign in to the back office of the storefront serving this host
#[utoipa::path(
    post,
    path = "/api/v1/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError),
        (status = 404, description = "No storefront is bound to this host", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn login(
    State(state): State<AppState>,
    tenant: ResolvedTenant,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    let mut missing = serde_json::Map::new();
    if request.email.trim().is_empty() {
        missing.insert("email".into(), json!("Email is required"));
    }
    if request.password.is_empty() {
        missing.insert("password".into(), json!("Password is required"));
    }
    if !missing.is_empty() {
        return Err(validation_error(
            "Email and password are required",
            serde_json::Value::Object(missing),
        ));
    }

    let admin = auth::authenticate(&state.db, tenant.id(), &request.email, &request.password)
        .await
        .inspect_err(|_| {
            tracing::info!(tenant_id = %tenant.id(), "Admin login rejected");
        })?;

    let secret = state
        .config
        .session_secret()
        .map_err(|err| ApiError::from(anyhow::Error::new(err)))?;
    let (token, claims) = auth::issue_session(secret, &admin, state.config.session_ttl_seconds)
        .map_err(|err| ApiError::from(anyhow::Error::new(err)))?;

    let expires_at = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .map(|at| at.to_rfc3339())
        .unwrap_or_default();

    tracing::info!(tenant_id = %tenant.id(), admin_id = %admin.id, "Admin signed in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_at,
        admin: AdminView {
            id: admin.id,
            email: admin.email,
        },
    }))
}

/// Back office landing stats
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub total_products: u64,
    pub in_stock: u64,
    /// Products hidden from the public catalog
    pub hidden: u64,
    /// Newest products, visible or hidden
    pub recent: Vec<ProductView>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard stats", body = DashboardResponse),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 403, description = "Session belongs to another store", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Json<DashboardResponse>, ApiError> {
    let repo = ProductRepository::new(&state.db);
    let total_products = repo.count_for_tenant(session.tenant_id).await?;
    let in_stock = repo.count_in_stock_for_tenant(session.tenant_id).await?;
    let recent = repo
        .list_for_tenant(session.tenant_id)
        .await?
        .into_iter()
        .take(DASHBOARD_RECENT_LIMIT)
        .map(ProductView::from)
        .collect();

    Ok(Json(DashboardResponse {
        total_products,
        in_stock,
        hidden: total_products.saturating_sub(in_stock),
        recent,
    }))
}

/// Query parameters for the manage list
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct AdminListQuery {
    /// Case-insensitive match on name, brand or category
    pub search: Option<String>,
    /// 1-based page number (default 1)
    pub page: Option<u64>,
}

/// Every product of the store, newest first, with search and fixed-size pages
#[utoipa::path(
    get,
    path = "/api/v1/admin/products",
    security(("bearer_auth" = [])),
    params(AdminListQuery),
    responses(
        (status = 200, description = "One page of products", body = PaginatedResponse<ProductView>),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 403, description = "Session belongs to another store", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn list_admin_products(
    State(state): State<AppState>,
    session: AdminSession,
    query: Result<Query<AdminListQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<ProductView>>, ApiError> {
    let Query(query) = query?;

    let products = ProductRepository::new(&state.db)
        .list_for_tenant(session.tenant_id)
        .await?;

    let filter = ProductFilter::new(SearchScope::Admin).search(query.search);
    let matching = catalog::apply(&products, &filter, SortOrder::Newest);
    let page = catalog::paginate(
        matching,
        query.page.unwrap_or(1),
        state.config.admin_page_size,
    );

    Ok(Json(page.map(ProductView::from).into()))
}

/// Load a product of the session's store, visible or hidden (edit form)
#[utoipa::path(
    get,
    path = "/api/v1/admin/products/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductView),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Product not found in this store", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn get_admin_product(
    State(state): State<AppState>,
    session: AdminSession,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ProductView>, ApiError> {
    let Path(id) = path.map_err(invalid_path)?;

    let product = ProductRepository::new(&state.db)
        .find_for_tenant(session.tenant_id, id)
        .await?
        .ok_or_else(|| not_found("Product not found"))?;

    Ok(Json(product.into()))
}

fn multipart_rejection(rejection: MultipartRejection) -> ApiError {
    ApiError::of(
        ErrorType::BadRequest,
        format!("Expected a multipart/form-data body: {}", rejection.body_text()),
    )
}

/// Add a product. Multipart fields: `name`, `brand`, `category`, `price`,
/// `discount`, `description`, `in_stock` and repeated `images` files.
#[utoipa::path(
    post,
    path = "/api/v1/admin/products",
    security(("bearer_auth" = [])),
    request_body(content_type = "multipart/form-data", description = "Product fields and image files"),
    responses(
        (status = 201, description = "Product created", body = ProductView, headers(
            ("Location", description = "URL of the created product")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 502, description = "Image upload failed", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    session: AdminSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<ProductView>), ApiError> {
    let form = ProductForm::from_multipart(multipart.map_err(multipart_rejection)?).await?;

    let product = ProductService::new(&state.db, state.store.as_ref())
        .create(session.tenant_id, form)
        .await
        .map_err(|err| err.into_api_error(ProductAction::Create))?;

    let location = format!("/api/v1/admin/products/{}", product.id);
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(product.into()),
    ))
}

/// Replace a product. Same fields as create, plus repeated
/// `existing_images` listing the gallery URLs to keep (in order). Leaving
/// out `in_stock` keeps the stored visibility.
#[utoipa::path(
    put,
    path = "/api/v1/admin/products/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Product id")),
    request_body(content_type = "multipart/form-data", description = "Product fields, retained image URLs and new image files"),
    responses(
        (status = 200, description = "Product updated", body = ProductView),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Product not found in this store", body = ApiError),
        (status = 502, description = "Image upload failed", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    session: AdminSession,
    path: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProductView>, ApiError> {
    let Path(id) = path.map_err(invalid_path)?;
    let form = ProductForm::from_multipart(multipart.map_err(multipart_rejection)?).await?;

    let product = ProductService::new(&state.db, state.store.as_ref())
        .update(session.tenant_id, id, form)
        .await
        .map_err(|err| err.into_api_error(ProductAction::Update))?;

    Ok(Json(product.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/products/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Product not found in this store", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    session: AdminSession,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path.map_err(invalid_path)?;

    ProductService::new(&state.db, state.store.as_ref())
        .delete(session.tenant_id, id)
        .await
        .map_err(|err| err.into_api_error(ProductAction::Delete))?;

    Ok(StatusCode::NO_CONTENT)
}
