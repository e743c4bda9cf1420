//! # Tenant API Handlers
//!
//! Exposes the branding of the storefront resolved from the request host.

use axum::response::Json;

use crate::error::ApiError;
use crate::handlers::types::TenantView;
use crate::tenancy::ResolvedTenant;

/// Branding record of the storefront serving this host
#[utoipa::path(
    get,
    path = "/api/v1/tenant",
    responses(
        (status = 200, description = "Resolved storefront", body = TenantView),
        (status = 404, description = "No storefront is bound to this host", body = ApiError),
        (status = 409, description = "More than one storefront matches this host", body = ApiError)
    ),
    tag = "storefront"
)]
pub async fn current_tenant(tenant: ResolvedTenant) -> Json<TenantView> {
    Json(TenantView::from(tenant.0.as_ref()))
}
