//! # Server Configuration
//!
//! This module contains the router and server setup for the Storefront API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::admin_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::storage::{LocalObjectStore, ObjectStore};
use crate::telemetry::trace_context_middleware;
use crate::tenancy::{TenantResolver, tenant_middleware};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub tenants: Arc<TenantResolver>,
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    /// Build the state with a tenant resolver sized from `config`.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection, store: Arc<dyn ObjectStore>) -> Self {
        let tenants = Arc::new(TenantResolver::new(
            db.clone(),
            config.dev_hosts.clone(),
            config.tenant_cache_capacity,
        ));
        Self {
            config,
            db,
            tenants,
            store,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let admin = Router::new()
        .route("/dashboard", get(handlers::admin::dashboard))
        .route(
            "/products",
            get(handlers::admin::list_admin_products).post(handlers::admin::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::admin::get_admin_product)
                .put(handlers::admin::update_product)
                .delete(handlers::admin::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ))
        .route("/login", post(handlers::admin::login));

    let api = Router::new()
        .route("/tenant", get(handlers::tenants::current_tenant))
        .route("/products", get(handlers::products::list_products))
        .route(
            "/products/featured",
            get(handlers::products::featured_products),
        )
        .route("/products/facets", get(handlers::products::product_facets))
        .route("/products/{id}", get(handlers::products::get_product))
        .route(
            "/products/{id}/inquiry",
            get(handlers::products::product_inquiry),
        )
        .nest("/admin", admin)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            tenant_middleware,
        ));

    let media = ServeDir::new(&state.config.media_root);
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api)
        .nest_service("/media", media)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(
        config.media_root.clone(),
        config.media_public_base_url.clone(),
    ));
    let state = AppState::new(config.clone(), db, store);
    let app = create_app(state);

    let addr = config.bind_addr().context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(
        address = %addr,
        profile = %config.profile,
        media_root = %config.media_root.display(),
        "Storefront API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::tenants::current_tenant,
        crate::handlers::products::list_products,
        crate::handlers::products::featured_products,
        crate::handlers::products::product_facets,
        crate::handlers::products::get_product,
        crate::handlers::products::product_inquiry,
        crate::handlers::admin::login,
        crate::handlers::admin::dashboard,
        crate::handlers::admin::list_admin_products,
        crate::handlers::admin::get_admin_product,
        crate::handlers::admin::create_product,
        crate::handlers::admin::update_product,
        crate::handlers::admin::delete_product,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthStatus,
            crate::handlers::types::ProductView,
            crate::handlers::types::TenantView,
            crate::handlers::products::FeaturedSlide,
            crate::handlers::products::FeaturedResponse,
            crate::handlers::products::FacetsResponse,
            crate::handlers::products::PriceBucket,
            crate::handlers::products::ProductDetailResponse,
            crate::handlers::products::InquiryResponse,
            crate::handlers::admin::LoginRequest,
            crate::handlers::admin::LoginResponse,
            crate::handlers::admin::AdminView,
            crate::handlers::admin::DashboardResponse,
            crate::catalog::SortOrder,
            crate::gallery::Gallery,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "storefront", description = "Storefront branding"),
        (name = "catalog", description = "Public product catalog"),
        (name = "admin", description = "Back office product management"),
    ),
    info(
        title = "Storefront API",
        description = "Multi-tenant mobile phone storefront",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
