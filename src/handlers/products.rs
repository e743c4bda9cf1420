//! # Public Catalog Handlers
//!
//! Read-only endpoints for shoppers: the filtered catalog, the featured
//! carousel, filter facets, product detail and the WhatsApp inquiry link.
//! Only in-stock products of the resolved tenant are ever returned.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::catalog::{self, PRICE_BUCKETS, ProductFilter, SearchScope, SortOrder};
use crate::error::{ApiError, not_found, validation_error};
use crate::gallery::{Carousel, Gallery};
use crate::handlers::invalid_path;
use crate::handlers::types::{PaginatedResponse, ProductView};
use crate::inquiry::{compose_inquiry, whatsapp_link};
use crate::repositories::ProductRepository;
use crate::server::AppState;
use crate::tenancy::ResolvedTenant;

/// Interval the client should use for the featured carousel timer
pub const CAROUSEL_INTERVAL_MS: u64 = 5000;

const MAX_PER_PAGE: u64 = 100;

/// Query parameters for the catalog listing
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListProductsQuery {
    /// Case-insensitive match on name or brand
    pub search: Option<String>,
    /// Exact category; `All` disables the filter
    pub category: Option<String>,
    /// Exact brand; `All` disables the filter
    pub brand: Option<String>,
    /// Inclusive list-price range `min-max`; `all` disables the filter
    #[param(example = "10000-30000")]
    pub price_range: Option<String>,
    /// `newest` (default), `price-low` or `price-high`
    pub sort: Option<String>,
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Page size (default from configuration, max 100)
    pub per_page: Option<u64>,
}

/// Resolve the page size: the configured default, or a requested size in `1..=100`.
pub(crate) fn page_size(requested: Option<u64>, default: u64) -> Result<u64, ApiError> {
    match requested {
        None => Ok(default),
        Some(size) if (1..=MAX_PER_PAGE).contains(&size) => Ok(size),
        Some(_) => Err(validation_error(
            "per_page must be between 1 and 100",
            serde_json::json!({ "per_page": "must be between 1 and 100" }),
        )),
    }
}

/// Filtered, sorted, paginated catalog of the storefront
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "One page of in-stock products", body = PaginatedResponse<ProductView>),
        (status = 400, description = "Invalid filter, sort or paging parameter", body = ApiError),
        (status = 404, description = "No storefront is bound to this host", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    tenant: ResolvedTenant,
    query: Result<Query<ListProductsQuery>, QueryRejection>,
) -> Result<Json<PaginatedResponse<ProductView>>, ApiError> {
    let Query(query) = query?;

    let sort: SortOrder = query.sort.as_deref().unwrap_or_default().parse()?;
    let price_range = catalog::parse_price_range(query.price_range.as_deref())?;
    let per_page = page_size(query.per_page, state.config.catalog_page_size)?;

    let filter = ProductFilter::new(SearchScope::Catalog)
        .search(query.search)
        .category(query.category)
        .brand(query.brand)
        .price_range(price_range);

    let products = ProductRepository::new(&state.db)
        .list_in_stock_for_tenant(tenant.id())
        .await?;

    let matching = catalog::apply(&products, &filter, sort);
    let page = catalog::paginate(matching, query.page.unwrap_or(1), per_page);

    Ok(Json(page.map(ProductView::from).into()))
}

/// One slide of the home page carousel
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeaturedSlide {
    /// A featured product
    Product(ProductView),
    /// Shown when nothing is featured
    Welcome { title: String, subtitle: String },
}

/// Query parameters for the featured carousel
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct FeaturedQuery {
    /// Slide to start on; wraps around
    pub start: Option<usize>,
}

/// Featured carousel state
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeaturedResponse {
    /// Never empty
    pub slides: Vec<FeaturedSlide>,
    /// Index of the slide to show first
    pub current: usize,
    /// Slide the timer (or the forward arrow) moves to
    pub next: usize,
    /// Slide the back arrow moves to
    pub previous: usize,
    /// Whether the client should run the auto-advance timer
    pub auto_advance: bool,
    #[schema(example = 5000)]
    pub interval_ms: u64,
}

/// Newest in-stock Trending / New Arrival products for the hero carousel
#[utoipa::path(
    get,
    path = "/api/v1/products/featured",
    params(FeaturedQuery),
    responses(
        (status = 200, description = "Carousel slides", body = FeaturedResponse),
        (status = 404, description = "No storefront is bound to this host", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn featured_products(
    State(state): State<AppState>,
    tenant: ResolvedTenant,
    query: Result<Query<FeaturedQuery>, QueryRejection>,
) -> Result<Json<FeaturedResponse>, ApiError> {
    let Query(query) = query?;

    let featured = ProductRepository::new(&state.db)
        .list_featured_for_tenant(tenant.id())
        .await?;

    let slides = featured
        .into_iter()
        .map(|product| FeaturedSlide::Product(product.into()))
        .collect();
    let welcome = FeaturedSlide::Welcome {
        title: format!("Welcome to {}", tenant.0.name),
        subtitle: "Discover the latest smartphones at the best prices".to_string(),
    };

    let mut carousel = Carousel::with_fallback(slides, welcome);
    if let Some(start) = query.start {
        carousel.select(start % carousel.slides().len());
    }

    let next = carousel.clone().tick();
    let previous = carousel.clone().prev();

    Ok(Json(FeaturedResponse {
        current: carousel.current_index(),
        next,
        previous,
        auto_advance: carousel.auto_advances(),
        interval_ms: CAROUSEL_INTERVAL_MS,
        slides: carousel.into_slides(),
    }))
}

/// A built-in price filter option
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PriceBucket {
    #[schema(example = "Under ₹10,000")]
    pub label: String,
    #[schema(example = "0-10000")]
    pub value: String,
}

/// Filter sidebar options
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FacetsResponse {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub price_ranges: Vec<PriceBucket>,
    pub sort_orders: Vec<SortOrder>,
}

/// Distinct categories and brands among in-stock products
#[utoipa::path(
    get,
    path = "/api/v1/products/facets",
    responses(
        (status = 200, description = "Filter options", body = FacetsResponse),
        (status = 404, description = "No storefront is bound to this host", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn product_facets(
    State(state): State<AppState>,
    tenant: ResolvedTenant,
) -> Result<Json<FacetsResponse>, ApiError> {
    let products = ProductRepository::new(&state.db)
        .list_in_stock_for_tenant(tenant.id())
        .await?;
    let facets = catalog::facets(&products);

    Ok(Json(FacetsResponse {
        categories: facets.categories,
        brands: facets.brands,
        price_ranges: PRICE_BUCKETS
            .iter()
            .map(|(label, value)| PriceBucket {
                label: label.to_string(),
                value: value.to_string(),
            })
            .collect(),
        sort_orders: vec![SortOrder::Newest, SortOrder::PriceLow, SortOrder::PriceHigh],
    }))
}

/// Product detail with its gallery position
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetailResponse {
    pub product: ProductView,
    pub gallery: Gallery,
}

async fn find_visible_product(
    state: &AppState,
    tenant: &ResolvedTenant,
    id: Uuid,
) -> Result<crate::models::product::Model, ApiError> {
    ProductRepository::new(&state.db)
        .find_in_stock_for_tenant(tenant.id(), id)
        .await?
        .ok_or_else(|| not_found("Product not found"))
}

/// An in-stock product of this storefront
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail", body = ProductDetailResponse),
        (status = 400, description = "Malformed product id", body = ApiError),
        (status = 404, description = "Product missing, hidden or owned by another store", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    tenant: ResolvedTenant,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let Path(id) = path.map_err(invalid_path)?;
    let product = find_visible_product(&state, &tenant, id).await?;

    let view = ProductView::from(product);
    let gallery = Gallery::new(view.images.len());

    Ok(Json(ProductDetailResponse {
        product: view,
        gallery,
    }))
}

/// Query parameters for the inquiry link
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct InquiryQuery {
    /// Gallery index of the image being viewed; wraps around
    pub image: Option<usize>,
    /// Link back to the product page, appended to the message
    pub link: Option<String>,
}

/// Pre-filled WhatsApp inquiry
#[derive(Debug, Serialize, ToSchema)]
pub struct InquiryResponse {
    pub message: String,
    /// `None` when the store has no usable contact number
    pub whatsapp_url: Option<String>,
    pub image_url: String,
    pub gallery: Gallery,
}

/// WhatsApp message and deep link for one product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/inquiry",
    params(("id" = String, Path, description = "Product id"), InquiryQuery),
    responses(
        (status = 200, description = "Inquiry message and link", body = InquiryResponse),
        (status = 400, description = "Malformed product id or query", body = ApiError),
        (status = 404, description = "Product missing, hidden or owned by another store", body = ApiError)
    ),
    tag = "catalog"
)]
pub async fn product_inquiry(
    State(state): State<AppState>,
    tenant: ResolvedTenant,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<InquiryQuery>, QueryRejection>,
) -> Result<Json<InquiryResponse>, ApiError> {
    let Path(id) = path.map_err(invalid_path)?;
    let Query(query) = query?;
    let product = find_visible_product(&state, &tenant, id).await?;

    let images = product.images();
    let gallery = Gallery::starting_at(images.len(), query.image.unwrap_or(0));
    let image_url = images
        .get(gallery.current())
        .cloned()
        .unwrap_or_default();

    let link = query.link.as_deref().map(str::trim).filter(|l| !l.is_empty());
    let message = compose_inquiry(&tenant.0.name, &product, &image_url, link);

    let whatsapp_url = whatsapp_link(
        &state.config.whatsapp_base_url,
        &tenant.0.mobile_number,
        &message,
    )
    .inspect_err(|err| {
        tracing::warn!(
            tenant_id = %tenant.id(),
            product_id = %product.id,
            error = %err,
            "Could not build WhatsApp link"
        );
    })
    .ok();

    Ok(Json(InquiryResponse {
        message,
        whatsapp_url,
        image_url,
        gallery,
    }))
}
