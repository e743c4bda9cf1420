//! # Catalog View Model
//!
//! Pure filter, search, sort and pagination over an already-fetched product
//! list. Every call recomputes from scratch; there is no incremental state.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::product;

/// Price after applying a percentage discount: `price * (1 - discount / 100)`.
pub fn effective_price(price: f64, discount: f64) -> f64 {
    price * (1.0 - discount / 100.0)
}

/// Built-in price filter buckets: `(label, encoded range)`
pub const PRICE_BUCKETS: [(&str, &str); 5] = [
    ("All Prices", "all"),
    ("Under ₹10,000", "0-10000"),
    ("₹10,000 - ₹30,000", "10000-30000"),
    ("₹30,000 - ₹50,000", "30000-50000"),
    ("Above ₹50,000", "50000-999999"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogQueryError {
    #[error("price range must look like 'min-max', got '{0}'")]
    MalformedPriceRange(String),
    #[error("price range minimum exceeds maximum in '{0}'")]
    InvertedPriceRange(String),
    #[error("unknown sort order '{0}'")]
    UnknownSort(String),
}

/// Inclusive price bounds on the list price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

impl FromStr for PriceRange {
    type Err = CatalogQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || CatalogQueryError::MalformedPriceRange(raw.to_string());

        let (min, max) = raw.trim().split_once('-').ok_or_else(malformed)?;
        let min: f64 = min.trim().parse().map_err(|_| malformed())?;
        let max: f64 = max.trim().parse().map_err(|_| malformed())?;

        if !min.is_finite() || !max.is_finite() {
            return Err(malformed());
        }
        if min > max {
            return Err(CatalogQueryError::InvertedPriceRange(raw.to_string()));
        }

        Ok(Self { min, max })
    }
}

/// Parse the `price_range` query value. Absent, blank and `all` mean no filter.
pub fn parse_price_range(raw: Option<&str>) -> Result<Option<PriceRange>, CatalogQueryError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

/// Catalog ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Newest first by creation time
    #[default]
    Newest,
    /// Price ascending
    PriceLow,
    /// Price descending
    PriceHigh,
}

impl FromStr for SortOrder {
    type Err = CatalogQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "" | "newest" => Ok(SortOrder::Newest),
            "price-low" => Ok(SortOrder::PriceLow),
            "price-high" => Ok(SortOrder::PriceHigh),
            other => Err(CatalogQueryError::UnknownSort(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Newest => "newest",
            SortOrder::PriceLow => "price-low",
            SortOrder::PriceHigh => "price-high",
        })
    }
}

/// Which fields the free-text search looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
    /// Public catalog: name and brand
    #[default]
    Catalog,
    /// Admin manage list: name, brand and category
    Admin,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price_range: Option<PriceRange>,
    pub scope: SearchScope,
}

impl ProductFilter {
    pub fn new(scope: SearchScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    pub fn search(mut self, term: Option<String>) -> Self {
        self.search = term
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = selection(category);
        self
    }

    pub fn brand(mut self, brand: Option<String>) -> Self {
        self.brand = selection(brand);
        self
    }

    pub fn price_range(mut self, range: Option<PriceRange>) -> Self {
        self.price_range = range;
        self
    }

    pub fn matches(&self, product: &product::Model) -> bool {
        if let Some(term) = &self.search {
            let hit = product.name.to_lowercase().contains(term)
                || product.brand.to_lowercase().contains(term)
                || (self.scope == SearchScope::Admin
                    && product.category.to_lowercase().contains(term));
            if !hit {
                return false;
            }
        }

        if self
            .category
            .as_ref()
            .is_some_and(|category| &product.category != category)
        {
            return false;
        }

        if self
            .brand
            .as_ref()
            .is_some_and(|brand| &product.brand != brand)
        {
            return false;
        }

        self.price_range
            .is_none_or(|range| range.contains(product.price))
    }
}

// "All" and blank selections mean "no filter"
fn selection(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Filter then stably sort. The input is expected newest-first, which is
/// also the `Newest` order, so ties keep their recency order.
pub fn apply(
    products: &[product::Model],
    filter: &ProductFilter,
    sort: SortOrder,
) -> Vec<product::Model> {
    let mut result: Vec<product::Model> = products
        .iter()
        .filter(|product| filter.matches(product))
        .cloned()
        .collect();

    match sort {
        SortOrder::Newest => result.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::PriceLow => result.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortOrder::PriceHigh => result.sort_by(|a, b| b.price.total_cmp(&a.price)),
    }

    result
}

/// One page of items (1-based page numbers)
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Slice out `page` of `items`. Pages past the end are empty, not errors.
pub fn paginate<T>(items: Vec<T>, page: u64, per_page: u64) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total_items = items.len() as u64;
    let total_pages = total_items.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page);
    let data = if start >= total_items {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip(start as usize)
            .take(per_page as usize)
            .collect()
    };

    Page {
        data,
        page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Distinct categories and brands for the filter sidebar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Facets {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
}

pub fn facets(products: &[product::Model]) -> Facets {
    let categories: BTreeSet<&str> = products.iter().map(|p| p.category.as_str()).collect();
    let brands: BTreeSet<&str> = products.iter().map(|p| p.brand.as_str()).collect();

    Facets {
        categories: categories.into_iter().map(str::to_string).collect(),
        brands: brands.into_iter().map(str::to_string).collect(),
    }
}
