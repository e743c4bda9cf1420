//! # Tenant Resolution
//!
//! Maps the request `Host` header to a storefront. Development hosts always
//! get the first tenant in table order; every other host must be contained in
//! exactly one tenant's stored domain. Successful lookups are cached for the
//! life of the process and handed to handlers as a [`ResolvedTenant`]
//! request extension.

use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::HOST, request::Parts},
    middleware::Next,
    response::Response,
};
use lru::LruCache;
use metrics::counter;
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::error::{ApiError, RepositoryError};
use crate::models::tenant;
use crate::repositories::TenantRepository;
use crate::server::AppState;

/// Why a host could not be mapped to a storefront
#[derive(Debug, Error)]
pub enum TenantResolutionError {
    #[error("request has no host")]
    MissingHost,
    #[error("invalid host '{0}'")]
    InvalidHost(String),
    #[error("no tenant matches host '{0}'")]
    NotFound(String),
    #[error("{matches} tenants match host '{host}'")]
    Ambiguous { host: String, matches: usize },
    #[error("tenant lookup failed: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl From<RepositoryError> for TenantResolutionError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(db_err) => Self::Database(db_err),
            other => Self::Database(sea_orm::DbErr::Custom(other.to_string())),
        }
    }
}

/// Lower-case a `Host` header value and strip the port, IPv6 brackets and
/// any trailing dot.
pub fn normalize_host(raw: &str) -> Result<String, TenantResolutionError> {
    let lowered = raw.trim().to_ascii_lowercase();

    let host = if let Some(rest) = lowered.strip_prefix('[') {
        // [v6]:port
        rest.split_once(']')
            .map(|(inner, _)| inner)
            .ok_or_else(|| TenantResolutionError::InvalidHost(raw.to_string()))?
    } else if lowered.matches(':').count() == 1 {
        lowered
            .split_once(':')
            .map(|(name, _)| name)
            .unwrap_or(lowered.as_str())
    } else {
        lowered.as_str()
    };

    let host = host.trim_end_matches('.');

    if host.is_empty() {
        return Err(TenantResolutionError::MissingHost);
    }

    let valid = host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));
    if !valid {
        return Err(TenantResolutionError::InvalidHost(raw.to_string()));
    }

    Ok(host.to_string())
}

/// Host part of a stored domain, which may be a bare host or a full URL.
pub fn domain_host(stored: &str) -> String {
    let stored = stored.trim().to_ascii_lowercase();
    let host = match Url::parse(&stored) {
        Ok(url) if url.has_host() => url.host_str().unwrap_or_default().to_string(),
        _ => stored
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    normalize_host(&host).unwrap_or(host)
}

/// Whether `host` (already normalised) is one of the configured development hosts
pub fn is_development_host(host: &str, dev_hosts: &[String]) -> bool {
    dev_hosts.iter().any(|dev| dev.eq_ignore_ascii_case(host))
}

/// Resolves hosts to tenants, caching successes per normalised host.
pub struct TenantResolver {
    db: DatabaseConnection,
    dev_hosts: Vec<String>,
    cache: Mutex<LruCache<String, Arc<tenant::Model>>>,
}

impl TenantResolver {
    pub fn new(db: DatabaseConnection, dev_hosts: Vec<String>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            db,
            dev_hosts,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Resolve a raw `Host` header value.
    pub async fn resolve(&self, raw_host: &str) -> Result<Arc<tenant::Model>, TenantResolutionError> {
        let host = normalize_host(raw_host)?;

        if let Some(tenant) = self.cache.lock().await.get(&host).cloned() {
            counter!("storefront_tenant_cache_hits_total").increment(1);
            return Ok(tenant);
        }
        counter!("storefront_tenant_cache_misses_total").increment(1);

        let tenant = Arc::new(self.lookup(&host).await?);
        tracing::info!(
            host = %host,
            tenant_id = %tenant.id,
            tenant_name = %tenant.name,
            "Resolved tenant for host"
        );

        self.cache.lock().await.put(host, Arc::clone(&tenant));
        Ok(tenant)
    }

    async fn lookup(&self, host: &str) -> Result<tenant::Model, TenantResolutionError> {
        let repo = TenantRepository::new(&self.db);

        if is_development_host(host, &self.dev_hosts) {
            tracing::debug!(host = %host, "Development host, using first tenant");
            return repo
                .find_first()
                .await?
                .ok_or_else(|| TenantResolutionError::NotFound(host.to_string()));
        }

        let mut matches = repo.find_by_domain_match(host).await?;
        match matches.len() {
            0 => Err(TenantResolutionError::NotFound(host.to_string())),
            1 => Ok(matches.remove(0)),
            count => {
                // An exact domain beats substring hits from longer domains.
                let mut exact: Vec<_> = matches
                    .into_iter()
                    .filter(|tenant| domain_host(&tenant.domain) == host)
                    .collect();
                if exact.len() == 1 {
                    return Ok(exact.remove(0));
                }
                Err(TenantResolutionError::Ambiguous {
                    host: host.to_string(),
                    matches: count,
                })
            }
        }
    }
}

/// The storefront the current request belongs to
#[derive(Debug, Clone)]
pub struct ResolvedTenant(pub Arc<tenant::Model>);

impl ResolvedTenant {
    pub fn id(&self) -> uuid::Uuid {
        self.0.id
    }
}

/// Resolve the tenant from the `Host` header and attach it to the request.
pub async fn tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().host().map(str::to_string))
        .ok_or(TenantResolutionError::MissingHost)?;

    let tenant = state.tenants.resolve(&host).await.inspect_err(|err| {
        tracing::warn!(host = %host, error = %err, "Tenant resolution failed");
    })?;

    request.extensions_mut().insert(ResolvedTenant(tenant));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for ResolvedTenant
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedTenant>()
            .cloned()
            .ok_or_else(|| TenantResolutionError::MissingHost.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_port_and_case() {
        assert_eq!(
            normalize_host("Shop-A.Example.com:8080").unwrap(),
            "shop-a.example.com"
        );
        assert_eq!(normalize_host("shop-a.example.com.").unwrap(), "shop-a.example.com");
        assert_eq!(normalize_host("localhost:5173").unwrap(), "localhost");
    }

    #[test]
    fn normalize_handles_ipv6_literals() {
        assert_eq!(normalize_host("[::1]:8080").unwrap(), "::1");
        assert_eq!(normalize_host("[::1]").unwrap(), "::1");
        assert!(matches!(
            normalize_host("[::1"),
            Err(TenantResolutionError::InvalidHost(_))
        ));
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert!(matches!(
            normalize_host("   "),
            Err(TenantResolutionError::MissingHost)
        ));
        assert!(matches!(
            normalize_host("shop%.example.com"),
            Err(TenantResolutionError::InvalidHost(_))
        ));
        assert!(matches!(
            normalize_host("shop_a.example.com"),
            Err(TenantResolutionError::InvalidHost(_))
        ));
    }

    #[test]
    fn domain_host_strips_scheme_path_and_port() {
        assert_eq!(domain_host("shop.example.com"), "shop.example.com");
        assert_eq!(domain_host("https://www.PhoneHub.in/store"), "www.phonehub.in");
        assert_eq!(domain_host("shop.example.com:8080/path"), "shop.example.com");
    }

    #[test]
    fn development_hosts_are_case_insensitive() {
        let dev = vec!["localhost".to_string(), "127.0.0.1".to_string()];
        assert!(is_development_host("localhost", &dev));
        assert!(is_development_host("LOCALHOST", &dev));
        assert!(!is_development_host("shop-a.example.com", &dev));
    }
}
