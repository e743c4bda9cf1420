//! Host-based tenant resolution, directly and through the HTTP surface.

use anyhow::Result;
use axum::http::StatusCode;
use sea_orm::{EntityTrait, ModelTrait};
use storefront::models::Tenant;
use storefront::tenancy::{TenantResolutionError, TenantResolver};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_tenant, get, send, setup_test_db, test_app};

fn resolver(db: &sea_orm::DatabaseConnection) -> TenantResolver {
    TenantResolver::new(
        db.clone(),
        vec!["localhost".into(), "127.0.0.1".into(), "::1".into()],
        16,
    )
}

#[tokio::test]
async fn exact_domain_selects_its_tenant() -> Result<()> {
    let db = setup_test_db().await?;
    let shop_a = create_tenant(&db, "Shop A", "shop-a.example.com").await?;
    create_tenant(&db, "Shop B", "shop-b.example.com").await?;

    let resolved = resolver(&db).resolve("Shop-A.example.com:443").await?;
    assert_eq!(resolved.id, shop_a.id);
    Ok(())
}

#[tokio::test]
async fn development_host_selects_first_tenant_regardless_of_domain() -> Result<()> {
    let db = setup_test_db().await?;
    let first = create_tenant(&db, "First", "first.example.com").await?;
    create_tenant(&db, "Second", "second.example.com").await?;

    let resolver = resolver(&db);
    assert_eq!(resolver.resolve("localhost:5173").await?.id, first.id);
    assert_eq!(resolver.resolve("[::1]:8080").await?.id, first.id);
    Ok(())
}

#[tokio::test]
async fn stored_url_domain_matches_by_substring() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant = create_tenant(&db, "Phone Hub", "https://www.phonehub.in/").await?;

    let resolved = resolver(&db).resolve("www.phonehub.in").await?;
    assert_eq!(resolved.id, tenant.id);
    Ok(())
}

#[tokio::test]
async fn unknown_and_ambiguous_hosts_are_errors() -> Result<()> {
    let db = setup_test_db().await?;
    create_tenant(&db, "Shop", "shop.example.com").await?;
    create_tenant(&db, "Shop Mirror", "shop.example.com.mirror.net").await?;

    let resolver = resolver(&db);
    assert!(matches!(
        resolver.resolve("nowhere.example.org").await,
        Err(TenantResolutionError::NotFound(host)) if host == "nowhere.example.org"
    ));
    // Contained in both domains, equal to neither.
    assert!(matches!(
        resolver.resolve("example.com").await,
        Err(TenantResolutionError::Ambiguous { matches: 2, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn exact_domain_wins_over_longer_domains_containing_it() -> Result<()> {
    let db = setup_test_db().await?;
    let shop = create_tenant(&db, "Shop", "shop.com").await?;
    let myshop = create_tenant(&db, "My Shop", "myshop.com").await?;

    let resolver = resolver(&db);
    assert_eq!(resolver.resolve("shop.com").await?.id, shop.id);
    assert_eq!(resolver.resolve("myshop.com").await?.id, myshop.id);
    Ok(())
}

#[tokio::test]
async fn exact_match_compares_the_host_of_url_domains() -> Result<()> {
    let db = setup_test_db().await?;
    let hub = create_tenant(&db, "Phone Hub", "https://phonehub.in/").await?;
    create_tenant(&db, "Phone Hub Outlet", "outlet.phonehub.in").await?;

    assert_eq!(resolver(&db).resolve("phonehub.in").await?.id, hub.id);
    Ok(())
}

#[tokio::test]
async fn successes_are_cached_for_the_process_lifetime() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant = create_tenant(&db, "Cached", "cached.example.com").await?;

    let resolver = resolver(&db);
    resolver.resolve("cached.example.com").await?;

    // Removing the row does not evict the cached record.
    tenant.clone().delete(&db).await?;
    assert!(Tenant::find_by_id(tenant.id).one(&db).await?.is_none());
    assert_eq!(resolver.resolve("cached.example.com").await?.id, tenant.id);
    Ok(())
}

#[tokio::test]
async fn failures_are_not_cached() -> Result<()> {
    let db = setup_test_db().await?;
    let resolver = resolver(&db);

    assert!(resolver.resolve("late.example.com").await.is_err());
    let tenant = create_tenant(&db, "Late", "late.example.com").await?;
    assert_eq!(resolver.resolve("late.example.com").await?.id, tenant.id);
    Ok(())
}

#[tokio::test]
async fn tenant_endpoint_returns_branding() -> Result<()> {
    let db = setup_test_db().await?;
    create_tenant(&db, "Shop A", "shop-a.example.com").await?;
    let app = test_app(&db);

    let (status, body) = send(&app, get("/api/v1/tenant", "shop-a.example.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Shop A");
    assert_eq!(body["primary_color"], "#1d4ed8");
    assert_eq!(body["mobile_number"], "+91 98765 43210");
    Ok(())
}

#[tokio::test]
async fn unknown_host_is_a_blocking_404() -> Result<()> {
    let db = setup_test_db().await?;
    create_tenant(&db, "Shop A", "shop-a.example.com").await?;
    let app = test_app(&db);

    let (status, body) = send(&app, get("/api/v1/products", "unknown.example.org")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TENANT_NOT_FOUND");
    assert_eq!(body["details"]["host"], "unknown.example.org");
    assert!(body["trace_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn ambiguous_host_is_a_conflict() -> Result<()> {
    let db = setup_test_db().await?;
    create_tenant(&db, "One", "shop.example.com").await?;
    create_tenant(&db, "Two", "shop.example.com.au").await?;
    let app = test_app(&db);

    let (status, body) = send(&app, get("/api/v1/tenant", "example.com")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TENANT_AMBIGUOUS");

    let (status, body) = send(&app, get("/api/v1/tenant", "shop.example.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "One");
    Ok(())
}

#[tokio::test]
async fn root_and_health_need_no_tenant() -> Result<()> {
    let db = setup_test_db().await?;
    let app = test_app(&db);

    let (status, body) = send(&app, get("/", "unknown.example.org")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "storefront");

    let (status, body) = send(&app, get("/healthz", "unknown.example.org")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
    Ok(())
}
