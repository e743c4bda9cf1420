//! Public catalog endpoints: filtering, sorting, paging, featured carousel,
//! facets, detail and the WhatsApp inquiry link.

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::Value;
use storefront::repositories::ProductRecord;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{
    TestApp, create_product, create_tenant, get, record, send, setup_test_db, test_app,
};

const HOST: &str = "shop.example.com";

async fn seeded_app() -> Result<(sea_orm::DatabaseConnection, TestApp, uuid::Uuid)> {
    let db = setup_test_db().await?;
    let tenant = create_tenant(&db, "Phone Hub", HOST).await?;

    for record in [
        record("Redmi Note 13", "Xiaomi", "Budget", 8999.0),
        record("Nord CE 3", "OnePlus", "Mid Range", 24999.0),
        record("Galaxy S24", "Samsung", "Trending", 79999.0),
        record("Galaxy A54", "Samsung", "New Arrival", 30000.0),
        record("Pixel 8", "Google", "Trending", 10000.0),
    ] {
        create_product(&db, tenant.id, record).await?;
    }
    create_product(
        &db,
        tenant.id,
        ProductRecord {
            in_stock: false,
            ..record("Hidden Phone", "Samsung", "Trending", 15000.0)
        },
    )
    .await?;

    let app = test_app(&db);
    Ok((db, app, tenant.id))
}

fn names(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

fn prices(body: &Value) -> Vec<f64> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_f64().unwrap())
        .collect()
}

#[tokio::test]
async fn lists_in_stock_products_newest_first() -> Result<()> {
    let (_db, app, _) = seeded_app().await?;

    let (status, body) = send(&app, get("/api/v1/products", HOST)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        names(&body),
        vec!["Pixel 8", "Galaxy A54", "Galaxy S24", "Nord CE 3", "Redmi Note 13"]
    );
    assert_eq!(body["total_items"], 5);
    assert_eq!(body["per_page"], 12);
    Ok(())
}

#[tokio::test]
async fn category_filter_and_all() -> Result<()> {
    let (_db, app, _) = seeded_app().await?;

    let (_, body) = send(&app, get("/api/v1/products?category=Trending", HOST)).await;
    assert_eq!(names(&body), vec!["Pixel 8", "Galaxy S24"]);

    let (_, body) = send(&app, get("/api/v1/products?category=All", HOST)).await;
    assert_eq!(body["total_items"], 5);
    Ok(())
}

#[tokio::test]
async fn search_matches_name_or_brand_case_insensitively() -> Result<()> {
    let (_db, app, _) = seeded_app().await?;

    let (_, body) = send(&app, get("/api/v1/products?search=samsung", HOST)).await;
    assert_eq!(names(&body), vec!["Galaxy A54", "Galaxy S24"]);

    // Category is not searched on the public catalog.
    let (_, body) = send(&app, get("/api/v1/products?search=budget", HOST)).await;
    assert_eq!(body["total_items"], 0);
    Ok(())
}

#[tokio::test]
async fn price_range_is_inclusive() -> Result<()> {
    let (_db, app, _) = seeded_app().await?;

    let (status, body) = send(&app, get("/api/v1/products?price_range=10000-30000", HOST)).await;
    assert_eq!(status, StatusCode::OK);
    for price in prices(&body) {
        assert!((10000.0..=30000.0).contains(&price));
    }
    assert_eq!(body["total_items"], 3);
    Ok(())
}

#[tokio::test]
async fn price_sorts_are_monotonic() -> Result<()> {
    let (_db, app, _) = seeded_app().await?;

    let (_, body) = send(&app, get("/api/v1/products?sort=price-low", HOST)).await;
    let low = prices(&body);
    assert!(low.windows(2).all(|w| w[0] <= w[1]));

    let (_, body) = send(&app, get("/api/v1/products?sort=price-high", HOST)).await;
    let high = prices(&body);
    assert!(high.windows(2).all(|w| w[0] >= w[1]));
    Ok(())
}

#[tokio::test]
async fn pagination_past_the_end_is_empty() -> Result<()> {
    let (_db, app, _) = seeded_app().await?;

    let (_, body) = send(&app, get("/api/v1/products?per_page=2&page=2", HOST)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["total_pages"], 3);

    let (status, body) = send(&app, get("/api/v1/products?per_page=2&page=9", HOST)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_query_values_are_rejected() -> Result<()> {
    let (_db, app, _) = seeded_app().await?;

    for uri in [
        "/api/v1/products?price_range=cheap",
        "/api/v1/products?price_range=500-100",
        "/api/v1/products?sort=random",
        "/api/v1/products?per_page=0",
        "/api/v1/products?page=abc",
    ] {
        let (status, body) = send(&app, get(uri, HOST)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "VALIDATION_FAILED", "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn product_views_carry_derived_prices() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant = create_tenant(&db, "Phone Hub", HOST).await?;
    create_product(
        &db,
        tenant.id,
        ProductRecord {
            discount: 10.0,
            ..record("Galaxy S24", "Samsung", "Trending", 50000.0)
        },
    )
    .await?;
    let app = test_app(&db);

    let (_, body) = send(&app, get("/api/v1/products", HOST)).await;
    let product = &body["data"][0];
    assert_eq!(product["effective_price"], 45000.0);
    assert_eq!(product["savings"], 5000.0);
    assert_eq!(product["images"][0], "https://cdn.test/Galaxy-S24.jpg");
    Ok(())
}

#[tokio::test]
async fn featured_lists_trending_and_new_arrivals() -> Result<()> {
    let (_db, app, _) = seeded_app().await?;

    let (status, body) = send(&app, get("/api/v1/products/featured", HOST)).await;
    assert_eq!(status, StatusCode::OK);

    let slides = body["slides"].as_array().unwrap();
    assert_eq!(slides.len(), 3);
    assert!(slides.iter().all(|s| s["kind"] == "product"));
    assert_eq!(slides[0]["name"], "Pixel 8");
    assert_eq!(body["auto_advance"], true);

    let (_, body) = send(&app, get("/api/v1/products/featured?start=4", HOST)).await;
    assert_eq!(body["current"], 1);
    assert_eq!(body["next"], 2);
    assert_eq!(body["previous"], 0);
    Ok(())
}

#[tokio::test]
async fn featured_falls_back_to_welcome_slide() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant = create_tenant(&db, "Quiet Store", HOST).await?;
    create_product(&db, tenant.id, record("Basic", "Nokia", "Budget", 2999.0)).await?;
    let app = test_app(&db);

    let (_, body) = send(&app, get("/api/v1/products/featured", HOST)).await;
    let slides = body["slides"].as_array().unwrap();
    assert_eq!(slides.len(), 1);
    assert_eq!(slides[0]["kind"], "welcome");
    assert_eq!(slides[0]["title"], "Welcome to Quiet Store");
    assert_eq!(body["auto_advance"], false);
    assert_eq!(body["current"], 0);
    assert_eq!(body["next"], 0);
    assert_eq!(body["previous"], 0);
    Ok(())
}

#[tokio::test]
async fn facets_list_distinct_sorted_values() -> Result<()> {
    let (_db, app, _) = seeded_app().await?;

    let (_, body) = send(&app, get("/api/v1/products/facets", HOST)).await;
    assert_eq!(
        body["brands"],
        serde_json::json!(["Google", "OnePlus", "Samsung", "Xiaomi"])
    );
    assert_eq!(
        body["categories"],
        serde_json::json!(["Budget", "Mid Range", "New Arrival", "Trending"])
    );
    assert_eq!(body["price_ranges"].as_array().unwrap().len(), 5);
    Ok(())
}

#[tokio::test]
async fn detail_hides_out_of_stock_products() -> Result<()> {
    let (db, app, tenant_id) = seeded_app().await?;
    let products = storefront::repositories::ProductRepository::new(&db)
        .list_for_tenant(tenant_id)
        .await?;
    let hidden = products.iter().find(|p| !p.in_stock).unwrap();
    let visible = products.iter().find(|p| p.in_stock).unwrap();

    let (status, body) = send(&app, get(&format!("/api/v1/products/{}", visible.id), HOST)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gallery"]["len"], 1);

    let (status, _) = send(&app, get(&format!("/api/v1/products/{}", hidden.id), HOST)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, get("/api/v1/products/not-a-uuid", HOST)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    Ok(())
}

#[tokio::test]
async fn inquiry_builds_whatsapp_link_and_wraps_image_index() -> Result<()> {
    let db = setup_test_db().await?;
    let tenant = create_tenant(&db, "Phone Hub", HOST).await?;
    let product = create_product(
        &db,
        tenant.id,
        ProductRecord {
            discount: 10.0,
            image_urls: vec![
                "https://cdn.test/front.jpg".to_string(),
                "https://cdn.test/back.jpg".to_string(),
            ],
            ..record("Galaxy S24", "Samsung", "Trending", 50000.0)
        },
    )
    .await?;
    let app = test_app(&db);

    let uri = format!("/api/v1/products/{}/inquiry?image=3", product.id);
    let (status, body) = send(&app, get(&uri, HOST)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["gallery"]["current"], 1);
    assert_eq!(body["image_url"], "https://cdn.test/back.jpg");

    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Samsung Galaxy S24"));
    assert!(message.contains("Price: ₹45,000"));
    assert!(message.contains("MRP: ₹50,000"));
    assert!(message.contains("Discount: 10% OFF"));
    assert!(message.contains("Image: https://cdn.test/back.jpg"));

    let link = body["whatsapp_url"].as_str().unwrap();
    assert!(link.starts_with("https://wa.me/919876543210?text="));
    Ok(())
}
