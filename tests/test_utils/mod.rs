//! Test utilities shared by the integration tests.
//!
//! Every test gets its own in-memory SQLite database with all migrations
//! applied, and an app wired to an in-memory object store.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use storefront::{
    auth::{hash_password, issue_session},
    config::AppConfig,
    models::{admin, product, tenant},
    repositories::{AdminRepository, NewTenant, ProductRecord, ProductRepository, TenantRepository},
    server::{AppState, create_app},
    storage::{MemoryObjectStore, ObjectStore},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const MEDIA_BASE_URL: &str = "http://media.test";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";
pub const MULTIPART_BOUNDARY: &str = "storefront-test-boundary";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        seed_demo: false,
        ..AppConfig::default()
    }
}

/// Router plus a handle on the object store behind it
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryObjectStore>,
    pub config: Arc<AppConfig>,
}

pub fn test_app(db: &DatabaseConnection) -> TestApp {
    test_app_with_config(db, test_config())
}

pub fn test_app_with_config(db: &DatabaseConnection, config: AppConfig) -> TestApp {
    let config = Arc::new(config);
    let store = Arc::new(MemoryObjectStore::new(MEDIA_BASE_URL));
    let shared: Arc<dyn ObjectStore> = store.clone();
    let state = AppState::new(config.clone(), db.clone(), shared);

    TestApp {
        router: create_app(state),
        store,
        config,
    }
}

pub async fn create_tenant(
    db: &DatabaseConnection,
    name: &str,
    domain: &str,
) -> Result<tenant::Model> {
    let tenant = TenantRepository::new(db)
        .create(NewTenant {
            name: name.to_string(),
            domain: domain.to_string(),
            mobile_number: "+91 98765 43210".to_string(),
            primary_color: None,
            secondary_color: None,
        })
        .await?;
    Ok(tenant)
}

pub async fn create_admin(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    email: &str,
) -> Result<admin::Model> {
    let hash = hash_password(ADMIN_PASSWORD).map_err(|err| anyhow::anyhow!("{err}"))?;
    Ok(AdminRepository::new(db).create(tenant_id, email, hash).await?)
}

pub fn record(name: &str, brand: &str, category: &str, price: f64) -> ProductRecord {
    ProductRecord {
        name: name.to_string(),
        brand: brand.to_string(),
        category: category.to_string(),
        price,
        discount: 0.0,
        description: String::new(),
        in_stock: true,
        image_urls: vec![format!("https://cdn.test/{}.jpg", name.replace(' ', "-"))],
    }
}

pub async fn create_product(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    record: ProductRecord,
) -> Result<product::Model> {
    Ok(ProductRepository::new(db).create(tenant_id, record).await?)
}

/// Session token for `admin`, signed the way the app expects
pub fn token_for(app: &TestApp, admin: &admin::Model) -> String {
    let secret = app.config.session_secret().unwrap();
    issue_session(secret, admin, 3600).unwrap().0
}

pub fn get(uri: &str, host: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap()
}

pub fn authed(method: &str, uri: &str, host: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, host)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn json_post(uri: &str, host: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, host)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// One part of a hand-built multipart body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(
    method: &str,
    uri: &str,
    host: &str,
    token: &str,
    parts: &[Part<'_>],
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, host)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// Send a request and decode the JSON body (`Value::Null` when empty)
pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
