//! Demo storefront seeding
//!
//! Creates one tenant bound to `localhost`, an admin account and a handful of
//! products. Runs only for the `local` profile, only when seeding is enabled
//! and only when the tenants table is empty.

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;

use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::repositories::{
    AdminRepository, NewTenant, ProductRecord, ProductRepository, TenantRepository,
};

pub const DEMO_ADMIN_EMAIL: &str = "admin@demo.local";
pub const DEMO_ADMIN_PASSWORD: &str = "demo-password";

struct DemoProduct {
    name: &'static str,
    brand: &'static str,
    category: &'static str,
    price: f64,
    discount: f64,
    description: &'static str,
    in_stock: bool,
}

const DEMO_PRODUCTS: [DemoProduct; 6] = [
    DemoProduct {
        name: "Galaxy S24",
        brand: "Samsung",
        category: "Trending",
        price: 79999.0,
        discount: 10.0,
        description: "6.2\" Dynamic AMOLED, Snapdragon 8 Gen 3, 50MP triple camera.",
        in_stock: true,
    },
    DemoProduct {
        name: "iPhone 15",
        brand: "Apple",
        category: "New Arrival",
        price: 69900.0,
        discount: 5.0,
        description: "A16 Bionic, Dynamic Island, USB-C.",
        in_stock: true,
    },
    DemoProduct {
        name: "Redmi Note 13",
        brand: "Xiaomi",
        category: "Budget",
        price: 17999.0,
        discount: 0.0,
        description: "120Hz AMOLED, 108MP camera, 5000mAh battery.",
        in_stock: true,
    },
    DemoProduct {
        name: "Pixel 8",
        brand: "Google",
        category: "Trending",
        price: 75999.0,
        discount: 15.0,
        description: "Tensor G3, seven years of OS updates.",
        in_stock: true,
    },
    DemoProduct {
        name: "Nord CE 3",
        brand: "OnePlus",
        category: "Mid Range",
        price: 24999.0,
        discount: 8.0,
        description: "Dimensity 782G, 80W SUPERVOOC charging.",
        in_stock: true,
    },
    DemoProduct {
        name: "Galaxy A14",
        brand: "Samsung",
        category: "Budget",
        price: 12999.0,
        discount: 0.0,
        description: "Discontinued model kept for reference.",
        in_stock: false,
    },
];

/// Seed the demo storefront. Returns `true` when anything was inserted.
pub async fn seed_demo(db: &DatabaseConnection, config: &AppConfig) -> Result<bool> {
    if config.profile != "local" || !config.seed_demo {
        log::debug!("Demo seeding disabled for profile '{}'", config.profile);
        return Ok(false);
    }

    let tenants = TenantRepository::new(db);
    if tenants.count().await.context("Failed to count tenants")? > 0 {
        log::info!("Tenants already present, skipping demo seed");
        return Ok(false);
    }

    let tenant = tenants
        .create(NewTenant {
            name: "Demo Phone Store".to_string(),
            domain: "localhost".to_string(),
            mobile_number: "+91 98765 43210".to_string(),
            primary_color: None,
            secondary_color: None,
        })
        .await
        .context("Failed to create demo tenant")?;
    log::info!("Created demo tenant '{}' ({})", tenant.name, tenant.id);

    let password_hash = hash_password(DEMO_ADMIN_PASSWORD)
        .map_err(|err| anyhow::anyhow!("Failed to hash demo password: {err}"))?;
    AdminRepository::new(db)
        .create(tenant.id, DEMO_ADMIN_EMAIL, password_hash)
        .await
        .context("Failed to create demo admin")?;
    log::info!(
        "Created demo admin {} (password: {})",
        DEMO_ADMIN_EMAIL,
        DEMO_ADMIN_PASSWORD
    );

    let products = ProductRepository::new(db);
    for demo in &DEMO_PRODUCTS {
        let image = format!(
            "https://placehold.co/600x600?text={}",
            urlencoding::encode(demo.name)
        );
        products
            .create(
                tenant.id,
                ProductRecord {
                    name: demo.name.to_string(),
                    brand: demo.brand.to_string(),
                    category: demo.category.to_string(),
                    price: demo.price,
                    discount: demo.discount,
                    description: demo.description.to_string(),
                    in_stock: demo.in_stock,
                    image_urls: vec![image],
                },
            )
            .await
            .with_context(|| format!("Failed to create demo product '{}'", demo.name))?;
    }
    log::info!("Created {} demo products", DEMO_PRODUCTS.len());

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use sea_orm::Database;

    async fn migrated_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn seeds_once_for_local_profile() {
        let db = migrated_db().await;
        let config = AppConfig::default();

        assert!(seed_demo(&db, &config).await.unwrap());
        assert!(!seed_demo(&db, &config).await.unwrap());

        let tenant = TenantRepository::new(&db).find_first().await.unwrap().unwrap();
        assert_eq!(tenant.domain, "localhost");
        assert_eq!(
            ProductRepository::new(&db)
                .count_for_tenant(tenant.id)
                .await
                .unwrap(),
            DEMO_PRODUCTS.len() as u64
        );
    }

    #[tokio::test]
    async fn skips_other_profiles() {
        let db = migrated_db().await;
        let config = AppConfig {
            profile: "prod".to_string(),
            ..AppConfig::default()
        };

        assert!(!seed_demo(&db, &config).await.unwrap());
        assert_eq!(TenantRepository::new(&db).count().await.unwrap(), 0);
    }
}
