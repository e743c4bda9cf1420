//! # Tenant Repository
//!
//! This module contains the repository implementation for Tenant entities:
//! storefront registration (operator CLI, seeding) and the lookups the
//! hostname resolver relies on.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::tenant::{
    ActiveModel as TenantActiveModel, Column as TenantColumn, Entity as Tenant,
    Model as TenantModel,
};

pub const DEFAULT_PRIMARY_COLOR: &str = "#1d4ed8";
pub const DEFAULT_SECONDARY_COLOR: &str = "#f59e0b";

static HEX_COLOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").ok());

/// Request data for registering a new storefront
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub domain: String,
    pub mobile_number: String,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
}

/// Repository for Tenant database operations
pub struct TenantRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TenantRepository<'a> {
    /// Create a new TenantRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new tenant
    pub async fn create(&self, request: NewTenant) -> Result<TenantModel, RepositoryError> {
        let name = validate_name(&request.name)?;
        let domain = validate_domain(&request.domain)?;
        let mobile_number = validate_mobile_number(&request.mobile_number)?;
        let primary_color = validate_color(
            "primary color",
            request.primary_color.as_deref().unwrap_or(DEFAULT_PRIMARY_COLOR),
        )?;
        let secondary_color = validate_color(
            "secondary color",
            request
                .secondary_color
                .as_deref()
                .unwrap_or(DEFAULT_SECONDARY_COLOR),
        )?;

        let tenant = TenantActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            domain: Set(domain),
            mobile_number: Set(mobile_number),
            primary_color: Set(primary_color),
            secondary_color: Set(secondary_color),
            created_at: Set(Utc::now().into()),
        };

        tenant
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get tenant by ID
    pub async fn get_tenant_by_id(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<TenantModel>, RepositoryError> {
        Tenant::find_by_id(tenant_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List all tenants in table order
    pub async fn list_tenants(&self) -> Result<Vec<TenantModel>, RepositoryError> {
        Tenant::find()
            .order_by_asc(TenantColumn::CreatedAt)
            .order_by_asc(TenantColumn::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// First tenant by table order, served to development hosts
    pub async fn find_first(&self) -> Result<Option<TenantModel>, RepositoryError> {
        Tenant::find()
            .order_by_asc(TenantColumn::CreatedAt)
            .order_by_asc(TenantColumn::Id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Tenants whose stored domain contains `host` as a substring.
    ///
    /// `host` must already be normalised (lower-case, no port); domains are
    /// stored lower-case, so the match is case-insensitive.
    pub async fn find_by_domain_match(
        &self,
        host: &str,
    ) -> Result<Vec<TenantModel>, RepositoryError> {
        Tenant::find()
            .filter(TenantColumn::Domain.contains(host))
            .order_by_asc(TenantColumn::CreatedAt)
            .order_by_asc(TenantColumn::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Get tenant count
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Tenant::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

fn validate_name(name: &str) -> Result<String, RepositoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RepositoryError::validation_error(
            "Tenant name cannot be empty",
        ));
    }

    if name.chars().count() > 255 {
        return Err(RepositoryError::validation_error(
            "Tenant name cannot exceed 255 characters",
        ));
    }

    Ok(name.to_string())
}

fn validate_domain(domain: &str) -> Result<String, RepositoryError> {
    let domain = domain.trim().to_ascii_lowercase();
    if domain.is_empty() {
        return Err(RepositoryError::validation_error(
            "Tenant domain cannot be empty",
        ));
    }

    if domain.chars().any(char::is_whitespace) {
        return Err(RepositoryError::validation_error(
            "Tenant domain cannot contain whitespace",
        ));
    }

    Ok(domain)
}

fn validate_mobile_number(raw: &str) -> Result<String, RepositoryError> {
    let trimmed = raw.trim();
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    let allowed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));

    if !allowed || !(7..=15).contains(&digits) {
        return Err(RepositoryError::validation_error(
            "Mobile number must contain between 7 and 15 digits",
        ));
    }

    Ok(trimmed.to_string())
}

fn validate_color(field: &str, value: &str) -> Result<String, RepositoryError> {
    let value = value.trim();
    if !HEX_COLOR.as_ref().is_some_and(|re| re.is_match(value)) {
        return Err(RepositoryError::validation_error(format!(
            "{} must be a #RRGGBB hex color",
            field
        )));
    }
    Ok(value.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_is_lowercased() {
        assert_eq!(
            validate_domain("  Shop-A.Example.COM ").unwrap(),
            "shop-a.example.com"
        );
        assert!(validate_domain("   ").is_err());
        assert!(validate_domain("shop a.example.com").is_err());
    }

    #[test]
    fn test_mobile_number_rules() {
        assert!(validate_mobile_number("+91 98765 43210").is_ok());
        assert!(validate_mobile_number("12345").is_err());
        assert!(validate_mobile_number("98765x43210").is_err());
    }

    #[test]
    fn test_color_rules() {
        assert_eq!(validate_color("primary color", "#AABBCC").unwrap(), "#aabbcc");
        assert!(validate_color("primary color", "blue").is_err());
        assert!(validate_color("primary color", "#abc").is_err());
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(validate_name("  Phone Hub ").unwrap(), "Phone Hub");
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
    }
}
