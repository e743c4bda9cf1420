//! Tenant entity model
//!
//! This module contains the SeaORM entity model for the tenants table.
//! A tenant is one storefront: it owns a catalog and carries the branding
//! served to the public site.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Tenant entity representing a single storefront
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    /// Unique identifier for the tenant (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name of the storefront
    pub name: String,

    /// Bound domain, stored lower-case (may be a bare host or a full URL)
    pub domain: String,

    /// Contact number used for WhatsApp inquiries
    pub mobile_number: String,

    /// Primary theme color (`#RRGGBB`)
    pub primary_color: String,

    /// Secondary theme color (`#RRGGBB`)
    pub secondary_color: String,

    /// Timestamp when the tenant was created
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Product,
    #[sea_orm(has_many = "super::admin::Entity")]
    Admin,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::admin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
