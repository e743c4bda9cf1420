//! Admin account repository.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::admin::{
    ActiveModel as AdminActiveModel, Column as AdminColumn, Entity as Admin, Model as AdminModel,
};

pub struct AdminRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AdminRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create an admin for `tenant_id` with an already-hashed password.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        email: &str,
        password_hash: String,
    ) -> Result<AdminModel, RepositoryError> {
        let email = normalize_email(email)?;

        let admin = AdminActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            email: Set(email),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now().into()),
        };

        admin
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Look up an admin by email within one tenant
    pub async fn find_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<AdminModel>, RepositoryError> {
        let email = email.trim().to_ascii_lowercase();

        Admin::find()
            .filter(AdminColumn::TenantId.eq(tenant_id))
            .filter(AdminColumn::Email.eq(email))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

fn normalize_email(raw: &str) -> Result<String, RepositoryError> {
    let email = raw.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(RepositoryError::validation_error(format!(
            "'{}' is not a valid email address",
            raw.trim()
        ))),
    }
}
