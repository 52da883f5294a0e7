//! Database operations for administrator membership.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::admin_user::{self, ActiveModel, Entity as AdminUserEntity};
use crate::error::{AppError, AppResult};
use crate::models::AdminUser;

use super::{DbPool, is_unique_violation};

impl DbPool {
    /// Grant administrator capability. Fails if the username is already an admin.
    pub async fn add_admin(&self, username: &str, email: &str) -> AppResult<AdminUser> {
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            created_at: Set(Utc::now()),
        };

        let inserted = model
            .insert(self.connection())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::InvalidInput(format!("{} is already an administrator", username))
                } else {
                    AppError::Database(format!("Failed to insert admin: {}", e))
                }
            })?;

        Ok(model_to_admin(inserted))
    }

    /// Revoke administrator capability. Returns false if the username was not an admin.
    pub async fn remove_admin(&self, username: &str) -> AppResult<bool> {
        let result = AdminUserEntity::delete_many()
            .filter(admin_user::Column::Username.eq(username))
            .exec(self.connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// List all admins by username.
    pub async fn list_admins(&self) -> AppResult<Vec<AdminUser>> {
        let results = AdminUserEntity::find()
            .order_by_asc(admin_user::Column::Username)
            .all(self.connection())
            .await?;
        Ok(results.into_iter().map(model_to_admin).collect())
    }

    pub async fn admin_exists(&self, username: &str) -> AppResult<bool> {
        let count = AdminUserEntity::find()
            .filter(admin_user::Column::Username.eq(username))
            .count(self.connection())
            .await?;
        Ok(count > 0)
    }
}

fn model_to_admin(m: admin_user::Model) -> AdminUser {
    AdminUser {
        id: m.id,
        username: m.username,
        email: m.email,
        created_at: m.created_at,
    }
}
