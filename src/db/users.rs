//! Database operations for users.

use chrono::{DateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::priority::{self, Entity as Priority};
use crate::entity::priority_message::{self as message, Entity as PriorityMessage};
use crate::entity::user::{self, ActiveModel, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::{IdentityClaims, User};

use super::{DbPool, is_unique_violation};

impl DbPool {
    /// Find or create the user behind a proxy identity.
    ///
    /// Email and names follow the identity provider; the username is fixed at creation.
    /// `now` stamps `created_at` and `updated_at`.
    pub async fn upsert_from_identity(
        &self,
        claims: &IdentityClaims,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        if let Some(existing) = self.find_user_by_subject(&claims.sub).await? {
            return self.refresh_profile(existing, claims, now).await;
        }

        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            oidc_sub: Set(claims.sub.clone()),
            username: Set(claims.derived_username()),
            email: Set(claims.email.clone()),
            first_name: Set(claims.given_name.clone()),
            last_name: Set(claims.family_name.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match model.insert(self.connection()).await {
            Ok(inserted) => {
                tracing::info!(user_id = %inserted.id, username = %inserted.username, "User created");
                Ok(model_to_user(inserted))
            }
            // Lost a first-contact race; the winning row is authoritative.
            Err(e) if is_unique_violation(&e) => {
                let winner = self.find_user_by_subject(&claims.sub).await?.ok_or_else(|| {
                    AppError::Database("User vanished after unique violation".to_string())
                })?;
                self.refresh_profile(winner, claims, now).await
            }
            Err(e) => Err(AppError::Database(format!("Failed to insert user: {}", e))),
        }
    }

    async fn find_user_by_subject(&self, sub: &str) -> AppResult<Option<user::Model>> {
        let result = UserEntity::find()
            .filter(user::Column::OidcSub.eq(sub))
            .one(self.connection())
            .await?;
        Ok(result)
    }

    async fn refresh_profile(
        &self,
        m: user::Model,
        claims: &IdentityClaims,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        if m.email == claims.email
            && m.first_name == claims.given_name
            && m.last_name == claims.family_name
        {
            return Ok(model_to_user(m));
        }

        let mut active: ActiveModel = m.into();
        active.email = Set(claims.email.clone());
        active.first_name = Set(claims.given_name.clone());
        active.last_name = Set(claims.family_name.clone());
        active.updated_at = Set(now);

        let updated = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))?;

        Ok(model_to_user(updated))
    }

    /// Find a user by ID.
    pub async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(self.connection()).await?;
        Ok(result.map(model_to_user))
    }

    /// List all users by username.
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let results = UserEntity::find()
            .order_by_asc(user::Column::Username)
            .all(self.connection())
            .await?;
        Ok(results.into_iter().map(model_to_user).collect())
    }

    /// Delete a user together with their priority requests and messages.
    pub async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let txn = self.connection().begin().await?;

        let owned: Vec<Uuid> = Priority::find()
            .filter(priority::Column::UserId.eq(id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        if !owned.is_empty() {
            PriorityMessage::delete_many()
                .filter(message::Column::PriorityId.is_in(owned.clone()))
                .exec(&txn)
                .await?;
            Priority::delete_many()
                .filter(priority::Column::Id.is_in(owned.clone()))
                .exec(&txn)
                .await?;
        }

        let result = UserEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = %id, priorities = owned.len(), "User deleted");
        }
        Ok(result.rows_affected > 0)
    }
}

fn model_to_user(m: user::Model) -> User {
    User {
        id: m.id,
        oidc_sub: m.oidc_sub,
        username: m.username,
        email: m.email,
        first_name: m.first_name,
        last_name: m.last_name,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}
