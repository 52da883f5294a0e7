//! Priority request persistence using SeaORM.
//!
//! A request row plus its message rows. Updates are guarded by the `version` column and
//! run in one transaction together with the appended messages.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::priority::{self, ActiveModel, Entity as Priority};
use crate::entity::priority_message::{self as message, Entity as PriorityMessage};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminMessage, GpuType, MessageLog, NewPriorityRequest, PriorityRequest, PriorityStatus,
    RequestState,
};
use crate::services::validation;
use crate::store::PriorityStore;

use super::DbPool;

#[async_trait]
impl PriorityStore for DbPool {
    async fn insert(&self, new: NewPriorityRequest) -> AppResult<PriorityRequest> {
        let ticket = new.bugzilla_ticket.clone();
        let user_id = new.user_id;

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(new.user_id),
            requester_username: Set(new.requester_username),
            bugzilla_ticket: Set(new.bugzilla_ticket),
            additional_usernames: Set(join_usernames(&new.additional_usernames)),
            slurm_project: Set(new.slurm_project),
            gpu_type: Set(new.gpu_type.as_str().to_string()),
            gpu_count: Set(new.gpu_count),
            duration_days: Set(new.duration_days),
            reason: Set(new.reason),
            status: Set(PriorityStatus::Pending.as_str().to_string()),
            priority_name: Set(None),
            slurm_command: Set(None),
            status_updated_at: Set(None),
            status_updated_by: Set(None),
            version: Set(0),
            created_at: Set(new.created_at),
            updated_at: Set(new.created_at),
        };

        let inserted = model
            .insert(self.connection())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateTicket(ticket),
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    AppError::NotFound(format!("User {}", user_id))
                }
                _ => AppError::Database(format!("Failed to insert priority: {}", e)),
            })?;

        model_to_request(inserted, Vec::new())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<PriorityRequest>> {
        let Some(row) = Priority::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get priority: {}", e)))?
        else {
            return Ok(None);
        };

        let messages = PriorityMessage::find()
            .filter(message::Column::PriorityId.eq(id))
            .order_by_asc(message::Column::Seq)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get priority messages: {}", e)))?;

        model_to_request(row, messages).map(Some)
    }

    async fn update(&self, request: &PriorityRequest) -> AppResult<PriorityRequest> {
        let txn = self.connection().begin().await?;

        let changes = ActiveModel {
            additional_usernames: Set(join_usernames(&request.additional_usernames)),
            status: Set(request.status().as_str().to_string()),
            priority_name: Set(request.priority_name().map(str::to_string)),
            slurm_command: Set(request.slurm_command().map(str::to_string)),
            status_updated_at: Set(request.status_updated_at),
            status_updated_by: Set(request.status_updated_by.clone()),
            version: Set(request.version + 1),
            updated_at: Set(request.updated_at),
            ..Default::default()
        };

        let result = Priority::update_many()
            .set(changes)
            .filter(priority::Column::Id.eq(request.id))
            .filter(priority::Column::Version.eq(request.version))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update priority: {}", e)))?;

        if result.rows_affected == 0 {
            let exists = Priority::find_by_id(request.id).one(&txn).await?.is_some();
            txn.rollback().await?;
            return Err(if exists {
                AppError::TransitionConflict(format!(
                    "priority {} changed since version {}",
                    request.id, request.version
                ))
            } else {
                AppError::NotFound(format!("Priority {}", request.id))
            });
        }

        let stored = PriorityMessage::find()
            .filter(message::Column::PriorityId.eq(request.id))
            .count(&txn)
            .await? as usize;

        if request.messages.len() < stored {
            txn.rollback().await?;
            return Err(AppError::Internal(format!(
                "priority {} update would drop logged messages",
                request.id
            )));
        }

        for (seq, entry) in request.messages.entries().iter().enumerate().skip(stored) {
            message::ActiveModel {
                id: Set(Uuid::now_v7()),
                priority_id: Set(request.id),
                seq: Set(seq as i32),
                actor: Set(entry.actor.clone()),
                body: Set(entry.text.clone()),
                created_at: Set(entry.timestamp),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to append message: {}", e)))?;
        }

        txn.commit().await?;

        self.find(request.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Priority {}", request.id)))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let txn = self.connection().begin().await?;

        PriorityMessage::delete_many()
            .filter(message::Column::PriorityId.eq(id))
            .exec(&txn)
            .await?;

        let result = Priority::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    async fn list(&self, owner: Option<Uuid>) -> AppResult<Vec<PriorityRequest>> {
        let mut query = Priority::find();
        if let Some(owner) = owner {
            query = query.filter(priority::Column::UserId.eq(owner));
        }

        let rows = query
            .find_with_related(PriorityMessage)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list priorities: {}", e)))?;

        rows.into_iter()
            .map(|(row, messages)| model_to_request(row, messages))
            .collect()
    }
}

fn join_usernames(usernames: &[String]) -> Option<String> {
    if usernames.is_empty() {
        None
    } else {
        Some(usernames.join("\n"))
    }
}

fn corrupt(id: Uuid, what: &str) -> AppError {
    AppError::Database(format!("Priority {} has {}", id, what))
}

fn model_to_request(
    m: priority::Model,
    mut messages: Vec<message::Model>,
) -> AppResult<PriorityRequest> {
    let gpu_type = GpuType::parse(&m.gpu_type)
        .ok_or_else(|| corrupt(m.id, &format!("unknown GPU type '{}'", m.gpu_type)))?;

    let status = PriorityStatus::parse(&m.status)
        .ok_or_else(|| corrupt(m.id, &format!("unknown status '{}'", m.status)))?;

    let state = match status {
        PriorityStatus::Pending => RequestState::Pending,
        PriorityStatus::Refused => RequestState::Refused,
        PriorityStatus::Accepted => match (m.priority_name, m.slurm_command) {
            (Some(priority_name), Some(slurm_command)) => RequestState::Accepted {
                priority_name,
                slurm_command,
            },
            _ => return Err(corrupt(m.id, "accepted status without name or commands")),
        },
    };

    messages.sort_by_key(|msg| msg.seq);
    let log = MessageLog::from_entries(
        messages
            .into_iter()
            .map(|msg| AdminMessage {
                timestamp: msg.created_at,
                actor: msg.actor,
                text: msg.body,
            })
            .collect(),
    );

    Ok(PriorityRequest {
        id: m.id,
        user_id: m.user_id,
        requester_username: m.requester_username,
        bugzilla_ticket: m.bugzilla_ticket,
        additional_usernames: m
            .additional_usernames
            .as_deref()
            .map(validation::parse_username_block)
            .unwrap_or_default(),
        slurm_project: m.slurm_project,
        gpu_type,
        gpu_count: m.gpu_count,
        duration_days: m.duration_days,
        reason: m.reason,
        state,
        messages: log,
        status_updated_at: m.status_updated_at,
        status_updated_by: m.status_updated_by,
        created_at: m.created_at,
        updated_at: m.updated_at,
        version: m.version,
    })
}
