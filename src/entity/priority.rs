//! Priority request entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "priorities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub requester_username: String,
    #[sea_orm(unique)]
    pub bugzilla_ticket: String,
    /// Newline-separated; NULL when there are none.
    pub additional_usernames: Option<String>,
    pub slurm_project: String,
    pub gpu_type: String,
    pub gpu_count: i32,
    pub duration_days: i32,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub status: String,
    pub priority_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub slurm_command: Option<String>,
    pub status_updated_at: Option<DateTimeUtc>,
    pub status_updated_by: Option<String>,
    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::priority_message::Entity")]
    Messages,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::priority_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
