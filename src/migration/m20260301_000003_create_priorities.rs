//! Create priorities table.
//!
//! The ticket number is unique; rows go away with their owning user.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Priorities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Priorities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Priorities::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Priorities::RequesterUsername)
                            .string_len(150)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Priorities::BugzillaTicket)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Priorities::AdditionalUsernames).text())
                    .col(
                        ColumnDef::new(Priorities::SlurmProject)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Priorities::GpuType).string_len(20).not_null())
                    .col(ColumnDef::new(Priorities::GpuCount).integer().not_null())
                    .col(ColumnDef::new(Priorities::DurationDays).integer().not_null())
                    .col(ColumnDef::new(Priorities::Reason).text().not_null())
                    .col(
                        ColumnDef::new(Priorities::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Priorities::PriorityName).string_len(50))
                    .col(ColumnDef::new(Priorities::SlurmCommand).text())
                    .col(ColumnDef::new(Priorities::StatusUpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Priorities::StatusUpdatedBy).string_len(150))
                    .col(
                        ColumnDef::new(Priorities::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Priorities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Priorities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_priorities_user_id")
                            .from(Priorities::Table, Priorities::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_priorities_user_id")
                    .table(Priorities::Table)
                    .col(Priorities::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_priorities_created_at")
                    .table(Priorities::Table)
                    .col(Priorities::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Priorities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Priorities {
    Table,
    Id,
    UserId,
    RequesterUsername,
    BugzillaTicket,
    AdditionalUsernames,
    SlurmProject,
    GpuType,
    GpuCount,
    DurationDays,
    Reason,
    Status,
    PriorityName,
    SlurmCommand,
    StatusUpdatedAt,
    StatusUpdatedBy,
    Version,
    CreatedAt,
    UpdatedAt,
}
