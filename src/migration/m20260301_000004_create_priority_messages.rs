//! Create priority_messages table.
//!
//! Administrator messages, one row per entry, ordered by `seq` within a priority.

use sea_orm_migration::prelude::*;

use super::m20260301_000003_create_priorities::Priorities;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PriorityMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriorityMessages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PriorityMessages::PriorityId).uuid().not_null())
                    .col(ColumnDef::new(PriorityMessages::Seq).integer().not_null())
                    .col(
                        ColumnDef::new(PriorityMessages::Actor)
                            .string_len(150)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PriorityMessages::Body).text().not_null())
                    .col(
                        ColumnDef::new(PriorityMessages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_priority_messages_priority_id")
                            .from(PriorityMessages::Table, PriorityMessages::PriorityId)
                            .to(Priorities::Table, Priorities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_priority_messages_priority_seq")
                    .table(PriorityMessages::Table)
                    .col(PriorityMessages::PriorityId)
                    .col(PriorityMessages::Seq)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PriorityMessages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PriorityMessages {
    Table,
    Id,
    PriorityId,
    Seq,
    Actor,
    Body,
    CreatedAt,
}
