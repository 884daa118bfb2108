//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for the ledger core:
//!
//! - `transactions`: one row per income/expense line, owner-scoped
//! - `split_participants`: named shares of a split transaction, with
//!   per-participant paid state

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    OwnerId,
    Title,
    AmountMinor,
    Kind,
    Category,
    Description,
    OccurredAt,
    Tags,
    IsRecurring,
    RecurringInterval,
    IsSplit,
    SplitTotalMinor,
    Location,
    PaymentMethod,
    Receipt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SplitParticipants {
    Table,
    Id,
    TransactionId,
    Position,
    Name,
    AmountMinor,
    Paid,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::OwnerId).string().not_null())
                    .col(ColumnDef::new(Transactions::Title).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Category).string().not_null())
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::Tags)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Transactions::IsRecurring)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::RecurringInterval).string())
                    .col(ColumnDef::new(Transactions::IsSplit).boolean().not_null())
                    .col(ColumnDef::new(Transactions::SplitTotalMinor).big_integer())
                    .col(ColumnDef::new(Transactions::Location).string())
                    .col(ColumnDef::new(Transactions::PaymentMethod).string())
                    .col(ColumnDef::new(Transactions::Receipt).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-owner_id-occurred_at")
                    .table(Transactions::Table)
                    .col(Transactions::OwnerId)
                    .col(Transactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-owner_id-kind")
                    .table(Transactions::Table)
                    .col(Transactions::OwnerId)
                    .col(Transactions::Kind)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-owner_id-category")
                    .table(Transactions::Table)
                    .col(Transactions::OwnerId)
                    .col(Transactions::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SplitParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SplitParticipants::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SplitParticipants::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SplitParticipants::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SplitParticipants::Name).string().not_null())
                    .col(
                        ColumnDef::new(SplitParticipants::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SplitParticipants::Paid).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-split_participants-transaction_id")
                            .from(SplitParticipants::Table, SplitParticipants::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-split_participants-transaction_id")
                    .table(SplitParticipants::Table)
                    .col(SplitParticipants::TransactionId)
                    .to_owned(),
            )
            .await?;

        // Settlement addresses participants by name, so names must be
        // unique within one split.
        manager
            .create_index(
                Index::create()
                    .name("idx-split_participants-transaction_id-name-unique")
                    .table(SplitParticipants::Table)
                    .col(SplitParticipants::TransactionId)
                    .col(SplitParticipants::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SplitParticipants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        Ok(())
    }
}
