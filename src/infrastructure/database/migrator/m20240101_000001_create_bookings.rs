//! Create bookings table
//!
//! One row per stay. Composite indexes keep the per-guest and per-unit
//! conflict reads narrow: `(scope, check_in_date)` bounds the window and
//! `(scope, number_of_nights)` answers the longest-stay lookup.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::GuestName).string().not_null())
                    .col(ColumnDef::new(Bookings::UnitId).string().not_null())
                    .col(ColumnDef::new(Bookings::CheckInDate).date().not_null())
                    .col(
                        ColumnDef::new(Bookings::NumberOfNights)
                            .integer()
                            .not_null()
                            .check(Expr::col(Bookings::NumberOfNights).gte(1)),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_unit_check_in")
                    .table(Bookings::Table)
                    .col(Bookings::UnitId)
                    .col(Bookings::CheckInDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_guest_check_in")
                    .table(Bookings::Table)
                    .col(Bookings::GuestName)
                    .col(Bookings::CheckInDate)
                    .to_owned(),
            )
            .await?;

        for (name, scope) in [
            ("idx_bookings_unit_nights", Bookings::UnitId),
            ("idx_bookings_guest_nights", Bookings::GuestName),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Bookings::Table)
                        .col(scope)
                        .col(Bookings::NumberOfNights)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bookings {
    Table,
    Id,
    GuestName,
    UnitId,
    CheckInDate,
    NumberOfNights,
    CreatedAt,
    UpdatedAt,
}
