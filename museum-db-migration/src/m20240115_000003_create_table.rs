use museum_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000003_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(museum_slot::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(museum_slot::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(museum_slot::Column::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(museum_slot::Column::SlotNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(museum_slot::Column::ArtworkMint).string())
                    .col(
                        ColumnDef::new(museum_slot::Column::UnlockedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One slot per (user, number); one slot per artwork across all users.
        manager
            .create_index(
                Index::create()
                    .name("uq_museum_slot_user_number")
                    .table(museum_slot::Entity)
                    .col(museum_slot::Column::UserId)
                    .col(museum_slot::Column::SlotNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_museum_slot_artwork_mint")
                    .table(museum_slot::Entity)
                    .col(museum_slot::Column::ArtworkMint)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(museum_slot::Entity).to_owned())
            .await
    }
}
