use museum_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000004_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(mining_reward::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(mining_reward::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(mining_reward::Column::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(mining_reward::Column::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(mining_reward::Column::MiningRate)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(mining_reward::Column::Claimed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(mining_reward::Column::ClaimedAt).big_integer())
                    .col(
                        ColumnDef::new(mining_reward::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The claim path scans a user's unclaimed rows.
        manager
            .create_index(
                Index::create()
                    .name("idx_mining_reward_user_claimed")
                    .table(mining_reward::Entity)
                    .col(mining_reward::Column::UserId)
                    .col(mining_reward::Column::Claimed)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(mining_reward::Entity).to_owned())
            .await
    }
}
