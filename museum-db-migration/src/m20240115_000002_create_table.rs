use museum_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000002_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(artwork::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(artwork::Column::Mint)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(artwork::Column::Name).string().not_null())
                    .col(ColumnDef::new(artwork::Column::Rarity).string().not_null())
                    .col(ColumnDef::new(artwork::Column::Gp).integer().not_null())
                    .col(ColumnDef::new(artwork::Column::Artist).string())
                    .col(ColumnDef::new(artwork::Column::OwnerWallet).string())
                    .col(
                        ColumnDef::new(artwork::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(artwork::Entity).to_owned())
            .await
    }
}
