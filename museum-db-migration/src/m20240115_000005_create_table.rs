use museum_db_entity::db::*;
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240115_000005_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(conversion::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(conversion::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(conversion::Column::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(conversion::Column::MuseumAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(conversion::Column::StonedAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(conversion::Column::Rate).integer().not_null())
                    .col(
                        ColumnDef::new(conversion::Column::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(conversion::Entity).to_owned())
            .await
    }
}
