use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_data", schema_name = "public")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub wallet_address: String,
    pub museum_pass_mint: Option<String>,
    pub level: i32,
    pub xp: i32,
    pub museum_balance: i64,
    pub stoned_balance: i64,
    pub staking_pool: String,
    pub staking_amount: i64,
    pub staking_started_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
