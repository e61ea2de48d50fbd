//! `SeaORM` Entity for bitcoin_de_trades table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bitcoin_de_trades")]
pub struct Model {
    /// Trade id assigned by bitcoin.de, used as the ingestion cursor
    #[sea_orm(primary_key, auto_increment = false)]
    pub tid: i64,
    /// Short pair code, e.g. "btceur"
    pub trading_pair: String,
    /// Execution time, always stored in UTC
    pub date: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Decimal(Some((12, 3)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 10)))")]
    pub amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
