use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // tid is assigned by bitcoin.de, never by the database
        manager
            .create_table(
                Table::create()
                    .table(BitcoinDeTrades::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BitcoinDeTrades::Tid)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BitcoinDeTrades::TradingPair)
                            .string_len(6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BitcoinDeTrades::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BitcoinDeTrades::Price)
                            .decimal_len(12, 3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BitcoinDeTrades::Amount)
                            .decimal_len(16, 10)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bitcoin_de_trades_trading_pair")
                    .table(BitcoinDeTrades::Table)
                    .col(BitcoinDeTrades::TradingPair)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BitcoinDeTrades::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BitcoinDeTrades {
    Table,
    Tid,
    TradingPair,
    Date,
    Price,
    Amount,
}
