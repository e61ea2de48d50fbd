//! `SeaORM` Entity prelude

pub use super::bitcoin_de_trades::Entity as BitcoinDeTrades;
