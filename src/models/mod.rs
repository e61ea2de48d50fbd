pub mod chart;
pub mod error;
pub mod trade;
