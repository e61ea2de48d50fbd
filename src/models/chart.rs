use serde::{Deserialize, Serialize};

use crate::entities::bitcoin_de_trades;

/// Label format for chart points, e.g. "2017-07-14 02:40:00+00:00"
pub const CHART_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Response for GET /chart: parallel label/value series ordered by trade id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartResponse {
    pub labels: Vec<String>,
    pub data: Vec<String>,
}

impl FromIterator<bitcoin_de_trades::Model> for ChartResponse {
    fn from_iter<I: IntoIterator<Item = bitcoin_de_trades::Model>>(iter: I) -> Self {
        let mut chart = ChartResponse::default();
        for trade in iter {
            chart
                .labels
                .push(trade.date.format(CHART_LABEL_FORMAT).to_string());
            chart.data.push(trade.price.to_string());
        }
        chart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_chart_series_from_rows() {
        let rows = vec![
            bitcoin_de_trades::Model {
                tid: 1,
                trading_pair: "btceur".to_string(),
                date: Utc.timestamp_opt(1_500_000_000, 0).unwrap().fixed_offset(),
                price: dec!(2300.500),
                amount: dec!(0.25),
            },
            bitcoin_de_trades::Model {
                tid: 2,
                trading_pair: "btceur".to_string(),
                date: Utc.timestamp_opt(1_500_000_060, 0).unwrap().fixed_offset(),
                price: dec!(2301),
                amount: dec!(1),
            },
        ];

        let chart: ChartResponse = rows.into_iter().collect();

        assert_eq!(
            chart.labels,
            vec!["2017-07-14 02:40:00+00:00", "2017-07-14 02:41:00+00:00"]
        );
        assert_eq!(chart.data, vec!["2300.500", "2301"]);
    }
}
