mod common;

use price_chart::entities::bitcoin_de_trades;
use price_chart::services::bitcoin_de::{ApiError, BitcoinDeClient, TRADE_HISTORY_PATH};
use price_chart::services::signer::ApiCredentials;
use price_chart::services::throttle::NoThrottle;
use price_chart::services::trade_ingestor::{ingest_new_trades, IngestOutcome};
use price_chart::services::trade_store;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use wiremock::{
    matchers::{method, path, query_param, query_param_is_missing},
    Mock, MockServer, ResponseTemplate,
};

use crate::common::{history_json, setup_test_db, trade};

fn client(server: &MockServer) -> BitcoinDeClient {
    BitcoinDeClient::new(
        ApiCredentials::new("public-key", "private-key"),
        server.uri(),
        20,
    )
    .unwrap()
    .with_throttle(NoThrottle)
}

async fn stored_tids(db: &DatabaseConnection) -> Vec<i64> {
    trade_store::all_trades(db)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.tid)
        .collect()
}

#[tokio::test]
async fn test_empty_store_ingests_full_history() {
    let db = setup_test_db().await.unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TRADE_HISTORY_PATH))
        .and(query_param("trading_pair", "btceur"))
        .and(query_param_is_missing("since_tid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_json(&[5, 6, 7], 18)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let outcome = ingest_new_trades(&db, &client, "btceur").await.unwrap();

    match outcome {
        IngestOutcome::Ingested {
            fetched,
            inserted,
            high_water_mark,
        } => {
            assert_eq!(fetched, 3);
            assert_eq!(inserted, 3);
            assert_eq!(high_water_mark, 7);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(stored_tids(&db).await, vec![5, 6, 7]);
    assert_eq!(trade_store::max_tid(&db, "btceur").await.unwrap(), 7);
    assert_eq!(client.credits(), 18);

    let first = &trade_store::all_trades(&db).await.unwrap()[0];
    assert_eq!(first.trading_pair, "btceur");
    assert_eq!(first.price, dec!(2305.5));
    assert_eq!(first.amount, dec!(0.25));
    assert_eq!(first.date.timestamp(), 1_500_000_300);
    assert_eq!(first.date.offset().local_minus_utc(), 0);
}

#[tokio::test]
async fn test_redelivered_trade_not_duplicated() {
    let db = setup_test_db().await.unwrap();
    trade_store::insert_trades(&db, "btceur", &[trade(7, dec!(2307.5))])
        .await
        .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TRADE_HISTORY_PATH))
        .and(query_param("since_tid", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_json(&[7, 8], 17)))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = ingest_new_trades(&db, &client(&server), "btceur")
        .await
        .unwrap();

    assert_eq!(outcome.inserted(), 1);
    assert_eq!(stored_tids(&db).await, vec![7, 8]);
    assert_eq!(trade_store::count_trades(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn test_server_error_leaves_store_unchanged() {
    let db = setup_test_db().await.unwrap();
    trade_store::insert_trades(&db, "btceur", &[trade(3, dec!(2000))])
        .await
        .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = ingest_new_trades(&db, &client(&server), "btceur")
        .await
        .unwrap();

    assert!(outcome.is_unavailable());
    assert!(matches!(
        outcome,
        IngestOutcome::Unavailable(ApiError::HttpStatus { status: 500, .. })
    ));
    assert_eq!(stored_tids(&db).await, vec![3]);
}

#[tokio::test]
async fn test_no_new_trades_distinguished_from_failure() {
    let db = setup_test_db().await.unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_json(&[], 19)))
        .mount(&server)
        .await;

    let outcome = ingest_new_trades(&db, &client(&server), "btceur")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        IngestOutcome::NoNewTrades { high_water_mark: 0 }
    ));
    assert!(stored_tids(&db).await.is_empty());
}

#[tokio::test]
async fn test_invalid_pair_is_unavailable_without_request() {
    let db = setup_test_db().await.unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_json(&[1], 19)))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = ingest_new_trades(&db, &client(&server), "btc/eur!")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        IngestOutcome::Unavailable(ApiError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_same_batch_twice_is_idempotent() {
    let db = setup_test_db().await.unwrap();
    let batch = vec![trade(1, dec!(10)), trade(2, dec!(11)), trade(3, dec!(12))];

    let first = trade_store::insert_trades(&db, "btceur", &batch).await.unwrap();
    let second = trade_store::insert_trades(&db, "btceur", &batch).await.unwrap();

    assert_eq!(first.inserted, 3);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped(), 3);
    assert_eq!(stored_tids(&db).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_duplicate_ids_within_batch_collapse() {
    let db = setup_test_db().await.unwrap();
    let batch = vec![trade(4, dec!(10)), trade(4, dec!(99)), trade(5, dec!(11))];

    let summary = trade_store::insert_trades(&db, "btceur", &batch).await.unwrap();

    assert_eq!(summary.received, 2);
    assert_eq!(summary.inserted, 2);
    let rows = trade_store::all_trades(&db).await.unwrap();
    assert_eq!(rows[0].price, dec!(10));
}

#[tokio::test]
async fn test_plain_insert_of_existing_tid_violates_uniqueness() {
    let db = setup_test_db().await.unwrap();
    trade_store::insert_trades(&db, "btceur", &[trade(9, dec!(10))])
        .await
        .unwrap();

    let duplicate = bitcoin_de_trades::ActiveModel {
        tid: Set(9),
        trading_pair: Set("btceur".to_string()),
        date: Set(trade(9, dec!(1)).date.fixed_offset()),
        price: Set(dec!(1)),
        amount: Set(dec!(1)),
    };

    assert!(duplicate.insert(&db).await.is_err());
    assert_eq!(trade_store::count_trades(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_max_tid_empty_table() {
    let db = setup_test_db().await.unwrap();
    assert_eq!(trade_store::max_tid(&db, "btceur").await.unwrap(), 0);
}

#[tokio::test]
async fn test_latest_trades_window() {
    let db = setup_test_db().await.unwrap();
    let batch: Vec<_> = (1..=150).map(|tid| trade(tid, dec!(100))).collect();
    trade_store::insert_trades(&db, "btceur", &batch).await.unwrap();

    let latest = trade_store::latest_trades(&db, trade_store::TABLE_WINDOW)
        .await
        .unwrap();

    assert_eq!(latest.len(), 100);
    assert_eq!(latest.first().unwrap().tid, 51);
    assert_eq!(latest.last().unwrap().tid, 150);
    assert_eq!(trade_store::count_trades(&db).await.unwrap(), 150);
}

#[tokio::test]
async fn test_high_water_mark_is_per_trading_pair() {
    let db = setup_test_db().await.unwrap();
    trade_store::insert_trades(&db, "btceur", &[trade(900, dec!(2000))])
        .await
        .unwrap();

    assert_eq!(trade_store::max_tid(&db, "btceur").await.unwrap(), 900);
    assert_eq!(trade_store::max_tid(&db, "bchbtc").await.unwrap(), 0);

    let mut body = history_json(&[3, 4], 18);
    body["trading_pair"] = "bchbtc".into();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TRADE_HISTORY_PATH))
        .and(query_param("trading_pair", "bchbtc"))
        .and(query_param_is_missing("since_tid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = ingest_new_trades(&db, &client(&server), "bchbtc")
        .await
        .unwrap();

    assert_eq!(outcome.inserted(), 2);
    assert_eq!(trade_store::max_tid(&db, "bchbtc").await.unwrap(), 4);
    assert_eq!(trade_store::max_tid(&db, "btceur").await.unwrap(), 900);
    assert_eq!(stored_tids(&db).await, vec![3, 4, 900]);
}

#[tokio::test]
async fn test_response_for_other_pair_is_rejected() {
    let db = setup_test_db().await.unwrap();

    let mut body = history_json(&[1, 2], 18);
    body["trading_pair"] = "btceurusdollar".into();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = ingest_new_trades(&db, &client(&server), "btceur")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        IngestOutcome::Unavailable(ApiError::Decode(_))
    ));
    assert!(stored_tids(&db).await.is_empty());
}
