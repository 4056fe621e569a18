//! Integration tests for `StoreClient` using wiremock HTTP mocks.

use chrono::NaiveDate;
use mjprice_core::{
    CorrectionEdits, DoseLevel, ErrorReport, ErrorReportInput, NewPriceReport,
    NewPriceReportInput, PriceCorrectionReport, PriceRecord, RecordId,
};
use mjprice_store::{StoreClient, StoreError};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> StoreClient {
    StoreClient::new(base_url, "anon-key", 30)
        .expect("client construction should not fail")
        .with_retry(2, 0)
}

#[tokio::test]
async fn fetch_price_records_sends_key_headers_and_parses_rows() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        {
            "id": 1,
            "city": "taipei",
            "district": "信義區",
            "clinic": "瘦身診所",
            "type": "clinic",
            "price5mg": 5500,
            "price10mg": 9800,
            "last_updated": "2025-05-20"
        },
        {
            "id": 2,
            "city": "高雄",
            "clinic": "港都醫院",
            "type": "hospital",
            "price5mg": "5200",
            "price10mg": 0
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/mounjaro_data"))
        .and(query_param("select", "*"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = client
        .fetch_price_records()
        .await
        .expect("should parse records");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].clinic.as_deref(), Some("瘦身診所"));
    assert_eq!(records[0].last_updated, NaiveDate::from_ymd_opt(2025, 5, 20));
    assert_eq!(records[1].price_at(DoseLevel::Mg5), Some(5200));
    assert_eq!(records[1].price_at(DoseLevel::Mg10), None);
}

#[tokio::test]
async fn null_body_is_an_empty_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/mounjaro_data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let records = test_client(&server.uri())
        .fetch_price_records()
        .await
        .expect("null body should not fail");
    assert!(records.is_empty());
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/mounjaro_data"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/mounjaro_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": 9 }])))
        .mount(&server)
        .await;

    let records = test_client(&server.uri())
        .fetch_price_records()
        .await
        .expect("second attempt should succeed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, RecordId("9".to_string()));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/mounjaro_data"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"message\":\"Invalid API key\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .fetch_price_records()
        .await
        .expect_err("401 should fail");
    match err {
        StoreError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Invalid API key"));
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_array_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/mounjaro_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "oops": 1 })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .fetch_price_records()
        .await
        .expect_err("object body should fail");
    assert!(matches!(err, StoreError::Deserialize { .. }));
}

#[tokio::test]
async fn fetch_price_record_filters_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/mounjaro_data"))
        .and(query_param("id", "eq.17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 17, "clinic": "Fit Clinic" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/mounjaro_data"))
        .and(query_param("id", "eq.404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let found = client
        .fetch_price_record(&RecordId("17".to_string()))
        .await
        .unwrap();
    assert_eq!(found.and_then(|r| r.clinic).as_deref(), Some("Fit Clinic"));

    let missing = client
        .fetch_price_record(&RecordId("404".to_string()))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn submit_price_correction_posts_pending_row() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/mounjaro_reports"))
        .and(header("apikey", "anon-key"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(serde_json::json!({
            "clinic": "Fit Clinic",
            "type": "clinic",
            "is_cosmetic": false,
            "price5mg": 5800,
            "last_updated": "2025-06-01",
            "status": "pending"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let mut target = PriceRecord::new("17");
    target.clinic = Some("Fit Clinic".to_string());
    target.price5mg = Some(5500);
    let edits = CorrectionEdits {
        price5mg: Some(5800),
        ..CorrectionEdits::default()
    };
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let report = PriceCorrectionReport::new(&target, &edits, today);

    test_client(&server.uri())
        .submit_price_correction(&report)
        .await
        .expect("insert should succeed");
}

#[tokio::test]
async fn submit_price_report_posts_to_price_reports() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/price_reports"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(serde_json::json!({
            "city": "tainan",
            "clinic": "府城診所",
            "type": "clinic",
            "price10mg": 9900
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let report = NewPriceReport::try_from(NewPriceReportInput {
        city: "tainan".to_string(),
        clinic: "府城診所".to_string(),
        price10mg: Some(9900),
        ..NewPriceReportInput::default()
    })
    .unwrap();

    test_client(&server.uri())
        .submit_price_report(&report)
        .await
        .expect("insert should succeed");
}

#[tokio::test]
async fn rejected_insert_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/error_reports"))
        .and(header("prefer", "return=minimal"))
        .and(body_partial_json(serde_json::json!({
            "source_type": "other",
            "error_type": "資料有誤",
            "description": "價格已調漲"
        })))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let report = ErrorReport::try_from(ErrorReportInput {
        description: "價格已調漲".to_string(),
        ..ErrorReportInput::default()
    })
    .unwrap();

    let err = test_client(&server.uri())
        .submit_error_report(&report)
        .await
        .expect_err("500 should fail");
    assert!(matches!(err, StoreError::Status { status: 500, .. }));
}
