//! Integration tests for `AffiliateClient` using wiremock HTTP mocks.

use giftrec_affiliate::{AffiliateClient, AffiliateError, Credentials, SearchQuery, SortOrder};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> Credentials {
    Credentials {
        app_key: "key-1".to_string(),
        app_secret: "secret-1".to_string(),
        tracking_id: "track-1".to_string(),
    }
}

fn test_client(base_url: &str) -> AffiliateClient {
    AffiliateClient::with_gateway(
        &format!("{base_url}/sync"),
        Some(credentials()),
        5,
        "giftrec-test",
    )
    .expect("client construction should not fail")
}

fn product(id: u64, title: &str, price: &str) -> serde_json::Value {
    serde_json::json!({
        "product_id": id,
        "product_title": title,
        "product_main_image_url": format!("https://img.example.com/{id}.jpg"),
        "target_sale_price": price,
        "target_sale_price_currency": "USD",
        "promotion_link": format!("https://s.click.example.com/{id}")
    })
}

#[tokio::test]
async fn search_products_posts_signed_form_and_normalizes() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "aliexpress_affiliate_product_query_response": {
            "resp_result": {
                "result": {
                    "result_list": { "product": [
                        product(1, "Smart Lamp", "US $24.50"),
                        product(2, "Power Bank", "19.99"),
                        { "product_id": 3, "product_title": "No price" }
                    ] }
                }
            }
        }
    });

    Mock::given(method("POST"))
        .and(path("/sync"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("method=aliexpress.affiliate.product.query"))
        .and(body_string_contains("app_key=key-1"))
        .and(body_string_contains("tracking_id=track-1"))
        .and(body_string_contains("sign_method=md5"))
        .and(body_string_contains("keywords=smart+lamp"))
        .and(body_string_contains("sort=VOLUME_DESC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let mut query = SearchQuery::new("smart lamp");
    query.sort = Some(SortOrder::VolumeDesc);

    let items = test_client(&server.uri())
        .search_products(&query)
        .await
        .expect("search should succeed");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "1");
    assert_eq!(items[0].title, "Smart Lamp");
    assert_eq!(items[0].price.display, "$24.50");
    assert_eq!(items[1].url_aff, "https://s.click.example.com/2");
}

#[tokio::test]
async fn search_products_never_sends_secret() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("secret-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let items = test_client(&server.uri())
        .search_products(&SearchQuery::new("gift"))
        .await
        .expect("search should succeed");
    assert!(items.is_empty());
}

#[tokio::test]
async fn non_success_status_returns_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .search_products(&SearchQuery::new("gift"))
        .await
        .unwrap_err();

    match err {
        AffiliateError::Transport { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn error_envelope_returns_upstream_error_even_with_data() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "error_response": { "code": 25, "msg": "Invalid signature", "sub_msg": "" },
        "result": { "products": [product(1, "Ignored", "5.00")] }
    });

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .search_products(&SearchQuery::new("gift"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, AffiliateError::Upstream(ref m) if m == "Invalid signature"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn non_json_body_returns_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .search_products(&SearchQuery::new("gift"))
        .await
        .unwrap_err();

    assert!(matches!(err, AffiliateError::Deserialize { .. }));
}

#[tokio::test]
async fn double_encoded_payload_is_decoded() {
    let server = MockServer::start().await;

    let inner = serde_json::json!({
        "result_list": { "products": { "product": [product(7, "Scratch Map", "12.00")] } }
    });
    let body = serde_json::json!({
        "aliexpress_affiliate_product_query_response": {
            "resp_result": { "result": inner.to_string() }
        }
    });

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let items = test_client(&server.uri())
        .search_products(&SearchQuery::new("scratch map"))
        .await
        .expect("search should succeed");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Scratch Map");
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client =
        AffiliateClient::with_gateway(&format!("{}/sync", server.uri()), None, 5, "giftrec-test")
            .expect("client construction should not fail");

    let err = client
        .search_products(&SearchQuery::new("gift"))
        .await
        .unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn probe_reports_shape_of_live_body() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "result": { "products": [product(1, "Desk Lamp", "9.90"), product(2, "LED Strip", "7.00")] }
    });

    Mock::given(method("POST"))
        .and(body_string_contains("min_price=11"))
        .and(body_string_contains("max_price=99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let request = giftrec_affiliate::ProbeRequest {
        priced: true,
        ..Default::default()
    };
    let report = giftrec_affiliate::probe(&test_client(&server.uri()), &request)
        .await
        .expect("probe should succeed");

    assert_eq!(report.found_count, 2);
    assert_eq!(report.sizes["result.products"], 2);
    assert_eq!(report.sample_title.as_deref(), Some("Desk Lamp"));
}
