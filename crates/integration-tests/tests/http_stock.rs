//! Integration tests for `HttpStockClient` against a mock API server.

use std::sync::Arc;

use rocketshoes_cart::{
    CartManager, HttpStockClient, RecordingNotifier, StockApiConfig, StockError, StockService,
};
use rocketshoes_core::ProductId;
use rocketshoes_integration_tests::FlakyStore;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpStockClient {
    let config = StockApiConfig::new(Url::parse(&server.uri()).unwrap());
    HttpStockClient::new(&config).unwrap()
}

fn product_json(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Tênis de Caminhada Leve Confortável",
        "price": 179.9,
        "image": "https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis1.jpg"
    })
}

async fn mock_stock(server: &MockServer, id: u64, amount: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/stock/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": id, "amount": amount})))
        .mount(server)
        .await;
}

// =============================================================================
// Stock lookups
// =============================================================================

#[tokio::test]
async fn test_get_stock() {
    let server = MockServer::start().await;
    mock_stock(&server, 1, 3).await;

    let entry = client_for(&server).get_stock(ProductId::new(1)).await.unwrap();

    assert_eq!(entry.id, ProductId::new(1));
    assert_eq!(entry.amount, 3);
}

#[tokio::test]
async fn test_get_stock_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/77"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_stock(ProductId::new(77))
        .await
        .unwrap_err();

    assert!(matches!(err, StockError::NotFound(id) if id == ProductId::new(77)));
}

#[tokio::test]
async fn test_get_stock_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_stock(ProductId::new(1))
        .await
        .unwrap_err();

    assert!(matches!(err, StockError::RateLimited(30)));
}

#[tokio::test]
async fn test_get_stock_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_stock(ProductId::new(1))
        .await
        .unwrap_err();

    match err {
        StockError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_get_stock_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\": 1"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_stock(ProductId::new(1))
        .await
        .unwrap_err();

    assert!(matches!(err, StockError::Parse(_)));
}

#[tokio::test]
async fn test_get_stock_for_wrong_product() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2, "amount": 9})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_stock(ProductId::new(1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StockError::UnexpectedProduct { requested, returned }
            if requested == ProductId::new(1) && returned == ProductId::new(2)
    ));
}

#[tokio::test]
async fn test_stock_is_never_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "amount": 3})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.get_stock(ProductId::new(1)).await.unwrap();
    client.get_stock(ProductId::new(1)).await.unwrap();
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/1"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "amount": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = StockApiConfig::new(Url::parse(&server.uri()).unwrap());
    config.token = Some(SecretString::from("s3cret"));
    let client = HttpStockClient::new(&config).unwrap();

    client.get_stock(ProductId::new(1)).await.unwrap();
}

#[tokio::test]
async fn test_base_url_path_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/stock/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4, "amount": 2})))
        .mount(&server)
        .await;

    let base = Url::parse(&format!("{}/api/v1/", server.uri())).unwrap();
    let client = HttpStockClient::new(&StockApiConfig::new(base)).unwrap();

    assert_eq!(client.get_stock(ProductId::new(4)).await.unwrap().amount, 2);
}

// =============================================================================
// Product lookups
// =============================================================================

#[tokio::test]
async fn test_product_metadata_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json(1)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.get_product(ProductId::new(1)).await.unwrap();
    let second = client.get_product(ProductId::new(1)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.title, "Tênis de Caminhada Leve Confortável");
    assert_eq!(first.price.to_string(), "179.90");
}

#[tokio::test]
async fn test_invalidated_product_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json(1)))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.get_product(ProductId::new(1)).await.unwrap();
    client.invalidate_product(ProductId::new(1)).await;
    client.get_product(ProductId::new(1)).await.unwrap();
}

#[tokio::test]
async fn test_product_extra_fields_survive() {
    let server = MockServer::start().await;
    let mut body = product_json(2);
    body["brand"] = json!("Adidas");
    Mock::given(method("GET"))
        .and(path("/products/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let product = client_for(&server)
        .get_product(ProductId::new(2))
        .await
        .unwrap();

    assert_eq!(product.extra.get("brand"), Some(&json!("Adidas")));
}

// =============================================================================
// Cart over HTTP
// =============================================================================

#[tokio::test]
async fn test_cart_manager_over_http() {
    let server = MockServer::start().await;
    mock_stock(&server, 1, 2).await;
    Mock::given(method("GET"))
        .and(path("/products/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json(1)))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(FlakyStore::new());
    let notices = Arc::new(RecordingNotifier::new());
    let manager = CartManager::load(client_for(&server), Arc::clone(&store), Arc::clone(&notices))
        .await
        .unwrap();

    assert!(manager.add_product(ProductId::new(1)).await.is_committed());
    assert!(manager.add_product(ProductId::new(1)).await.is_committed());
    assert!(!manager.add_product(ProductId::new(1)).await.is_committed());

    let cart = manager.cart();
    assert_eq!(cart.get(ProductId::new(1)).map(|p| p.amount()), Some(2));
    assert_eq!(store.stored_cart().as_ref(), Some(&*cart));
    assert_eq!(notices.messages().len(), 1);
}
