use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use payment_cell::models::PaymentError;
use payment_cell::services::gateway::{PaymentGateway, RazorpayClient};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

// base64("rzp_test_key:test-razorpay-secret")
const BASIC_AUTH: &str = "Basic cnpwX3Rlc3Rfa2V5OnRlc3QtcmF6b3JwYXktc2VjcmV0";

fn client_for(server: &MockServer) -> RazorpayClient {
    RazorpayClient::new(&TestConfig::with_mock_server(&server.uri()).to_app_config())
}

#[tokio::test]
async fn create_order_posts_amount_currency_and_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .and(header("Authorization", BASIC_AUTH))
        .and(body_json(json!({ "amount": 50000, "currency": "INR", "receipt": "appt-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSupabaseResponses::razorpay_order(
            "order_1", 50000, "appt-1", "created",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let order = client_for(&server).create_order(50000, "INR", "appt-1").await.unwrap();

    assert_eq!(order.id, "order_1");
    assert_eq!(order.status, "created");
    assert_eq!(order.extra["entity"], "order");
}

#[tokio::test]
async fn fetch_order_reads_status_and_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/orders/order_1"))
        .and(header("Authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSupabaseResponses::razorpay_order(
            "order_1", 50000, "appt-1", "paid",
        )))
        .mount(&server)
        .await;

    let order = client_for(&server).fetch_order("order_1").await.unwrap();

    assert!(order.is_paid());
    assert_eq!(order.receipt.as_deref(), Some("appt-1"));
}

#[tokio::test]
async fn processor_errors_surface_as_gateway_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/orders/order_missing"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": "BAD_REQUEST_ERROR", "description": "The id provided does not exist" }
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_order("order_missing").await;
    assert_matches!(result, Err(PaymentError::GatewayError(_)));
}

#[tokio::test]
async fn unreachable_processor_is_a_gateway_error() {
    let mut config = TestConfig::default().to_app_config();
    config.razorpay_base_url = "http://127.0.0.1:9/v1".to_string();

    let result = RazorpayClient::new(&config).create_order(100, "INR", "r").await;
    assert_matches!(result, Err(PaymentError::GatewayError(_)));
}
