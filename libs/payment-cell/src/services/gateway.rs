// libs/payment-cell/src/services/gateway.rs
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::models::{CreateOrderRequest, PaymentError, PaymentOrder};

/// External payment processor. Request/response only; callers never retry.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder, PaymentError>;

    async fn fetch_order(&self, order_id: &str) -> Result<PaymentOrder, PaymentError>;
}

pub struct RazorpayClient {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.razorpay_base_url.trim_end_matches('/').to_string(),
            key_id: config.razorpay_key_id.clone(),
            key_secret: config.razorpay_key_secret.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        self.client
            .request(method, &url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, PaymentError> {
        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::GatewayError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Razorpay error ({}): {}", status, error_text);
            return Err(PaymentError::GatewayError(format!("processor returned {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PaymentError::GatewayError(format!("Failed to parse order: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder, PaymentError> {
        let body = CreateOrderRequest {
            amount,
            currency,
            receipt,
        };

        self.send(self.request(Method::POST, "/orders").json(&body))
            .await
    }

    async fn fetch_order(&self, order_id: &str) -> Result<PaymentOrder, PaymentError> {
        let path = format!("/orders/{}", urlencoding::encode(order_id));
        self.send(self.request(Method::GET, &path)).await
    }
}
