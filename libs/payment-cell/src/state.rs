// libs/payment-cell/src/state.rs
use std::sync::Arc;

use appointment_cell::store::SchedulingStore;
use shared_config::AppConfig;

use crate::models::PaymentError;
use crate::services::gateway::{PaymentGateway, RazorpayClient};
use crate::services::reconciler::PaymentReconciler;
use crate::services::signature::SignatureVerifier;

#[derive(Clone)]
pub struct PaymentState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SchedulingStore>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl PaymentState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn SchedulingStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
        }
    }

    /// Wires the Razorpay client from configuration.
    pub fn with_razorpay(config: Arc<AppConfig>, store: Arc<dyn SchedulingStore>) -> Self {
        let gateway = Arc::new(RazorpayClient::new(&config));
        Self::new(config, store, gateway)
    }

    pub fn reconciler(&self) -> Result<PaymentReconciler, PaymentError> {
        if !self.config.is_payment_configured() {
            return Err(PaymentError::NotConfigured);
        }

        let verifier = SignatureVerifier::new(&self.config.razorpay_key_secret)?;
        Ok(PaymentReconciler::new(
            self.store.clone(),
            self.gateway.clone(),
            verifier,
            self.config.currency.clone(),
        ))
    }
}
