// libs/payment-cell/src/services/signature.rs
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over `order_id|payment_id`, hex encoded, keyed with the
/// processor secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: &str) -> Result<Self, PaymentError> {
        if secret.is_empty() {
            return Err(PaymentError::NotConfigured);
        }
        Ok(Self {
            secret: secret.as_bytes().to_vec(),
        })
    }

    fn mac(&self, order_id: &str, payment_id: &str) -> Result<HmacSha256, PaymentError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| PaymentError::NotConfigured)?;
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Ok(mac)
    }

    pub fn sign(&self, order_id: &str, payment_id: &str) -> Result<String, PaymentError> {
        let digest = self.mac(order_id, payment_id)?.finalize().into_bytes();
        Ok(hex::encode(digest))
    }

    /// Constant-time comparison against the hex signature from the callback.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<(), PaymentError> {
        let provided = hex::decode(signature.trim()).map_err(|_| PaymentError::SignatureInvalid)?;

        self.mac(order_id, payment_id)?
            .verify_slice(&provided)
            .map_err(|_| PaymentError::SignatureInvalid)
    }
}
