// libs/payment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use appointment_cell::store::StoreError;
use shared_models::error::{AppError, FailureKind};

// ==============================================================================
// PROCESSOR MODELS
// ==============================================================================

/// Order as the processor returns it. Unknown fields are carried through so
/// the handle reaches the client verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaymentOrder {
    pub fn is_paid(&self) -> bool {
        self.status == "paid"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest<'a> {
    pub amount: i64,
    pub currency: &'a str,
    pub receipt: &'a str,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizePaymentRequest {
    pub appointment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentConfirmation {
    pub appointment_id: Uuid,
    /// False when the appointment was already marked paid.
    pub newly_applied: bool,
}

// ==============================================================================
// ERROR MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("Unauthorized action: {0}")]
    Forbidden(String),

    #[error("Appointment is cancelled")]
    AppointmentCancelled,

    #[error("Payment verification failed")]
    SignatureInvalid,

    #[error("Payment not captured (order status: {status})")]
    PaymentNotCaptured { status: String },

    #[error("Payment gateway error: {0}")]
    GatewayError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Payments are not configured")]
    NotConfigured,
}

impl PaymentError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PaymentError::ValidationError(_) => FailureKind::Validation,
            PaymentError::NotFound => FailureKind::NotFound,
            PaymentError::Forbidden(_) => FailureKind::Forbidden,
            PaymentError::AppointmentCancelled => FailureKind::Terminal,
            PaymentError::SignatureInvalid => FailureKind::SignatureInvalid,
            PaymentError::PaymentNotCaptured { .. } => FailureKind::Conflict,
            PaymentError::GatewayError(_) | PaymentError::DatabaseError(_) => {
                FailureKind::ExternalService
            }
            PaymentError::NotConfigured => FailureKind::Internal,
        }
    }
}

impl From<StoreError> for PaymentError {
    fn from(error: StoreError) -> Self {
        PaymentError::DatabaseError(error.to_string())
    }
}

impl From<PaymentError> for AppError {
    fn from(error: PaymentError) -> Self {
        AppError::from_kind(error.kind(), error.to_string())
    }
}
