// libs/payment-cell/src/services/reconciler.rs
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use appointment_cell::models::Appointment;
use appointment_cell::store::SchedulingStore;
use shared_models::auth::{Actor, Role};

use crate::models::{
    AuthorizePaymentRequest, PaymentConfirmation, PaymentError, PaymentOrder, VerifyPaymentRequest,
};
use crate::services::gateway::PaymentGateway;
use crate::services::signature::SignatureVerifier;

/// Two-step handshake with the processor: open an order for one
/// appointment, then accept a signed callback and flip `payment` once.
pub struct PaymentReconciler {
    store: Arc<dyn SchedulingStore>,
    gateway: Arc<dyn PaymentGateway>,
    verifier: SignatureVerifier,
    currency: String,
}

impl PaymentReconciler {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: SignatureVerifier,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            verifier,
            currency: currency.into(),
        }
    }

    #[instrument(skip(self, actor), fields(actor = %actor.subject))]
    pub async fn authorize(
        &self,
        actor: &Actor,
        request: AuthorizePaymentRequest,
    ) -> Result<PaymentOrder, PaymentError> {
        let appointment = self.load(request.appointment_id).await?;
        ensure_owner(&appointment, actor)?;

        if appointment.cancelled {
            return Err(PaymentError::AppointmentCancelled);
        }

        let receipt = appointment.id.to_string();
        let order = self
            .gateway
            .create_order(appointment.amount, &self.currency, &receipt)
            .await?;

        info!(
            "Opened order {} for appointment {} ({} {})",
            order.id, appointment.id, appointment.amount, self.currency
        );
        Ok(order)
    }

    #[instrument(skip(self, actor, request), fields(actor = %actor.subject, order = %request.razorpay_order_id))]
    pub async fn verify(
        &self,
        actor: &Actor,
        request: VerifyPaymentRequest,
    ) -> Result<PaymentConfirmation, PaymentError> {
        let order_id = request.razorpay_order_id.trim();
        let payment_id = request.razorpay_payment_id.trim();
        if order_id.is_empty() || payment_id.is_empty() || request.razorpay_signature.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Order id, payment id and signature are required".to_string(),
            ));
        }

        if let Err(e) = self
            .verifier
            .verify(order_id, payment_id, &request.razorpay_signature)
        {
            warn!("Rejected payment callback for order {}: bad signature", order_id);
            return Err(e);
        }

        let order = self.gateway.fetch_order(order_id).await?;
        let appointment_id = order
            .receipt
            .as_deref()
            .and_then(|receipt| Uuid::parse_str(receipt).ok())
            .ok_or(PaymentError::NotFound)?;

        let appointment = self.load(appointment_id).await?;
        ensure_owner(&appointment, actor)?;

        if !order.is_paid() {
            info!("Order {} for appointment {} is {}", order.id, appointment_id, order.status);
            return Err(PaymentError::PaymentNotCaptured {
                status: order.status,
            });
        }

        if appointment.cancelled {
            warn!("Payment captured for cancelled appointment {}", appointment_id);
        }

        let newly_applied = self.store.mark_paid(appointment_id).await?;
        if newly_applied {
            info!("Appointment {} marked paid via order {}", appointment_id, order.id);
        } else {
            info!("Duplicate payment callback for appointment {}", appointment_id);
        }

        Ok(PaymentConfirmation {
            appointment_id,
            newly_applied,
        })
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, PaymentError> {
        self.store
            .appointment(appointment_id)
            .await?
            .ok_or(PaymentError::NotFound)
    }
}

fn ensure_owner(appointment: &Appointment, actor: &Actor) -> Result<(), PaymentError> {
    if actor.is(Role::Patient, appointment.patient_id) {
        Ok(())
    } else {
        Err(PaymentError::Forbidden(
            "Appointment belongs to another patient".to_string(),
        ))
    }
}
