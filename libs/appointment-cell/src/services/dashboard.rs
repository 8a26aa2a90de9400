// libs/appointment-cell/src/services/dashboard.rs
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{Actor, Role};

use crate::models::{AdminDashboard, Appointment, AppointmentError, PractitionerDashboard};
use crate::store::{AppointmentFilter, SchedulingStore};

const LATEST_APPOINTMENTS: usize = 5;

/// Read-only views over appointment records.
pub struct DashboardService {
    store: Arc<dyn SchedulingStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn patient_appointments(&self, actor: &Actor) -> Result<Vec<Appointment>, AppointmentError> {
        let patient_id = require(actor, Role::Patient)?;
        Ok(self.store.appointments(AppointmentFilter::Patient(patient_id)).await?)
    }

    pub async fn practitioner_appointments(
        &self,
        actor: &Actor,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let practitioner_id = require(actor, Role::Practitioner)?;
        Ok(self
            .store
            .appointments(AppointmentFilter::Practitioner(practitioner_id))
            .await?)
    }

    pub async fn all_appointments(&self, actor: &Actor) -> Result<Vec<Appointment>, AppointmentError> {
        require_admin(actor)?;
        Ok(self.store.appointments(AppointmentFilter::All).await?)
    }

    pub async fn practitioner_dashboard(
        &self,
        actor: &Actor,
    ) -> Result<PractitionerDashboard, AppointmentError> {
        let practitioner_id = require(actor, Role::Practitioner)?;
        let appointments = self
            .store
            .appointments(AppointmentFilter::Practitioner(practitioner_id))
            .await?;

        let earnings = appointments
            .iter()
            .filter(|a| a.is_completed || a.payment)
            .map(|a| a.amount)
            .sum();
        let patients = appointments
            .iter()
            .map(|a| a.patient_id)
            .collect::<HashSet<Uuid>>()
            .len();

        debug!("Dashboard for doctor {}: {} appointments", practitioner_id, appointments.len());

        Ok(PractitionerDashboard {
            earnings,
            appointments: appointments.len(),
            patients,
            latest_appointments: appointments.into_iter().take(LATEST_APPOINTMENTS).collect(),
        })
    }

    pub async fn admin_dashboard(&self, actor: &Actor) -> Result<AdminDashboard, AppointmentError> {
        require_admin(actor)?;

        let doctors = self.store.practitioners().await?.len();
        let patients = self.store.patient_count().await?;
        let appointments = self.store.appointments(AppointmentFilter::All).await?;

        Ok(AdminDashboard {
            doctors,
            appointments: appointments.len(),
            patients,
            latest_appointments: appointments.into_iter().take(LATEST_APPOINTMENTS).collect(),
        })
    }
}

fn require(actor: &Actor, role: Role) -> Result<Uuid, AppointmentError> {
    match actor.subject_id() {
        Some(id) if actor.role == role => Ok(id),
        _ => Err(AppointmentError::Forbidden(format!("Requires {} role", role))),
    }
}

fn require_admin(actor: &Actor) -> Result<(), AppointmentError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppointmentError::Forbidden("Requires admin role".to_string()))
    }
}
