// libs/appointment-cell/src/store/supabase.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use super::{
    AppointmentFilter, CompletionOutcome, PractitionerChanges, ReleaseWrite, ReservationWrite,
    SchedulingStore, StoreError,
};
use crate::models::{Appointment, PatientProfile, Practitioner};

/// PostgREST-backed store. The two ledger units run as Postgres functions
/// (see `sql/scheduling.sql`) so each commits in one transaction.
pub struct SupabaseStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn get_rows<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None, None)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| StoreError::Backend(format!("Failed to parse row: {}", e)))
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        Ok(self.get_rows(path).await?.into_iter().next())
    }

    async fn patch_rows(&self, path: &str, body: Value) -> Result<Vec<Value>, StoreError> {
        self.supabase
            .request_with_headers(
                Method::PATCH,
                path,
                None,
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn call_commit(&self, function: &str, params: Value, practitioner_id: Uuid) -> Result<(), StoreError> {
        let committed: bool = self
            .supabase
            .rpc(function, params)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if committed {
            debug!("{} committed for doctor {}", function, practitioner_id);
            Ok(())
        } else {
            warn!("{} rejected: doctor {} version moved", function, practitioner_id);
            Err(StoreError::VersionConflict(practitioner_id))
        }
    }
}

#[async_trait]
impl SchedulingStore for SupabaseStore {
    async fn practitioner(&self, id: Uuid) -> Result<Option<Practitioner>, StoreError> {
        self.get_one(&format!("/rest/v1/doctors?id=eq.{}", id)).await
    }

    async fn practitioners(&self) -> Result<Vec<Practitioner>, StoreError> {
        self.get_rows("/rest/v1/doctors").await
    }

    async fn patient(&self, id: Uuid) -> Result<Option<PatientProfile>, StoreError> {
        self.get_one(&format!("/rest/v1/users?id=eq.{}", id)).await
    }

    async fn patient_count(&self) -> Result<usize, StoreError> {
        let rows: Vec<Value> = self.get_rows("/rest/v1/users?select=id").await?;
        Ok(rows.len())
    }

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.get_one(&format!("/rest/v1/appointments?id=eq.{}", id)).await
    }

    async fn appointments(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let mut query_parts = Vec::new();
        match filter {
            AppointmentFilter::All => {}
            AppointmentFilter::Patient(id) => query_parts.push(format!("patient_id=eq.{}", id)),
            AppointmentFilter::Practitioner(id) => query_parts.push(format!("doctor_id=eq.{}", id)),
        }
        query_parts.push("order=created_at.desc".to_string());

        self.get_rows(&format!("/rest/v1/appointments?{}", query_parts.join("&")))
            .await
    }

    async fn commit_reservation(&self, write: ReservationWrite) -> Result<(), StoreError> {
        let appointment = serde_json::to_value(&write.appointment)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let params = json!({
            "p_doctor_id": write.practitioner_id,
            "p_expected_version": write.expected_version,
            "p_slots_booked": write.slots_booked,
            "p_appointment": appointment,
        });

        self.call_commit("commit_reservation", params, write.practitioner_id)
            .await
    }

    async fn commit_release(&self, write: ReleaseWrite) -> Result<(), StoreError> {
        let params = json!({
            "p_appointment_id": write.appointment_id,
            "p_doctor_id": write.practitioner_id,
            "p_expected_version": write.expected_version,
            "p_slots_booked": write.slots_booked,
        });

        self.call_commit("commit_release", params, write.practitioner_id)
            .await
    }

    async fn update_practitioner(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: PractitionerChanges,
    ) -> Result<Practitioner, StoreError> {
        let mut update_data = serde_json::Map::new();
        if let Some(fees) = changes.fees {
            update_data.insert("fees".to_string(), json!(fees));
        }
        if let Some(available) = changes.available {
            update_data.insert("available".to_string(), json!(available));
        }
        update_data.insert("version".to_string(), json!(expected_version + 1));

        let path = format!("/rest/v1/doctors?id=eq.{}&version=eq.{}", id, expected_version);
        let rows = self.patch_rows(&path, Value::Object(update_data)).await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or(StoreError::VersionConflict(id))?;
        serde_json::from_value(row).map_err(|e| StoreError::Backend(format!("Failed to parse doctor: {}", e)))
    }

    async fn mark_completed(&self, appointment_id: Uuid) -> Result<CompletionOutcome, StoreError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&is_completed=eq.false&cancelled=eq.false",
            appointment_id
        );
        let rows = self.patch_rows(&path, json!({ "is_completed": true })).await?;
        if !rows.is_empty() {
            return Ok(CompletionOutcome::Completed);
        }

        match self.appointment(appointment_id).await? {
            Some(a) if a.cancelled => Ok(CompletionOutcome::Cancelled),
            Some(_) => Ok(CompletionOutcome::AlreadyCompleted),
            None => Err(StoreError::Backend(format!("appointment {} missing", appointment_id))),
        }
    }

    /// An empty representation means either the flag was already set or the
    /// row does not exist.
    async fn mark_paid(&self, appointment_id: Uuid) -> Result<bool, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&payment=eq.false", appointment_id);
        let rows = self.patch_rows(&path, json!({ "payment": true })).await?;
        if !rows.is_empty() {
            return Ok(true);
        }

        match self.appointment(appointment_id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::Backend(format!("appointment {} missing", appointment_id))),
        }
    }
}
