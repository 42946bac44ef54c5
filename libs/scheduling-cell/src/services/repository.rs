use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::Appointment;

/// Remote persistence for appointments. The store writes through this after
/// applying its optimistic local change.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn fetch_appointments(
        &self,
        clinic_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>>;

    /// `Ok(None)` when no row has this id.
    async fn fetch_appointment(&self, appointment_id: Uuid, auth_token: &str) -> Result<Option<Appointment>>;

    async fn insert_appointment(&self, appointment: &Appointment, auth_token: &str) -> Result<Appointment>;

    async fn update_appointment(&self, appointment: &Appointment, auth_token: &str) -> Result<Appointment>;
}

pub struct SupabaseAppointmentRepository {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentRepository {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn first_row(rows: Vec<Value>, action: &str) -> Result<Appointment> {
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to {} appointment: empty response", action))?;
        Ok(serde_json::from_value(row)?)
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseAppointmentRepository {
    async fn fetch_appointments(
        &self,
        clinic_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?clinic_id=eq.{}&date=eq.{}&order=time.asc",
            clinic_id, date
        );

        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        debug!("Fetched {} appointments for clinic {} on {}", rows.len(), clinic_id, date);

        let appointments = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Appointment>, _>>()?;

        Ok(appointments)
    }

    async fn fetch_appointment(&self, appointment_id: Uuid, auth_token: &str) -> Result<Option<Appointment>> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn insert_appointment(&self, appointment: &Appointment, auth_token: &str) -> Result<Appointment> {
        let rows: Vec<Value> = self
            .supabase
            .request_returning(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(serde_json::to_value(appointment)?),
            )
            .await?;

        Self::first_row(rows, "create")
    }

    async fn update_appointment(&self, appointment: &Appointment, auth_token: &str) -> Result<Appointment> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let update_data = json!({
            "date": appointment.date,
            "time": appointment.time,
            "chair_number": appointment.chair_number,
            "status": appointment.status,
            "notes": appointment.notes,
        });

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, Some(auth_token), Some(update_data))
            .await?;

        Self::first_row(rows, "update")
    }
}
