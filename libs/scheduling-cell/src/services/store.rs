use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, RescheduleAppointmentRequest,
    SchedulingError,
};
use crate::services::repository::AppointmentRepository;

/// Local appointment state kept in step with the datastore.
///
/// Every mutation is applied locally first, then written remotely. When the
/// remote write fails the touched entry is restored to its prior value and
/// `RemoteWriteFailed` is returned. The lock is never held across the remote
/// call, so a concurrent change to the same entry may be overwritten by a
/// rollback. No server-side exclusion for double bookings is assumed.
pub struct AppointmentStore {
    clinic_id: String,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    repository: Arc<dyn AppointmentRepository>,
}

impl AppointmentStore {
    pub fn new(clinic_id: impl Into<String>, repository: Arc<dyn AppointmentRepository>) -> Self {
        Self {
            clinic_id: clinic_id.into(),
            appointments: RwLock::new(HashMap::new()),
            repository,
        }
    }

    /// Replaces the local view with the datastore's rows for `date`. Entries
    /// for other days are dropped; mutations fetch them again on demand.
    pub async fn load_appointments(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let remote = self
            .repository
            .fetch_appointments(&self.clinic_id, date, auth_token)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;

        {
            let mut appointments = self.appointments.write().await;
            appointments.clear();
            for appointment in remote {
                appointments.insert(appointment.id, appointment);
            }
        }

        Ok(self.list_appointments(date).await)
    }

    /// Local view for one day, ordered by time then chair.
    pub async fn list_appointments(&self, date: NaiveDate) -> Vec<Appointment> {
        let appointments = self.appointments.read().await;
        let mut day: Vec<Appointment> = appointments
            .values()
            .filter(|appointment| appointment.date == date)
            .cloned()
            .collect();
        day.sort_by_key(|appointment| (appointment.time, appointment.chair_number));
        day
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Option<Appointment> {
        self.appointments.read().await.get(&appointment_id).cloned()
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        if request.duration_minutes <= 0 {
            return Err(SchedulingError::InvalidConfiguration(format!(
                "appointment duration must be positive, got {} minutes",
                request.duration_minutes
            )));
        }
        if request.patient_name.trim().is_empty() {
            return Err(SchedulingError::InvalidConfiguration(
                "patient name is required".to_string(),
            ));
        }

        let provisional = Appointment {
            id: Uuid::new_v4(),
            clinic_id: self.clinic_id.clone(),
            patient_name: request.patient_name,
            patient_phone: request.patient_phone,
            date: request.date,
            time: request.time,
            duration_minutes: request.duration_minutes,
            chair_number: request.chair_number,
            doctor_id: request.doctor_id,
            status: AppointmentStatus::Scheduled,
            notes: request.notes,
        };

        debug!("Optimistically booking {} at {} {}", provisional.id, provisional.date, provisional.time);
        self.appointments.write().await.insert(provisional.id, provisional.clone());

        match self.repository.insert_appointment(&provisional, auth_token).await {
            Ok(stored) => {
                let mut appointments = self.appointments.write().await;
                appointments.remove(&provisional.id);
                appointments.insert(stored.id, stored.clone());
                info!("Appointment {} booked for {} {}", stored.id, stored.date, stored.time);
                Ok(stored)
            }
            Err(e) => {
                warn!("Booking {} failed remotely, rolling back: {}", provisional.id, e);
                self.appointments.write().await.remove(&provisional.id);
                Err(SchedulingError::RemoteWriteFailed(e.to_string()))
            }
        }
    }

    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        self.apply_optimistic(appointment_id, auth_token, |appointment| {
            if appointment.status.is_terminal() {
                return Err(SchedulingError::InvalidStatusTransition(appointment.status));
            }
            appointment.date = request.date;
            appointment.time = request.time;
            if request.chair_number.is_some() {
                appointment.chair_number = request.chair_number;
            }
            Ok(())
        })
        .await
    }

    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        self.apply_optimistic(appointment_id, auth_token, |appointment| {
            if appointment.status.is_terminal() && appointment.status != status {
                return Err(SchedulingError::InvalidStatusTransition(appointment.status));
            }
            appointment.status = status;
            Ok(())
        })
        .await
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        self.update_status(appointment_id, AppointmentStatus::Cancelled, auth_token).await
    }

    /// Seeds the local map from the datastore when `appointment_id` is not
    /// held locally. `NotFound` only when the datastore has no such row.
    async fn ensure_loaded(&self, appointment_id: Uuid, auth_token: &str) -> Result<(), SchedulingError> {
        if self.appointments.read().await.contains_key(&appointment_id) {
            return Ok(());
        }

        debug!("Appointment {} not held locally, fetching", appointment_id);
        let remote = self
            .repository
            .fetch_appointment(appointment_id, auth_token)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?
            .ok_or(SchedulingError::NotFound)?;

        self.appointments
            .write()
            .await
            .entry(appointment_id)
            .or_insert(remote);
        Ok(())
    }

    async fn apply_optimistic<F>(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
        mutate: F,
    ) -> Result<Appointment, SchedulingError>
    where
        F: FnOnce(&mut Appointment) -> Result<(), SchedulingError>,
    {
        self.ensure_loaded(appointment_id, auth_token).await?;

        let (previous, updated) = {
            let mut appointments = self.appointments.write().await;
            let entry = appointments
                .get_mut(&appointment_id)
                .ok_or(SchedulingError::NotFound)?;
            let previous = entry.clone();
            mutate(entry)?;
            (previous, entry.clone())
        };

        match self.repository.update_appointment(&updated, auth_token).await {
            Ok(stored) => {
                self.appointments.write().await.insert(stored.id, stored.clone());
                Ok(stored)
            }
            Err(e) => {
                warn!("Update of {} failed remotely, rolling back: {}", appointment_id, e);
                self.appointments.write().await.insert(previous.id, previous);
                Err(SchedulingError::RemoteWriteFailed(e.to_string()))
            }
        }
    }
}
