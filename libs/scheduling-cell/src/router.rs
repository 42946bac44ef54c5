use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, patch},
};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::handlers;
use crate::services::{
    AppointmentRepository, AppointmentStore, AvailabilityService, SupabaseAppointmentRepository,
};

#[derive(Clone)]
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub store: Arc<AppointmentStore>,
    pub availability: Arc<AvailabilityService>,
}

impl SchedulingState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(&config));
        let repository = Arc::new(SupabaseAppointmentRepository::new(Arc::clone(&supabase)));
        Self::with_repository(config, supabase, repository)
    }

    pub fn with_repository(
        config: Arc<AppConfig>,
        supabase: Arc<SupabaseClient>,
        repository: Arc<dyn AppointmentRepository>,
    ) -> Self {
        let store = Arc::new(AppointmentStore::new(config.clinic_id.clone(), repository));
        let availability = Arc::new(AvailabilityService::new(supabase));

        Self { config, store, availability }
    }
}

pub fn scheduling_routes(config: Arc<AppConfig>) -> Router {
    scheduling_router(SchedulingState::new(config))
}

pub fn scheduling_router(state: SchedulingState) -> Router {
    Router::new()
        .route("/slots/generate", post(handlers::generate_slots))
        .route("/slots", get(handlers::get_available_slots))
        .route("/appointments", get(handlers::list_appointments).post(handlers::book_appointment))
        .route("/appointments/{appointment_id}/reschedule", patch(handlers::reschedule_appointment))
        .route("/appointments/{appointment_id}/status", patch(handlers::update_appointment_status))
        .route("/appointments/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .with_state(state)
}
