use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    BookAppointmentRequest, DateQuery, GeneratedSlotsResponse, RescheduleAppointmentRequest,
    SchedulingConfig, SchedulingError, UpdateStatusRequest,
};
use crate::router::SchedulingState;
use crate::services::slot_generator::{generate_time_slots, slot_status_message};

fn to_app_error(error: SchedulingError) -> AppError {
    match error {
        SchedulingError::InvalidConfiguration(msg) => AppError::ValidationError(msg),
        SchedulingError::InvalidTime(msg) => AppError::BadRequest(msg),
        SchedulingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        SchedulingError::ConfigNotFound(clinic_id) => {
            AppError::NotFound(format!("No scheduling configuration for clinic {}", clinic_id))
        }
        SchedulingError::InvalidStatusTransition(status) => {
            AppError::BadRequest(format!("Appointment cannot be modified while {}", status))
        }
        SchedulingError::RemoteWriteFailed(msg) => AppError::ExternalService(msg),
        SchedulingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Pure slot generation for a configuration supplied by the caller.
pub async fn generate_slots(
    Json(config): Json<SchedulingConfig>,
) -> Result<Json<GeneratedSlotsResponse>, AppError> {
    let slots = generate_time_slots(
        &config.operating_hours,
        config.slot_duration_minutes,
        &config.breaks,
    )
    .map_err(to_app_error)?;

    let count = slots.len();
    Ok(Json(GeneratedSlotsResponse {
        message: slot_status_message(count, config.booking_mode),
        slots,
        count,
    }))
}

pub async fn get_available_slots(
    State(state): State<SchedulingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    debug!("Fetching available slots for {}", query.date);

    let config = state
        .availability
        .fetch_config(&state.config.clinic_id, token)
        .await
        .map_err(to_app_error)?;

    let response = state
        .availability
        .get_slots_for_date(&config, query.date, token)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(response)))
}

pub async fn list_appointments(
    State(state): State<SchedulingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .store
        .load_appointments(query.date, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "date": query.date,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn book_appointment(
    State(state): State<SchedulingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .store
        .book_appointment(request, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(appointment)))
}

pub async fn reschedule_appointment(
    State(state): State<SchedulingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .store
        .reschedule_appointment(appointment_id, request, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(appointment)))
}

pub async fn update_appointment_status(
    State(state): State<SchedulingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .store
        .update_status(appointment_id, request.status, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(appointment)))
}

pub async fn cancel_appointment(
    State(state): State<SchedulingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .store
        .cancel_appointment(appointment_id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}
