use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_database::supabase::SupabaseClient;

use crate::models::{
    AvailableSlotsResponse, RemoteSlot, SchedulingConfig, SchedulingError, SlotSource, TimeOfDay,
};
use crate::services::slot_generator::{generate_time_slots, slot_status_message};

pub const AVAILABLE_SLOTS_RPC: &str = "get_available_slots";

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Load the clinic's scheduling configuration.
    pub async fn fetch_config(
        &self,
        clinic_id: &str,
        auth_token: &str,
    ) -> Result<SchedulingConfig, SchedulingError> {
        let path = format!("/rest/v1/scheduling_configs?clinic_id=eq.{}", clinic_id);

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| SchedulingError::ConfigNotFound(clinic_id.to_string()))?;

        serde_json::from_value(row).map_err(|e| SchedulingError::DatabaseError(e.to_string()))
    }

    /// Slots for one day. The datastore's capacity check is authoritative;
    /// when it cannot be reached the local generator stands in.
    pub async fn get_slots_for_date(
        &self,
        config: &SchedulingConfig,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<AvailableSlotsResponse, SchedulingError> {
        config.validate()?;

        let (slots, source) = match self.fetch_remote_slots(config, date, auth_token).await {
            Ok(slots) => (slots, SlotSource::Remote),
            Err(e) => {
                warn!("Slot availability RPC failed for {}, using local slots: {}", date, e);
                let slots = generate_time_slots(
                    &config.operating_hours,
                    config.slot_duration_minutes,
                    &config.breaks,
                )?;
                (slots, SlotSource::Local)
            }
        };

        let count = slots.len();
        Ok(AvailableSlotsResponse {
            date,
            message: slot_status_message(count, config.booking_mode),
            slots,
            count,
            source,
        })
    }

    async fn fetch_remote_slots(
        &self,
        config: &SchedulingConfig,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<String>> {
        let params = json!({
            "p_date": date,
            "p_clinic_id": config.clinic_id,
            "p_duration": config.slot_duration_minutes,
            "p_active_chairs": config.active_chairs,
        });

        let rows: Vec<RemoteSlot> = self.supabase.rpc(AVAILABLE_SLOTS_RPC, Some(auth_token), params).await?;
        debug!("Availability RPC returned {} rows for {}", rows.len(), date);

        let mut slots = rows
            .into_iter()
            .filter(|row| row.available_chairs.map_or(true, |chairs| chairs > 0))
            .map(|row| row.slot_time.parse::<TimeOfDay>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        slots.sort();
        slots.dedup();

        Ok(slots.iter().map(TimeOfDay::to_string).collect())
    }
}
