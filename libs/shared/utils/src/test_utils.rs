use std::sync::Arc;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

pub const TEST_TOKEN: &str = "test-access-token";

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub clinic_id: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            clinic_id: "11111111-1111-1111-1111-111111111111".to_string(),
        }
    }
}

impl TestConfig {
    /// Points the datastore at a mock server (e.g. `MockServer::uri()`).
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            clinic_id: self.clinic_id.clone(),
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// Morning clinic, 30 minute slots, lunch at 10:30.
    pub fn scheduling_config_response(clinic_id: &str) -> serde_json::Value {
        json!({
            "clinic_id": clinic_id,
            "operating_hours": { "open": "09:00:00", "close": "12:00:00" },
            "slot_duration_minutes": 30,
            "breaks": [
                { "id": "lunch", "label": "Lunch", "start": "10:30:00", "end": "11:00:00" }
            ],
            "booking_mode": "manual",
            "active_chairs": 2
        })
    }

    pub fn appointment_response(clinic_id: &str, date: &str, time: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "clinic_id": clinic_id,
            "patient_name": "Test Patient",
            "patient_phone": "+10000000000",
            "date": date,
            "time": time,
            "duration_minutes": 30,
            "chair_number": 1,
            "doctor_id": null,
            "status": "scheduled",
            "notes": null
        })
    }

    pub fn available_slots_response(times: &[&str]) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = times
            .iter()
            .map(|time| json!({ "slot_time": time, "available_chairs": 1 }))
            .collect();
        json!(rows)
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
