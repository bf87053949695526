use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub storage_url: String,
    pub storage_api_key: String,
    pub notifier_webhook_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            storage_url: "http://localhost:54321".to_string(),
            storage_api_key: "test-api-key".to_string(),
            notifier_webhook_url: "http://localhost:54322/notify".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointed at a wiremock storage server.
    pub fn with_storage_url(storage_url: &str) -> Self {
        Self {
            storage_url: storage_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            storage_url: self.storage_url.clone(),
            storage_api_key: self.storage_api_key.clone(),
            notifier_webhook_url: self.notifier_webhook_url.clone(),
            scan_interval_seconds: 300,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST row payloads matching what the storage layer hands back.
pub struct MockStorageResponses;

impl MockStorageResponses {
    pub fn weekly_schedule_response(
        barber_id: Uuid,
        day_of_week: &str,
        time_slots: &[&str],
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "barber_id": barber_id,
            "day_of_week": day_of_week,
            "time_slots": time_slots,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        })
    }

    pub fn appointment_response(
        customer_id: Uuid,
        barber_id: Uuid,
        date: NaiveDate,
        time_slot: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "customer_id": customer_id,
            "barber_id": barber_id,
            "service_id": Uuid::new_v4(),
            "date": date.to_string(),
            "time_slot": time_slot,
            "status": status,
            "reschedule_count": 0,
            "notes": null,
            "reminder_upcoming_sent_at": null,
            "reminder_day_before_sent_at": null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        })
    }

    pub fn scan_lock_response(lock_key: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "lock_key": lock_key,
            "acquired_at": Utc::now().to_rfc3339(),
            "expires_at": (Utc::now() + chrono::Duration::seconds(120)).to_rfc3339(),
            "process_id": format!("scanner_{}", Uuid::new_v4())
        })
    }
}
