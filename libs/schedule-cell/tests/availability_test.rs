use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assert_matches::assert_matches;
use schedule_cell::{AvailabilityError, AvailabilityService};
use shared_utils::test_utils::{MockStorageResponses, TestConfig};

// 2025-06-02 is a Monday
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

async fn mount_monday_schedule(server: &MockServer, barber_id: Uuid, slots: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/weekly_schedules"))
        .and(query_param("barber_id", format!("eq.{}", barber_id)))
        .and(query_param("day_of_week", "eq.monday"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStorageResponses::weekly_schedule_response(barber_id, "monday", slots)
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn availability_splits_template_into_free_and_booked() {
    let mock_server = MockServer::start().await;
    let barber_id = Uuid::new_v4();

    mount_monday_schedule(&mock_server, barber_id, &["09:00", "10:00", "11:00"]).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("barber_id", format!("eq.{}", barber_id)))
        .and(query_param("date", format!("eq.{}", monday())))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStorageResponses::appointment_response(
                Uuid::new_v4(),
                barber_id,
                monday(),
                "10:00",
                "confirmed"
            )
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri()).to_app_config();
    let service = AvailabilityService::new(&config);

    let day = service.get_availability(barber_id, monday()).await.unwrap();
    assert_eq!(day.available_slots, vec!["09:00", "11:00"]);
    assert_eq!(day.booked_slots, vec!["10:00"]);

    // Idempotent: a second read with no intervening writes is identical.
    let again = service.get_availability(barber_id, monday()).await.unwrap();
    assert_eq!(again.available_slots, day.available_slots);
    assert_eq!(again.booked_slots, day.booked_slots);
}

#[tokio::test]
async fn missing_active_schedule_is_not_found() {
    let mock_server = MockServer::start().await;
    let barber_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/weekly_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri()).to_app_config();
    let service = AvailabilityService::new(&config);

    let result = service.get_availability(barber_id, monday()).await;
    assert_matches!(result, Err(AvailabilityError::NotFound));
}

#[tokio::test]
async fn occupied_slot_outside_template_is_not_reported() {
    let mock_server = MockServer::start().await;
    let barber_id = Uuid::new_v4();

    mount_monday_schedule(&mock_server, barber_id, &["09:00", "10:00"]).await;

    // Booked at 08:30, which the edited template no longer offers.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStorageResponses::appointment_response(
                Uuid::new_v4(),
                barber_id,
                monday(),
                "08:30",
                "confirmed"
            )
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri()).to_app_config();
    let service = AvailabilityService::new(&config);

    let day = service.get_availability(barber_id, monday()).await.unwrap();
    assert_eq!(day.available_slots, vec!["09:00", "10:00"]);
    assert!(day.booked_slots.is_empty());
}

#[tokio::test]
async fn cancelled_slot_reappears_in_availability() {
    let mock_server = MockServer::start().await;
    let barber_id = Uuid::new_v4();

    mount_monday_schedule(&mock_server, barber_id, &["09:00", "10:00", "11:00"]).await;

    // First read sees the 10:00 booking; after cancellation the ledger query
    // no longer returns it.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStorageResponses::appointment_response(
                Uuid::new_v4(),
                barber_id,
                monday(),
                "10:00",
                "confirmed"
            )
        ])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri()).to_app_config();
    let service = AvailabilityService::new(&config);

    let before = service.get_availability(barber_id, monday()).await.unwrap();
    assert_eq!(before.booked_slots, vec!["10:00"]);

    let after = service.get_availability(barber_id, monday()).await.unwrap();
    assert_eq!(after.available_slots, vec!["09:00", "10:00", "11:00"]);
    assert!(after.booked_slots.is_empty());
}

#[tokio::test]
async fn week_availability_skips_days_without_a_template() {
    let mock_server = MockServer::start().await;
    let barber_id = Uuid::new_v4();

    // Only Monday has an active template.
    mount_monday_schedule(&mock_server, barber_id, &["09:00"]).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/weekly_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_storage_url(&mock_server.uri()).to_app_config();
    let service = AvailabilityService::new(&config);

    let week = service.get_week_availability(barber_id, monday()).await.unwrap();
    assert_eq!(week.len(), 1);
    assert_eq!(week[0].date, monday());
}
