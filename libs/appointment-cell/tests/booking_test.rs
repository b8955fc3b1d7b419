use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{AppointmentError, AppointmentStatus, BookAppointmentRequest};
use appointment_cell::services::BookingService;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

// 2026-03-02 is a Monday, 2026-03-08 a Sunday.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()
}

/// Store-only config: the mail relay stays unconfigured so notification
/// delivery is skipped with a warning instead of needing its own mocks.
fn store_only_config(server: &MockServer) -> shared_config::AppConfig {
    TestConfig {
        data_api_url: server.uri(),
        ..TestConfig::default()
    }
    .to_app_config()
}

fn booking_request(date: NaiveDate, time: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id: "doc-1".to_string(),
        patient_id: "pat-1".to_string(),
        date,
        time: time.to_string(),
        consultation_type: "Consultation générale".to_string(),
        reason: "Suivi".to_string(),
    }
}

async fn mount_weekday_grid(server: &MockServer, day: &str) {
    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({
            "collection": "availabilities",
            "filter": { "doctor_id": "doc-1", "day": day }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::availability_document("doc-1", day),
        )))
        .mount(server)
        .await;
}

async fn mount_contact_documents(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "patients" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(json!({
            "_id": "pat-1",
            "first_name": "Marie",
            "last_name": "Dupont",
            "email": "marie.dupont@example.com"
        }))))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "doctors" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::doctor_document("doc-1", "Martin"),
        )))
        .mount(server)
        .await;
}

#[tokio::test]
async fn books_a_free_weekday_slot_as_pending() {
    let server = MockServer::start().await;
    let service = BookingService::new(&store_only_config(&server));

    mount_weekday_grid(&server, "lundi").await;
    mount_contact_documents(&server).await;

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({
            "collection": "appointments",
            "filter": { "doctor_id": "doc-1", "time": "10:00" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/insertOne"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::inserted("apt-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let appointment = service.book(booking_request(monday(), "10:00")).await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert!(!appointment.visit_completed);
    assert_eq!(appointment.time, "10:00");
}

#[tokio::test]
async fn sunday_has_no_grid_so_booking_is_rejected() {
    let server = MockServer::start().await;
    let service = BookingService::new(&store_only_config(&server));

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "availabilities" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()),
        )
        .mount(&server)
        .await;

    let result = service.book(booking_request(sunday(), "10:00")).await;

    assert_matches!(
        result,
        Err(AppointmentError::SlotUnavailable { .. })
    );
}

#[tokio::test]
async fn occupied_slot_is_a_conflict() {
    let server = MockServer::start().await;
    let service = BookingService::new(&store_only_config(&server));

    mount_weekday_grid(&server, "lundi").await;

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::appointment_document("doc-1", "pat-2", "2026-03-02", "10:00", "confirmed"),
        )))
        .mount(&server)
        .await;

    let result = service.book(booking_request(monday(), "10:00")).await;

    assert_matches!(result, Err(AppointmentError::SlotTaken { .. }));
}

#[tokio::test]
async fn duplicate_key_on_insert_is_reported_as_conflict() {
    let server = MockServer::start().await;
    let service = BookingService::new(&store_only_config(&server));

    mount_weekday_grid(&server, "lundi").await;

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()),
        )
        .mount(&server)
        .await;

    // A concurrent booking won the race: the unique index rejects ours.
    Mock::given(method("POST"))
        .and(path("/action/insertOne"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(MockStoreResponses::duplicate_key_error()),
        )
        .mount(&server)
        .await;

    let result = service.book(booking_request(monday(), "11:00")).await;

    assert_matches!(result, Err(AppointmentError::SlotTaken { .. }));
}

#[tokio::test]
async fn cancelled_appointment_does_not_block_rebooking() {
    let server = MockServer::start().await;
    let service = BookingService::new(&store_only_config(&server));

    mount_weekday_grid(&server, "lundi").await;
    mount_contact_documents(&server).await;

    // The conflict lookup excludes cancelled appointments, so the store
    // reports the slot free even though a cancelled one sits on it.
    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({
            "collection": "appointments",
            "filter": {
                "doctor_id": "doc-1",
                "time": "10:00",
                "status": { "$ne": "cancelled" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/insertOne"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::inserted("apt-2")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let appointment = service.book(booking_request(monday(), "10:00")).await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn free_slots_exclude_live_appointments() {
    let server = MockServer::start().await;
    let service = BookingService::new(&store_only_config(&server));

    mount_weekday_grid(&server, "lundi").await;

    Mock::given(method("POST"))
        .and(path("/action/find"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::documents(
            vec![
                MockStoreResponses::appointment_document("doc-1", "pat-2", "2026-03-02", "09:00", "pending"),
                MockStoreResponses::appointment_document("doc-1", "pat-3", "2026-03-02", "14:00", "confirmed"),
            ],
        )))
        .mount(&server)
        .await;

    let slots = service.free_slots("doc-1", monday()).await.unwrap();

    assert_eq!(slots.len(), 8);
    assert!(!slots.contains(&"09:00".to_string()));
    assert!(!slots.contains(&"14:00".to_string()));
    assert!(slots.contains(&"10:00".to_string()));
}

#[tokio::test]
async fn cancelled_appointment_cannot_be_rescheduled() {
    let server = MockServer::start().await;
    let service = BookingService::new(&store_only_config(&server));

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::appointment_document("doc-1", "pat-1", "2026-03-02", "10:00", "cancelled"),
        )))
        .mount(&server)
        .await;

    let result = service
        .reschedule(
            "apt-1",
            appointment_cell::models::RescheduleAppointmentRequest {
                date: monday(),
                time: "11:00".to_string(),
            },
        )
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
}

#[tokio::test]
async fn confirming_a_cancelled_appointment_fails() {
    let server = MockServer::start().await;
    let service = BookingService::new(&store_only_config(&server));

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::appointment_document("doc-1", "pat-1", "2026-03-02", "10:00", "cancelled"),
        )))
        .mount(&server)
        .await;

    let result = service.confirm("apt-1").await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
}
