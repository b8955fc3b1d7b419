use assert_matches::assert_matches;
use axum::extract::{Extension, Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use health_record_cell::handlers;
use health_record_cell::models::{CreateAllergyRequest, RecordError, RecordVisitRequest};
use health_record_cell::services::HealthRecordService;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockStoreResponses, TestConfig, TestUser};

#[tokio::test]
async fn recording_a_visit_appends_record_and_closes_appointment() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = HealthRecordService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/insertOne"))
        .and(body_partial_json(json!({ "collection": "visits" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::inserted("visit-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/insertOne"))
        .and(body_partial_json(json!({ "collection": "medical_records" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::inserted("rec-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/updateOne"))
        .and(body_partial_json(json!({
            "collection": "appointments",
            "filter": { "_id": "apt-1" },
            "update": { "$set": { "visit_completed": true } }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::updated(1, 1)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let visit = service
        .record_visit(
            "doc-1",
            RecordVisitRequest {
                patient_id: "pat-1".to_string(),
                appointment_id: Some("apt-1".to_string()),
                date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                summary: "Consultation de suivi, tension normale".to_string(),
                prescription: Some("Paracétamol 1g".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(visit.doctor_id, "doc-1");
    assert_eq!(visit.appointment_id.as_deref(), Some("apt-1"));
}

#[tokio::test]
async fn visit_without_appointment_skips_the_update() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = HealthRecordService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/insertOne"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::inserted("visit-1")),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/updateOne"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::updated(0, 0)),
        )
        .expect(0)
        .mount(&server)
        .await;

    service
        .record_visit(
            "doc-1",
            RecordVisitRequest {
                patient_id: "pat-1".to_string(),
                appointment_id: None,
                date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                summary: "Consultation sans rendez-vous".to_string(),
                prescription: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn allergy_requires_an_existing_patient() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = HealthRecordService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "patients" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()),
        )
        .mount(&server)
        .await;

    let result = service
        .add_allergy(
            "missing",
            CreateAllergyRequest {
                name: "Pénicilline".to_string(),
                severity: Some("forte".to_string()),
            },
        )
        .await;

    assert_matches!(result, Err(RecordError::PatientNotFound));
}

#[tokio::test]
async fn only_doctors_can_write_allergies() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::patient().to_user();

    let result = handlers::add_allergy(
        State(config.clone()),
        Extension(user.clone()),
        Path(user.id.clone()),
        Json(CreateAllergyRequest {
            name: "Pollen".to_string(),
            severity: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::Forbidden(_)));

    let result = handlers::delete_allergy(
        State(config),
        Extension(user.clone()),
        Path((user.id.clone(), "allergy-1".to_string())),
    )
    .await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}
