use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::{CreateDoctorRequest, DoctorError};
use doctor_cell::services::DoctorService;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn create_request(email: &str) -> CreateDoctorRequest {
    CreateDoctorRequest {
        first_name: "Jean".to_string(),
        last_name: "Martin".to_string(),
        specialty: "Médecine générale".to_string(),
        email: email.to_string(),
        phone: Some("0102030405".to_string()),
    }
}

#[tokio::test]
async fn creating_a_doctor_seeds_availability() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = DoctorService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "doctors" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/insertOne"))
        .and(body_partial_json(json!({ "collection": "doctors" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::inserted("doc-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/updateOne"))
        .and(body_partial_json(json!({ "collection": "availabilities" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::updated(0, 0)),
        )
        .expect(5)
        .mount(&server)
        .await;

    let doctor = service
        .create_doctor(create_request("martin@bienetre-clinique.fr"))
        .await
        .unwrap();

    assert_eq!(doctor.full_name(), "Jean Martin");
    assert_eq!(doctor.specialty, "Médecine générale");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = DoctorService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::doctor_document("doc-1", "Martin"),
        )))
        .mount(&server)
        .await;

    let result = service
        .create_doctor(create_request("martin@bienetre-clinique.fr"))
        .await;

    assert_matches!(result, Err(DoctorError::EmailTaken(_)));
}

#[tokio::test]
async fn missing_doctor_maps_to_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = DoctorService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()),
        )
        .mount(&server)
        .await;

    let result = service.get_doctor("missing").await;
    assert_matches!(result, Err(DoctorError::NotFound));
}
