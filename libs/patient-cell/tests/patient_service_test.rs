use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::models::{CreateContactRequest, PatientError};
use patient_cell::services::PatientService;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn patient_document(id: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "first_name": "Marie",
        "last_name": "Dupont",
        "email": "marie.dupont@example.com",
        "phone": "0601020304"
    })
}

#[tokio::test]
async fn deleting_a_patient_cascades_to_contacts_and_addresses() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = PatientService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/deleteOne"))
        .and(body_partial_json(json!({ "collection": "patients" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::deleted(1)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/deleteMany"))
        .and(body_partial_json(json!({ "collection": "contacts" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::deleted(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/deleteMany"))
        .and(body_partial_json(json!({ "collection": "addresses" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::deleted(1)),
        )
        .expect(1)
        .mount(&server)
        .await;

    service.delete_patient("pat-1").await.unwrap();
}

#[tokio::test]
async fn deleting_a_missing_patient_is_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = PatientService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/deleteOne"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::deleted(0)),
        )
        .mount(&server)
        .await;

    let result = service.delete_patient("missing").await;
    assert_matches!(result, Err(PatientError::NotFound));
}

#[tokio::test]
async fn contact_requires_an_existing_patient() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = PatientService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "patients" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()),
        )
        .mount(&server)
        .await;

    let result = service
        .add_contact(
            "missing",
            CreateContactRequest {
                name: "Paul Dupont".to_string(),
                relationship: "époux".to_string(),
                phone: "0605060708".to_string(),
            },
        )
        .await;

    assert_matches!(result, Err(PatientError::NotFound));
}

#[tokio::test]
async fn adds_a_contact_for_an_existing_patient() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    let service = PatientService::new(&config);

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "patients" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            patient_document("pat-1"),
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/insertOne"))
        .and(body_partial_json(json!({ "collection": "contacts" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::inserted("contact-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let contact = service
        .add_contact(
            "pat-1",
            CreateContactRequest {
                name: "Paul Dupont".to_string(),
                relationship: "époux".to_string(),
                phone: "0605060708".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(contact.patient_id, "pat-1");
    assert_eq!(contact.relationship, "époux");
}
