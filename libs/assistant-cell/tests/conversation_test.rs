use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assistant_cell::models::AssistantError;
use assistant_cell::services::{ChatCompletion, ConversationService};
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

struct StubCompletion {
    reply: &'static str,
}

#[async_trait]
impl ChatCompletion for StubCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, AssistantError> {
        Ok(self.reply.to_string())
    }
}

fn store_only_config(server: &MockServer) -> shared_config::AppConfig {
    TestConfig {
        data_api_url: server.uri(),
        ..TestConfig::default()
    }
    .to_app_config()
}

fn service(server: &MockServer, reply: &'static str) -> ConversationService {
    ConversationService::with_completion(
        &store_only_config(server),
        Box::new(StubCompletion { reply }),
    )
}

async fn mount_no_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "chat_sessions" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()))
        .mount(server)
        .await;
}

fn confirm_session_document() -> serde_json::Value {
    json!({
        "_id": "sess-1",
        "patient_id": "pat-1",
        "step": "confirm",
        "draft": {
            "doctor_id": "doc-1",
            "doctor_name": "Paul Martin",
            "date": "2026-03-02",
            "time": "10:00",
            "consultation_type": "Consultation générale",
            "reason": "Suivi"
        },
        "updated_at": "2026-03-01T09:00:00Z"
    })
}

#[tokio::test]
async fn start_phrase_opens_a_session_and_lists_doctors() {
    let server = MockServer::start().await;
    let service = service(&server, "unused");

    mount_no_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/action/find"))
        .and(body_partial_json(json!({ "collection": "doctors" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::documents(
            vec![MockStoreResponses::doctor_document("doc-1", "Martin")],
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/updateOne"))
        .and(body_partial_json(json!({
            "collection": "chat_sessions",
            "filter": { "patient_id": "pat-1" },
            "upsert": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::updated(1, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let reply = service
        .handle("pat-1", "Bonjour, je veux prendre rendez-vous")
        .await
        .unwrap();

    assert!(reply.contains("Martin"));
    assert!(reply.contains("quel médecin"));
}

#[tokio::test]
async fn unknown_message_falls_back_to_the_language_model() {
    let server = MockServer::start().await;
    let service = service(&server, "Buvez de l'eau et reposez-vous.");

    mount_no_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/action/insertOne"))
        .and(body_partial_json(json!({ "collection": "chat_history" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::inserted("hist-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reply = service
        .handle("pat-1", "Que faire contre un mal de tête ?")
        .await
        .unwrap();

    assert_eq!(reply, "Buvez de l'eau et reposez-vous.");
}

#[tokio::test]
async fn cancel_phrase_tears_down_the_session() {
    let server = MockServer::start().await;
    let service = service(&server, "unused");

    Mock::given(method("POST"))
        .and(path("/action/deleteOne"))
        .and(body_partial_json(json!({
            "collection": "chat_sessions",
            "filter": { "patient_id": "pat-1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::deleted(1)))
        .expect(1)
        .mount(&server)
        .await;

    let reply = service.handle("pat-1", "Annuler").await.unwrap();

    assert!(reply.contains("annulée"));
}

#[tokio::test]
async fn date_step_lists_free_slots_for_that_day() {
    let server = MockServer::start().await;
    let service = service(&server, "unused");

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "chat_sessions" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(json!({
            "_id": "sess-1",
            "patient_id": "pat-1",
            "step": "select_date",
            "draft": { "doctor_id": "doc-1", "doctor_name": "Paul Martin" },
            "updated_at": "2026-03-01T09:00:00Z"
        }))))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "availabilities" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::availability_document("doc-1", "lundi"),
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/find"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::documents(vec![])),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/updateOne"))
        .and(body_partial_json(json!({ "collection": "chat_sessions" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::updated(1, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let reply = service.handle("pat-1", "2026-03-02").await.unwrap();

    assert!(reply.contains("09:00"));
    assert!(reply.contains("horaire"));
}

#[tokio::test]
async fn confirmation_books_the_drafted_slot() {
    let server = MockServer::start().await;
    let service = service(&server, "unused");

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "chat_sessions" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            confirm_session_document(),
        )))
        .mount(&server)
        .await;

    // 2026-03-02 is a Monday, so the grid has slots.
    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "availabilities" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::availability_document("doc-1", "lundi"),
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::not_found()))
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

    Mock::given(method("POST"))
        .and(path("/action/deleteOne"))
        .and(body_partial_json(json!({ "collection": "chat_sessions" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::deleted(1)))
        .expect(1)
        .mount(&server)
        .await;

    let reply = service.handle("pat-1", "oui").await.unwrap();

    assert!(reply.contains("2026-03-02"));
    assert!(reply.contains("10:00"));
}

#[tokio::test]
async fn slot_taken_at_confirmation_reopens_time_selection() {
    let server = MockServer::start().await;
    let service = service(&server, "unused");

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "chat_sessions" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            confirm_session_document(),
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({ "collection": "availabilities" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::availability_document("doc-1", "lundi"),
        )))
        .mount(&server)
        .await;

    // Another patient grabbed 10:00 mid-conversation.
    Mock::given(method("POST"))
        .and(path("/action/findOne"))
        .and(body_partial_json(json!({
            "collection": "appointments",
            "filter": { "time": "10:00" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::found(
            MockStoreResponses::appointment_document(
                "doc-1", "pat-2", "2026-03-02", "10:00", "confirmed",
            ),
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/find"))
        .and(body_partial_json(json!({ "collection": "appointments" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::documents(
            vec![MockStoreResponses::appointment_document(
                "doc-1", "pat-2", "2026-03-02", "10:00", "confirmed",
            )],
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/action/updateOne"))
        .and(body_partial_json(json!({ "collection": "chat_sessions" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockStoreResponses::updated(1, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let reply = service.handle("pat-1", "oui").await.unwrap();

    assert!(reply.contains("vient d'être réservé"));
    assert!(reply.contains("11:00"));
    assert!(!reply.contains("10:00,"));
}
