use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub data_api_url: String,
    pub data_api_key: String,
    pub mail_relay_url: String,
    pub assistant_api_url: String,
    pub face_api_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            data_api_url: "http://localhost:8800".to_string(),
            data_api_key: "test-api-key".to_string(),
            mail_relay_url: String::new(),
            assistant_api_url: String::new(),
            face_api_url: String::new(),
        }
    }
}

impl TestConfig {
    /// Points the store, mail relay and assistant endpoints at the same
    /// mock server base URL.
    pub fn with_mock_server(base_url: &str) -> Self {
        Self {
            data_api_url: base_url.to_string(),
            mail_relay_url: format!("{}/mail", base_url),
            assistant_api_url: format!("{}/v1", base_url),
            face_api_url: format!("{}/face", base_url),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            data_api_url: self.data_api_url.clone(),
            data_api_key: self.data_api_key.clone(),
            data_source: "test-cluster".to_string(),
            database_name: "test-db".to_string(),
            jwt_secret: self.jwt_secret.clone(),
            mail_relay_url: self.mail_relay_url.clone(),
            mail_relay_token: "test-mail-token".to_string(),
            mail_from: "notifications@bienetre-clinique.fr".to_string(),
            assistant_api_url: self.assistant_api_url.clone(),
            assistant_api_key: "test-assistant-key".to_string(),
            assistant_model: "gpt-3.5-turbo".to_string(),
            face_api_url: self.face_api_url.clone(),
            face_api_token: "test-face-token".to_string(),
            phq9_proxy_url: String::new(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub role: UserRole,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: UserRole::Patient,
        }
    }
}

impl TestUser {
    pub fn new(role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
        }
    }

    pub fn doctor() -> Self {
        Self::new(UserRole::Doctor)
    }

    pub fn patient() -> Self {
        Self::new(UserRole::Patient)
    }

    pub fn admin() -> Self {
        Self::new(UserRole::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            role: self.role,
            issued_at: Some(Utc::now()),
        }
    }

    pub fn token(&self, secret: &str) -> String {
        issue_token(&self.id, self.role, secret).expect("token issuance")
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let now = Utc::now();
        let exp = now - Duration::hours(1);

        let header = json!({ "alg": "HS256", "typ": "JWT" });
        let payload = json!({
            "sub": user.id,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature)
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        user.token("wrong-secret")
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned Data API response bodies for wiremock-backed tests.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn found(document: serde_json::Value) -> serde_json::Value {
        json!({ "document": document })
    }

    pub fn not_found() -> serde_json::Value {
        json!({ "document": null })
    }

    pub fn documents(documents: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "documents": documents })
    }

    pub fn inserted(id: &str) -> serde_json::Value {
        json!({ "insertedId": id })
    }

    pub fn updated(matched: u64, modified: u64) -> serde_json::Value {
        json!({ "matchedCount": matched, "modifiedCount": modified })
    }

    pub fn deleted(count: u64) -> serde_json::Value {
        json!({ "deletedCount": count })
    }

    pub fn duplicate_key_error() -> serde_json::Value {
        json!({
            "error": "E11000 duplicate key error collection: test-db.appointments",
            "error_code": "DuplicateKey"
        })
    }

    pub fn doctor_document(id: &str, last_name: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "first_name": "Jean",
            "last_name": last_name,
            "specialty": "Médecine générale",
            "email": format!("{}@bienetre-clinique.fr", last_name.to_lowercase()),
            "phone": "0102030405"
        })
    }

    pub fn availability_document(doctor_id: &str, day: &str) -> serde_json::Value {
        let slots: Vec<String> = (9..=18).map(|h| format!("{:02}:00", h)).collect();
        json!({
            "_id": Uuid::new_v4().to_string(),
            "doctor_id": doctor_id,
            "day": day,
            "slots": slots
        })
    }

    pub fn appointment_document(
        doctor_id: &str,
        patient_id: &str,
        date: &str,
        time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "_id": Uuid::new_v4().to_string(),
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "date": date,
            "time": time,
            "consultation_type": "Consultation générale",
            "reason": "Suivi",
            "status": status,
            "visit_completed": false,
            "created_at": "2026-01-01T00:00:00Z"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.data_api_url, "http://localhost:8800");
        assert_eq!(app_config.data_api_key, "test-api-key");
        assert!(!app_config.jwt_secret.is_empty());
    }

    #[test]
    fn test_user_token_is_valid() {
        let config = TestConfig::default();
        let user = TestUser::doctor();
        let token = user.token(&config.jwt_secret);

        let validated = validate_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(validated.id, user.id);
        assert_eq!(validated.role, UserRole::Doctor);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = TestConfig::default();
        let user = TestUser::patient();
        let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

        assert!(validate_token(&token, &config.jwt_secret).is_err());
    }
}
