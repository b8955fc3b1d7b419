use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_api_url: String,
    pub data_api_key: String,
    pub data_source: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub mail_relay_url: String,
    pub mail_relay_token: String,
    pub mail_from: String,
    pub assistant_api_url: String,
    pub assistant_api_key: String,
    pub assistant_model: String,
    pub face_api_url: String,
    pub face_api_token: String,
    pub phq9_proxy_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            data_api_url: env::var("DATA_API_URL")
                .unwrap_or_else(|_| {
                    warn!("DATA_API_URL not set, using empty value");
                    String::new()
                }),
            data_api_key: env::var("DATA_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("DATA_API_KEY not set, using empty value");
                    String::new()
                }),
            data_source: env::var("DATA_SOURCE")
                .unwrap_or_else(|_| "bienetre-cluster".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "bienetre".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            mail_relay_url: env::var("MAIL_RELAY_URL")
                .unwrap_or_else(|_| {
                    warn!("MAIL_RELAY_URL not set, using empty value");
                    String::new()
                }),
            mail_relay_token: env::var("MAIL_RELAY_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("MAIL_RELAY_TOKEN not set, using empty value");
                    String::new()
                }),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "notifications@bienetre-clinique.fr".to_string()),
            assistant_api_url: env::var("ASSISTANT_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            assistant_api_key: env::var("ASSISTANT_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("ASSISTANT_API_KEY not set, using empty value");
                    String::new()
                }),
            assistant_model: env::var("ASSISTANT_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            face_api_url: env::var("FACE_API_URL")
                .unwrap_or_else(|_| {
                    warn!("FACE_API_URL not set, using empty value");
                    String::new()
                }),
            face_api_token: env::var("FACE_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("FACE_API_TOKEN not set, using empty value");
                    String::new()
                }),
            phq9_proxy_url: env::var("PHQ9_PROXY_URL")
                .unwrap_or_else(|_| "https://screening.mhanational.org/api/v1/phq9/".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.data_api_url.is_empty()
            && !self.data_api_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.mail_relay_url.is_empty() && !self.mail_from.is_empty()
    }

    pub fn is_assistant_configured(&self) -> bool {
        !self.assistant_api_url.is_empty() && !self.assistant_api_key.is_empty()
    }

    pub fn is_face_login_configured(&self) -> bool {
        !self.face_api_url.is_empty()
    }
}
