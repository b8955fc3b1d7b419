use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use notification_cell::services::MailerService;
use shared_config::AppConfig;
use shared_database::DataApiClient;
use shared_models::auth::UserRole;

use crate::models::AuthError;

const COLLECTION: &str = "twofa_codes";

/// Codes are valid for five minutes and consumed on first use.
pub const CODE_TTL_MINUTES: i64 = 5;

#[derive(Debug, Deserialize)]
struct StoredCode {
    code: String,
    user_id: String,
    role: UserRole,
    expires_at: DateTime<Utc>,
}

/// Issues and checks the one-time codes of the second login step.
pub struct TwoFactorService {
    store: DataApiClient,
    mailer: MailerService,
}

impl TwoFactorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: DataApiClient::new(config),
            mailer: MailerService::new(config),
        }
    }

    /// Generates a six-digit code, stores it with its expiry and mails it
    /// to the account address. A new code replaces any previous one.
    pub async fn issue(
        &self,
        email: &str,
        user_id: &str,
        role: UserRole,
    ) -> Result<(), AuthError> {
        let code = generate_code();
        let expires_at = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);

        self.store
            .update_one(
                COLLECTION,
                json!({ "email": email }),
                json!({
                    "$set": {
                        "code": &code,
                        "user_id": user_id,
                        "role": role,
                        "expires_at": expires_at.to_rfc3339(),
                    },
                    "$setOnInsert": {
                        "_id": Uuid::new_v4().to_string(),
                        "email": email,
                    }
                }),
                true,
            )
            .await?;

        self.mailer.send_two_factor_code(email, &code).await?;
        info!("Issued verification code for {}", email);
        Ok(())
    }

    /// Validates a code and consumes it. Expired codes are rejected and
    /// removed.
    pub async fn verify(&self, email: &str, code: &str) -> Result<(String, UserRole), AuthError> {
        let document = self
            .store
            .find_one(COLLECTION, json!({ "email": email }))
            .await?
            .ok_or(AuthError::CodeInvalid)?;
        let stored: StoredCode =
            serde_json::from_value(document).map_err(|e| AuthError::Decode(e.to_string()))?;

        if Utc::now() > stored.expires_at {
            self.store
                .delete_one(COLLECTION, json!({ "email": email }))
                .await?;
            return Err(AuthError::CodeExpired);
        }

        if stored.code != code {
            return Err(AuthError::CodeInvalid);
        }

        self.store
            .delete_one(COLLECTION, json!({ "email": email }))
            .await?;
        debug!("Verification code accepted for {}", email);
        Ok((stored.user_id, stored.role))
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(0..1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
