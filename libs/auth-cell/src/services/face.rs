use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::auth::UserRole;

use crate::models::{Account, AuthError};
use crate::services::account::AccountService;

/// Two encodings closer than this are treated as the same person.
pub const FACE_MATCH_TOLERANCE: f64 = 0.6;

#[derive(Debug, Deserialize)]
struct EncodingResponse {
    encoding: Vec<f64>,
}

/// Facial login: images are turned into 128-dimensional encodings by an
/// external service, then matched against enrolled accounts by Euclidean
/// distance.
pub struct FaceLoginService {
    client: Client,
    accounts: AccountService,
    api_url: String,
    api_token: String,
    configured: bool,
}

impl FaceLoginService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            accounts: AccountService::new(config),
            api_url: config.face_api_url.clone(),
            api_token: config.face_api_token.clone(),
            configured: config.is_face_login_configured(),
        }
    }

    pub async fn encode(&self, image_base64: &str) -> Result<Vec<f64>, AuthError> {
        if !self.configured {
            return Err(AuthError::FaceNotConfigured);
        }

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&json!({ "image": image_base64 }))
            .send()
            .await
            .map_err(|e| AuthError::FaceService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::FaceService(format!("HTTP {}: {}", status, message)));
        }

        let body: EncodingResponse = response
            .json()
            .await
            .map_err(|e| AuthError::FaceService(e.to_string()))?;

        if body.encoding.len() != 128 {
            return Err(AuthError::FaceService(format!(
                "expected a 128-float encoding, got {} values",
                body.encoding.len()
            )));
        }
        Ok(body.encoding)
    }

    /// Scans patient then doctor accounts for the closest enrolled
    /// encoding within tolerance.
    pub async fn identify(&self, image_base64: &str) -> Result<(Account, UserRole), AuthError> {
        let probe = self.encode(image_base64).await?;

        let mut best: Option<(Account, UserRole, f64)> = None;
        for role in [UserRole::Patient, UserRole::Doctor] {
            let accounts = self.accounts.accounts_with_face_encoding(role).await?;
            for account in accounts {
                let Some(ref enrolled) = account.face_encoding else {
                    continue;
                };
                let distance = euclidean_distance(&probe, enrolled);
                debug!(
                    "Face distance {:.3} against account {} ({})",
                    distance, account.id, role
                );
                if distance <= FACE_MATCH_TOLERANCE
                    && best.as_ref().map_or(true, |(_, _, d)| distance < *d)
                {
                    best = Some((account, role, distance));
                }
            }
        }

        match best {
            Some((account, role, distance)) => {
                info!(
                    "Face recognized as account {} ({}) at distance {:.3}",
                    account.id, role, distance
                );
                Ok((account, role))
            }
            None => Err(AuthError::FaceNotRecognized),
        }
    }

    /// Enrolls the authenticated account's face for future logins.
    pub async fn enroll(
        &self,
        role: UserRole,
        account_id: &str,
        image_base64: &str,
    ) -> Result<(), AuthError> {
        let encoding = self.encode(image_base64).await?;
        self.accounts
            .save_face_encoding(role, account_id, &encoding)
            .await
    }
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_encodings_have_zero_distance() {
        let encoding = vec![0.25; 128];
        assert_eq!(euclidean_distance(&encoding, &encoding), 0.0);
    }

    #[test]
    fn distance_matches_hand_computation() {
        let a = vec![0.0, 3.0];
        let b = vec![4.0, 0.0];
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_lengths_never_match() {
        let a = vec![0.0; 128];
        let b = vec![0.0; 64];
        assert!(euclidean_distance(&a, &b) > FACE_MATCH_TOLERANCE);
    }

    #[test]
    fn small_perturbation_stays_within_tolerance() {
        let a = vec![0.5; 128];
        let mut b = a.clone();
        for value in b.iter_mut() {
            *value += 0.01;
        }
        assert!(euclidean_distance(&a, &b) <= FACE_MATCH_TOLERANCE);
    }
}
