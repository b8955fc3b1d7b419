use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DataApiClient;

use crate::models::{MentalHealthError, Phq9Level, Phq9Record, Phq9Result};

const COLLECTION: &str = "phq9_results";

/// External screening calls are capped at ten seconds.
const PROXY_TIMEOUT: Duration = Duration::from_secs(10);

/// Scores a PHQ-9 questionnaire: nine answers in 0..=3, total out of 27.
pub fn score_phq9(answers: &[u8]) -> Result<Phq9Result, MentalHealthError> {
    if answers.len() != 9 {
        return Err(MentalHealthError::WrongAnswerCount(answers.len()));
    }
    if answers.iter().any(|&a| a > 3) {
        return Err(MentalHealthError::AnswerOutOfRange);
    }

    let total: u8 = answers.iter().sum();
    let level = match total {
        0..=4 => Phq9Level::Mild,
        5..=9 => Phq9Level::Moderate,
        _ => Phq9Level::Severe,
    };

    Ok(Phq9Result {
        total,
        level,
        summary: format!("Score PHQ-9 : {}/27 — Niveau {}", total, level.label()),
    })
}

pub struct Phq9Service {
    store: DataApiClient,
    client: Client,
    proxy_url: String,
}

impl Phq9Service {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: DataApiClient::new(config),
            client: Client::new(),
            proxy_url: config.phq9_proxy_url.clone(),
        }
    }

    /// Scores the questionnaire and keeps the result in the patient's
    /// screening history.
    pub async fn submit(
        &self,
        patient_id: &str,
        answers: &[u8],
    ) -> Result<Phq9Result, MentalHealthError> {
        let result = score_phq9(answers)?;

        let record = Phq9Record {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            total: result.total,
            level: result.level,
            created_at: Utc::now(),
        };
        let document =
            serde_json::to_value(&record).map_err(|e| MentalHealthError::Decode(e.to_string()))?;
        self.store.insert_one(COLLECTION, document).await?;

        info!(
            "PHQ-9 screening recorded for patient {}: {}/27",
            patient_id, result.total
        );
        Ok(result)
    }

    pub async fn history(&self, patient_id: &str) -> Result<Vec<Phq9Record>, MentalHealthError> {
        let documents = self
            .store
            .find_sorted(
                COLLECTION,
                json!({ "patient_id": patient_id }),
                json!({ "created_at": -1 }),
                None,
            )
            .await?;
        documents
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| MentalHealthError::Decode(e.to_string()))
            })
            .collect()
    }

    /// Forwards the raw questionnaire to the national screening service
    /// and relays its response untouched.
    pub async fn proxy(&self, answers: &[u8]) -> Result<Value, MentalHealthError> {
        debug!("Forwarding PHQ-9 questionnaire to {}", self.proxy_url);

        let response = self
            .client
            .post(&self.proxy_url)
            .timeout(PROXY_TIMEOUT)
            .json(&json!({ "answers": answers }))
            .send()
            .await
            .map_err(|e| MentalHealthError::Proxy(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MentalHealthError::Proxy(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| MentalHealthError::Proxy(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn boundary_scores_map_to_levels() {
        // 4 is still mild, 5 tips into moderate, 10 into severe.
        let mild = score_phq9(&[1, 1, 1, 1, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(mild.total, 4);
        assert_eq!(mild.level, Phq9Level::Mild);

        let moderate = score_phq9(&[1, 1, 1, 1, 1, 0, 0, 0, 0]).unwrap();
        assert_eq!(moderate.total, 5);
        assert_eq!(moderate.level, Phq9Level::Moderate);

        let upper_moderate = score_phq9(&[1, 1, 1, 1, 1, 1, 1, 1, 1]).unwrap();
        assert_eq!(upper_moderate.total, 9);
        assert_eq!(upper_moderate.level, Phq9Level::Moderate);

        let severe = score_phq9(&[2, 2, 2, 2, 2, 0, 0, 0, 0]).unwrap();
        assert_eq!(severe.total, 10);
        assert_eq!(severe.level, Phq9Level::Severe);
    }

    #[test]
    fn maximum_score_is_27() {
        let result = score_phq9(&[3; 9]).unwrap();
        assert_eq!(result.total, 27);
        assert_eq!(result.level, Phq9Level::Severe);
        assert_eq!(result.summary, "Score PHQ-9 : 27/27 — Niveau sévère");
    }

    #[test]
    fn rejects_wrong_answer_count() {
        assert_matches!(
            score_phq9(&[1, 2, 3]),
            Err(MentalHealthError::WrongAnswerCount(3))
        );
    }

    #[test]
    fn rejects_out_of_range_answers() {
        assert_matches!(
            score_phq9(&[0, 0, 0, 0, 4, 0, 0, 0, 0]),
            Err(MentalHealthError::AnswerOutOfRange)
        );
    }
}
