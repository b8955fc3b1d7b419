use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::models::{AppointmentError, BookAppointmentRequest};
use appointment_cell::services::BookingService;
use doctor_cell::models::Doctor;
use doctor_cell::services::DoctorService;
use shared_config::AppConfig;
use shared_database::DataApiClient;

use crate::models::{
    AssistantError, BookingDraft, BookingStep, ChatHistoryEntry, ChatSession,
};
use crate::services::completion::{ChatCompletion, OpenAiCompletionClient};

const SESSIONS: &str = "chat_sessions";
const HISTORY: &str = "chat_history";

const START_PHRASES: &[&str] = &["je veux un rendez-vous", "je veux prendre rendez-vous"];
const CANCEL_PHRASES: &[&str] = &["annuler", "je veux annuler", "annuler le rendez-vous", "stop"];
const CONFIRM_PHRASES: &[&str] = &["oui", "je confirme", "confirme"];

/// Guided booking assistant. A patient walks through doctor, date,
/// time, consultation type and reason one message at a time; anything
/// outside the flow falls back to the language model.
pub struct ConversationService {
    store: DataApiClient,
    booking: BookingService,
    doctors: DoctorService,
    completion: Box<dyn ChatCompletion>,
}

impl ConversationService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_completion(config, Box::new(OpenAiCompletionClient::new(config)))
    }

    pub fn with_completion(config: &AppConfig, completion: Box<dyn ChatCompletion>) -> Self {
        Self {
            store: DataApiClient::new(config),
            booking: BookingService::new(config),
            doctors: DoctorService::new(config),
            completion,
        }
    }

    pub async fn handle(
        &self,
        patient_id: &str,
        message: &str,
    ) -> Result<String, AssistantError> {
        let normalized = message.trim().to_lowercase();

        if matches_phrase(&normalized, CANCEL_PHRASES) {
            self.end_session(patient_id).await?;
            return Ok("D'accord, la prise de rendez-vous est annulée. N'hésitez pas à revenir quand vous le souhaitez.".to_string());
        }

        // A booking intent always restarts the flow, even mid-conversation.
        if contains_phrase(&normalized, START_PHRASES) {
            return self.start_session(patient_id).await;
        }

        match self.load_session(patient_id).await? {
            Some(session) => self.advance(session, message, &normalized).await,
            None => self.fallback(patient_id, message).await,
        }
    }

    pub async fn history(
        &self,
        patient_id: &str,
    ) -> Result<Vec<ChatHistoryEntry>, AssistantError> {
        let documents = self
            .store
            .find_sorted(
                HISTORY,
                json!({ "patient_id": patient_id }),
                json!({ "created_at": -1 }),
                Some(50),
            )
            .await?;
        documents
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| AssistantError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn start_session(&self, patient_id: &str) -> Result<String, AssistantError> {
        let doctors = self.doctors.list_doctors().await?;
        if doctors.is_empty() {
            return Ok(
                "Je suis désolée, aucun médecin n'est disponible pour le moment.".to_string(),
            );
        }

        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            step: BookingStep::SelectDoctor,
            draft: BookingDraft::default(),
            updated_at: Utc::now(),
        };
        self.save_session(&session).await?;

        info!("Started booking conversation for patient {}", patient_id);
        Ok(format!(
            "Très bien, prenons rendez-vous. Voici nos médecins :\n{}\nAvec quel médecin souhaitez-vous prendre rendez-vous ?",
            doctor_listing(&doctors)
        ))
    }

    async fn advance(
        &self,
        mut session: ChatSession,
        message: &str,
        normalized: &str,
    ) -> Result<String, AssistantError> {
        let reply = match session.step {
            BookingStep::SelectDoctor => {
                let doctors = self.doctors.list_doctors().await?;
                match find_doctor(&doctors, normalized) {
                    Some(doctor) => {
                        session.draft.doctor_id = Some(doctor.id.clone());
                        session.draft.doctor_name =
                            Some(format!("{} {}", doctor.first_name, doctor.last_name));
                        session.step = BookingStep::SelectDate;
                        "Pour quelle date souhaitez-vous le rendez-vous ? (format AAAA-MM-JJ)"
                            .to_string()
                    }
                    None => format!(
                        "Je n'ai pas trouvé ce médecin. Voici la liste :\n{}",
                        doctor_listing(&doctors)
                    ),
                }
            }
            BookingStep::SelectDate => match NaiveDate::parse_from_str(message.trim(), "%Y-%m-%d")
            {
                Ok(date) => {
                    let doctor_id = self.draft_doctor_id(&session)?;
                    let slots = self.booking.free_slots(&doctor_id, date).await?;
                    if slots.is_empty() {
                        format!(
                            "Aucun créneau n'est disponible le {}. Pouvez-vous proposer une autre date ?",
                            date
                        )
                    } else {
                        session.draft.date = Some(date);
                        session.step = BookingStep::SelectTime;
                        format!(
                            "Voici les créneaux disponibles le {} : {}. Quel horaire vous convient ?",
                            date,
                            slots.join(", ")
                        )
                    }
                }
                Err(_) => {
                    "Je n'ai pas compris la date. Merci d'utiliser le format AAAA-MM-JJ, par exemple 2026-09-14.".to_string()
                }
            },
            BookingStep::SelectTime => {
                let doctor_id = self.draft_doctor_id(&session)?;
                let date = self.draft_date(&session)?;
                let slots = self.booking.free_slots(&doctor_id, date).await?;
                let wanted = message.trim().to_string();
                if slots.contains(&wanted) {
                    session.draft.time = Some(wanted);
                    session.step = BookingStep::SelectType;
                    "Quel type de consultation souhaitez-vous ? (par exemple : consultation générale, suivi, téléconsultation)".to_string()
                } else {
                    format!(
                        "Cet horaire n'est pas disponible. Les créneaux libres sont : {}.",
                        slots.join(", ")
                    )
                }
            }
            BookingStep::SelectType => {
                session.draft.consultation_type = Some(message.trim().to_string());
                session.step = BookingStep::SelectReason;
                "Quel est le motif de votre consultation ?".to_string()
            }
            BookingStep::SelectReason => {
                session.draft.reason = Some(message.trim().to_string());
                session.step = BookingStep::Confirm;
                self.recap(&session)?
            }
            BookingStep::Confirm => {
                if matches_phrase(normalized, CONFIRM_PHRASES) {
                    return self.finalize(session).await;
                }
                "Pour confirmer le rendez-vous, répondez « oui ». Pour abandonner, écrivez « annuler ».".to_string()
            }
        };

        session.updated_at = Utc::now();
        self.save_session(&session).await?;
        Ok(reply)
    }

    /// Books the drafted appointment. The slot is re-checked inside the
    /// booking service, so a slot taken mid-conversation comes back as
    /// a conflict instead of a double booking.
    async fn finalize(&self, session: ChatSession) -> Result<String, AssistantError> {
        let request = BookAppointmentRequest {
            doctor_id: self.draft_doctor_id(&session)?,
            patient_id: session.patient_id.clone(),
            date: self.draft_date(&session)?,
            time: session
                .draft
                .time
                .clone()
                .ok_or_else(|| AssistantError::Decode("session without time".to_string()))?,
            consultation_type: session
                .draft
                .consultation_type
                .clone()
                .unwrap_or_else(|| "consultation générale".to_string()),
            reason: session.draft.reason.clone().unwrap_or_default(),
        };

        match self.booking.book(request).await {
            Ok(appointment) => {
                self.end_session(&session.patient_id).await?;
                info!(
                    "Conversation booked appointment {} for patient {}",
                    appointment.id, session.patient_id
                );
                Ok(format!(
                    "Votre rendez-vous est enregistré pour le {} à {}. Vous recevrez un email de confirmation.",
                    appointment.date, appointment.time
                ))
            }
            Err(AppointmentError::SlotTaken { date, time })
            | Err(AppointmentError::SlotUnavailable { date, time }) => {
                warn!(
                    "Slot {} {} was taken before confirmation for patient {}",
                    date, time, session.patient_id
                );
                let doctor_id = self.draft_doctor_id(&session)?;
                let slots = self.booking.free_slots(&doctor_id, date).await?;

                let mut reopened = session;
                reopened.draft.time = None;
                reopened.step = BookingStep::SelectTime;
                reopened.updated_at = Utc::now();
                self.save_session(&reopened).await?;

                if slots.is_empty() {
                    Ok(format!(
                        "Ce créneau vient d'être réservé et il ne reste aucun créneau le {}. Écrivez « annuler » puis recommencez avec une autre date.",
                        date
                    ))
                } else {
                    Ok(format!(
                        "Ce créneau vient d'être réservé. Les créneaux encore libres le {} sont : {}. Quel horaire vous convient ?",
                        date,
                        slots.join(", ")
                    ))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Out-of-flow messages go to the language model; the exchange is
    /// kept so the care team can review what patients ask.
    async fn fallback(&self, patient_id: &str, message: &str) -> Result<String, AssistantError> {
        debug!("Falling back to language model for patient {}", patient_id);
        let answer = self.completion.complete(message).await?;

        let entry = ChatHistoryEntry {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            question: message.to_string(),
            answer: answer.clone(),
            created_at: Utc::now(),
        };
        let document =
            serde_json::to_value(&entry).map_err(|e| AssistantError::Decode(e.to_string()))?;
        if let Err(e) = self.store.insert_one(HISTORY, document).await {
            warn!("Failed to record chat exchange: {}", e);
        }

        Ok(answer)
    }

    fn recap(&self, session: &ChatSession) -> Result<String, AssistantError> {
        let draft = &session.draft;
        Ok(format!(
            "Récapitulatif : rendez-vous avec {} le {} à {}, {} ({}). Confirmez-vous ? (oui / annuler)",
            draft
                .doctor_name
                .as_deref()
                .unwrap_or("votre médecin"),
            self.draft_date(session)?,
            draft
                .time
                .as_deref()
                .ok_or_else(|| AssistantError::Decode("session without time".to_string()))?,
            draft
                .consultation_type
                .as_deref()
                .unwrap_or("consultation générale"),
            draft.reason.as_deref().unwrap_or("motif non précisé"),
        ))
    }

    fn draft_doctor_id(&self, session: &ChatSession) -> Result<String, AssistantError> {
        session
            .draft
            .doctor_id
            .clone()
            .ok_or_else(|| AssistantError::Decode("session without doctor".to_string()))
    }

    fn draft_date(&self, session: &ChatSession) -> Result<NaiveDate, AssistantError> {
        session
            .draft
            .date
            .ok_or_else(|| AssistantError::Decode("session without date".to_string()))
    }

    async fn load_session(
        &self,
        patient_id: &str,
    ) -> Result<Option<ChatSession>, AssistantError> {
        let document = self
            .store
            .find_one(SESSIONS, json!({ "patient_id": patient_id }))
            .await?;
        document
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| AssistantError::Decode(e.to_string()))
            })
            .transpose()
    }

    async fn save_session(&self, session: &ChatSession) -> Result<(), AssistantError> {
        let document =
            serde_json::to_value(session).map_err(|e| AssistantError::Decode(e.to_string()))?;
        self.store
            .update_one(
                SESSIONS,
                json!({ "patient_id": &session.patient_id }),
                json!({ "$set": document }),
                true,
            )
            .await?;
        Ok(())
    }

    async fn end_session(&self, patient_id: &str) -> Result<(), AssistantError> {
        self.store
            .delete_one(SESSIONS, json!({ "patient_id": patient_id }))
            .await?;
        Ok(())
    }
}

fn doctor_listing(doctors: &[Doctor]) -> String {
    doctors
        .iter()
        .map(|d| format!("- Dr {} {} ({})", d.first_name, d.last_name, d.specialty))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Matches a doctor by last name, or by full name, case-insensitively.
fn find_doctor<'a>(doctors: &'a [Doctor], normalized: &str) -> Option<&'a Doctor> {
    doctors.iter().find(|d| {
        let last = d.last_name.to_lowercase();
        let full = format!("{} {}", d.first_name, d.last_name).to_lowercase();
        normalized.contains(&last) || normalized.contains(&full)
    })
}

fn matches_phrase(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| normalized == *p)
}

fn contains_phrase(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| normalized.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor(first: &str, last: &str) -> Doctor {
        Doctor {
            id: Uuid::new_v4().to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            specialty: "Médecine générale".to_string(),
            email: format!("{}@bienetre-clinique.fr", last.to_lowercase()),
            phone: Some("0102030405".to_string()),
        }
    }

    #[test]
    fn start_phrase_is_detected_inside_a_sentence() {
        assert!(contains_phrase(
            "bonjour, je veux prendre rendez-vous svp",
            START_PHRASES
        ));
        assert!(!contains_phrase("bonjour docteur", START_PHRASES));
    }

    #[test]
    fn cancel_requires_an_exact_phrase() {
        assert!(matches_phrase("annuler", CANCEL_PHRASES));
        assert!(matches_phrase("stop", CANCEL_PHRASES));
        // "annulation" in a sentence must not tear down the session
        assert!(!matches_phrase(
            "quelles sont vos conditions d'annulation ?",
            CANCEL_PHRASES
        ));
    }

    #[test]
    fn confirm_accepts_oui_and_je_confirme() {
        assert!(matches_phrase("oui", CONFIRM_PHRASES));
        assert!(matches_phrase("je confirme", CONFIRM_PHRASES));
        assert!(!matches_phrase("peut-être", CONFIRM_PHRASES));
    }

    #[test]
    fn doctor_is_matched_by_last_name_case_insensitively() {
        let doctors = vec![doctor("Marie", "Dupont"), doctor("Paul", "Martin")];
        let found = find_doctor(&doctors, "avec le dr dupont").unwrap();
        assert_eq!(found.last_name, "Dupont");
        assert!(find_doctor(&doctors, "dr lefevre").is_none());
    }
}
