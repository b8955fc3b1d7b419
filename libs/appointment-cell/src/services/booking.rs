use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::AvailabilityService;
use notification_cell::services::MailerService;
use shared_config::AppConfig;
use shared_database::{DataApiClient, DataApiError};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    RescheduleAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::conflict::ConflictService;
use crate::services::lifecycle::LifecycleService;

const COLLECTION: &str = "appointments";

pub struct BookingService {
    store: DataApiClient,
    availability: AvailabilityService,
    conflict: ConflictService,
    lifecycle: LifecycleService,
    mailer: MailerService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: DataApiClient::new(config),
            availability: AvailabilityService::new(config),
            conflict: ConflictService::new(config),
            lifecycle: LifecycleService::new(),
            mailer: MailerService::new(config),
        }
    }

    /// Slots still bookable for a doctor on a date: the weekday grid
    /// minus every live appointment.
    pub async fn free_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<String>, AppointmentError> {
        let grid = self.availability.slots_for_date(doctor_id, date).await?;
        if grid.is_empty() {
            return Ok(vec![]);
        }
        let occupied = self.conflict.occupied_times(doctor_id, date).await?;
        Ok(grid
            .into_iter()
            .filter(|slot| !occupied.contains(slot))
            .collect())
    }

    /// Books a slot after checking it against the doctor's grid and the
    /// live appointments. The store's unique index on
    /// (doctor_id, date, time, live status) backstops the race where two
    /// requests pass the check together.
    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking slot {} {} for doctor {} / patient {}",
            request.date, request.time, request.doctor_id, request.patient_id
        );

        let grid = self
            .availability
            .slots_for_date(&request.doctor_id, request.date)
            .await?;
        if !grid.contains(&request.time) {
            return Err(AppointmentError::SlotUnavailable {
                date: request.date,
                time: request.time,
            });
        }

        if self
            .conflict
            .is_slot_taken(&request.doctor_id, request.date, &request.time)
            .await?
        {
            return Err(AppointmentError::SlotTaken {
                date: request.date,
                time: request.time,
            });
        }

        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            date: request.date,
            time: request.time,
            consultation_type: request.consultation_type,
            reason: request.reason,
            status: AppointmentStatus::Pending,
            visit_completed: false,
            created_at: Utc::now(),
        };

        let document = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::Decode(e.to_string()))?;
        match self.store.insert_one(COLLECTION, document).await {
            Ok(_) => {}
            Err(DataApiError::DuplicateKey(_)) => {
                return Err(AppointmentError::SlotTaken {
                    date: appointment.date,
                    time: appointment.time,
                });
            }
            Err(e) => return Err(e.into()),
        }

        self.notify(&appointment, NotificationEvent::Created).await;

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    pub async fn get(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let document = self
            .store
            .find_one(COLLECTION, json!({ "_id": appointment_id }))
            .await?
            .ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(document).map_err(|e| AppointmentError::Decode(e.to_string()))
    }

    pub async fn list_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list(json!({ "patient_id": patient_id })).await
    }

    pub async fn list_for_doctor(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list(json!({ "doctor_id": doctor_id })).await
    }

    async fn list(&self, filter: Value) -> Result<Vec<Appointment>, AppointmentError> {
        let documents = self
            .store
            .find_sorted(COLLECTION, filter, json!({ "date": 1, "time": 1 }), None)
            .await?;
        documents
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| AppointmentError::Decode(e.to_string()))
            })
            .collect()
    }

    /// Moves a live appointment to a new slot. The new slot goes through
    /// the same availability and conflict checks as a fresh booking.
    pub async fn reschedule(
        &self,
        appointment_id: &str,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        self.lifecycle.can_reschedule(appointment.status)?;

        let grid = self
            .availability
            .slots_for_date(&appointment.doctor_id, request.date)
            .await?;
        if !grid.contains(&request.time) {
            return Err(AppointmentError::SlotUnavailable {
                date: request.date,
                time: request.time,
            });
        }

        let same_slot = appointment.date == request.date && appointment.time == request.time;
        if !same_slot
            && self
                .conflict
                .is_slot_taken(&appointment.doctor_id, request.date, &request.time)
                .await?
        {
            return Err(AppointmentError::SlotTaken {
                date: request.date,
                time: request.time,
            });
        }

        self.store
            .update_one(
                COLLECTION,
                json!({ "_id": appointment_id }),
                json!({ "$set": {
                    "date": request.date.to_string(),
                    "time": request.time,
                }}),
                false,
            )
            .await?;

        let updated = self.get(appointment_id).await?;
        self.notify(&updated, NotificationEvent::Updated).await;
        Ok(updated)
    }

    pub async fn update_details(
        &self,
        appointment_id: &str,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        self.lifecycle.can_reschedule(appointment.status)?;

        let mut changes = serde_json::Map::new();
        if let Some(consultation_type) = request.consultation_type {
            changes.insert("consultation_type".to_string(), json!(consultation_type));
        }
        if let Some(reason) = request.reason {
            changes.insert("reason".to_string(), json!(reason));
        }

        if !changes.is_empty() {
            self.store
                .update_one(
                    COLLECTION,
                    json!({ "_id": appointment_id }),
                    json!({ "$set": Value::Object(changes) }),
                    false,
                )
                .await?;
        }

        self.get(appointment_id).await
    }

    pub async fn confirm(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Confirmed)
            .await
    }

    pub async fn cancel(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let cancelled = self
            .transition(appointment_id, AppointmentStatus::Cancelled)
            .await?;
        self.notify(&cancelled, NotificationEvent::Cancelled).await;
        Ok(cancelled)
    }

    async fn transition(
        &self,
        appointment_id: &str,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        self.lifecycle.validate_transition(appointment.status, next)?;

        self.store
            .update_one(
                COLLECTION,
                json!({ "_id": appointment_id }),
                json!({ "$set": { "status": next.as_str() } }),
                false,
            )
            .await?;

        self.get(appointment_id).await
    }

    /// Email delivery is best effort: a relay outage never fails the
    /// booking itself.
    async fn notify(&self, appointment: &Appointment, event: NotificationEvent) {
        let (patient, doctor) = match self.contact_details(appointment).await {
            Ok(details) => details,
            Err(e) => {
                warn!(
                    "Skipping {:?} notification for appointment {}: {}",
                    event, appointment.id, e
                );
                return;
            }
        };

        let date = appointment.date.to_string();
        let result = match event {
            NotificationEvent::Created => {
                self.mailer
                    .send_appointment_created(
                        &patient.email,
                        &patient.name,
                        &doctor,
                        &date,
                        &appointment.time,
                    )
                    .await
            }
            NotificationEvent::Updated => {
                self.mailer
                    .send_appointment_updated(
                        &patient.email,
                        &patient.name,
                        &doctor,
                        &date,
                        &appointment.time,
                    )
                    .await
            }
            NotificationEvent::Cancelled => {
                self.mailer
                    .send_appointment_cancelled(
                        &patient.email,
                        &patient.name,
                        &doctor,
                        &date,
                        &appointment.time,
                    )
                    .await
            }
        };

        if let Err(e) = result {
            warn!(
                "Failed to send {:?} notification for appointment {}: {}",
                event, appointment.id, e
            );
        } else {
            debug!(
                "Sent {:?} notification for appointment {}",
                event, appointment.id
            );
        }
    }

    async fn contact_details(
        &self,
        appointment: &Appointment,
    ) -> Result<(PatientContact, String), AppointmentError> {
        let patient_doc = self
            .store
            .find_one("patients", json!({ "_id": &appointment.patient_id }))
            .await?
            .ok_or(AppointmentError::NotFound)?;
        let doctor_doc = self
            .store
            .find_one("doctors", json!({ "_id": &appointment.doctor_id }))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let email = patient_doc
            .get("email")
            .and_then(Value::as_str)
            .ok_or_else(|| AppointmentError::Decode("patient without email".to_string()))?
            .to_string();
        let patient_name = full_name(&patient_doc);
        let doctor_name = full_name(&doctor_doc);

        Ok((
            PatientContact {
                email,
                name: patient_name,
            },
            doctor_name,
        ))
    }
}

struct PatientContact {
    email: String,
    name: String,
}

#[derive(Debug, Clone, Copy)]
enum NotificationEvent {
    Created,
    Updated,
    Cancelled,
}

fn full_name(document: &Value) -> String {
    let first = document
        .get("first_name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let last = document
        .get("last_name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    format!("{} {}", first, last).trim().to_string()
}
