use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DataApiClient;

use crate::models::{
    Address, Contact, CreateAddressRequest, CreateContactRequest, Patient, PatientError,
    UpdatePatientRequest,
};

const PATIENTS: &str = "patients";
const CONTACTS: &str = "contacts";
const ADDRESSES: &str = "addresses";

pub struct PatientService {
    store: DataApiClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: DataApiClient::new(config),
        }
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, PatientError> {
        let documents = self.store.find(PATIENTS, json!({})).await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(|e| PatientError::Decode(e.to_string())))
            .collect()
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Patient, PatientError> {
        let document = self
            .store
            .find_one(PATIENTS, json!({ "_id": patient_id }))
            .await?
            .ok_or(PatientError::NotFound)?;
        serde_json::from_value(document).map_err(|e| PatientError::Decode(e.to_string()))
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        let mut changes = Map::new();
        if let Some(first_name) = request.first_name {
            changes.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            changes.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(phone) = request.phone {
            changes.insert("phone".to_string(), json!(phone));
        }
        if let Some(birth_date) = request.birth_date {
            changes.insert("birth_date".to_string(), json!(birth_date.to_string()));
        }

        if !changes.is_empty() {
            let outcome = self
                .store
                .update_one(
                    PATIENTS,
                    json!({ "_id": patient_id }),
                    json!({ "$set": Value::Object(changes) }),
                    false,
                )
                .await?;
            if outcome.matched_count == 0 {
                return Err(PatientError::NotFound);
            }
        }

        self.get_patient(patient_id).await
    }

    /// Removes the patient record together with its contacts and
    /// addresses.
    pub async fn delete_patient(&self, patient_id: &str) -> Result<(), PatientError> {
        let deleted = self
            .store
            .delete_one(PATIENTS, json!({ "_id": patient_id }))
            .await?;
        if deleted == 0 {
            return Err(PatientError::NotFound);
        }

        let contacts = self
            .store
            .delete_many(CONTACTS, json!({ "patient_id": patient_id }))
            .await?;
        let addresses = self
            .store
            .delete_many(ADDRESSES, json!({ "patient_id": patient_id }))
            .await?;

        info!(
            "Deleted patient {} ({} contacts, {} addresses)",
            patient_id, contacts, addresses
        );
        Ok(())
    }

    pub async fn list_contacts(&self, patient_id: &str) -> Result<Vec<Contact>, PatientError> {
        let documents = self
            .store
            .find(CONTACTS, json!({ "patient_id": patient_id }))
            .await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(|e| PatientError::Decode(e.to_string())))
            .collect()
    }

    pub async fn add_contact(
        &self,
        patient_id: &str,
        request: CreateContactRequest,
    ) -> Result<Contact, PatientError> {
        // The patient must exist before anything hangs off it.
        self.get_patient(patient_id).await?;

        let contact = Contact {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            name: request.name,
            relationship: request.relationship,
            phone: request.phone,
        };
        let document =
            serde_json::to_value(&contact).map_err(|e| PatientError::Decode(e.to_string()))?;
        self.store.insert_one(CONTACTS, document).await?;

        debug!("Added contact {} for patient {}", contact.id, patient_id);
        Ok(contact)
    }

    pub async fn delete_contact(
        &self,
        patient_id: &str,
        contact_id: &str,
    ) -> Result<(), PatientError> {
        let deleted = self
            .store
            .delete_one(
                CONTACTS,
                json!({ "_id": contact_id, "patient_id": patient_id }),
            )
            .await?;
        if deleted == 0 {
            return Err(PatientError::ContactNotFound);
        }
        Ok(())
    }

    pub async fn list_addresses(&self, patient_id: &str) -> Result<Vec<Address>, PatientError> {
        let documents = self
            .store
            .find(ADDRESSES, json!({ "patient_id": patient_id }))
            .await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(|e| PatientError::Decode(e.to_string())))
            .collect()
    }

    pub async fn add_address(
        &self,
        patient_id: &str,
        request: CreateAddressRequest,
    ) -> Result<Address, PatientError> {
        self.get_patient(patient_id).await?;

        let address = Address {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            street: request.street,
            city: request.city,
            postal_code: request.postal_code,
            country: request.country.unwrap_or_else(|| "France".to_string()),
        };
        let document =
            serde_json::to_value(&address).map_err(|e| PatientError::Decode(e.to_string()))?;
        self.store.insert_one(ADDRESSES, document).await?;

        debug!("Added address {} for patient {}", address.id, patient_id);
        Ok(address)
    }

    pub async fn delete_address(
        &self,
        patient_id: &str,
        address_id: &str,
    ) -> Result<(), PatientError> {
        let deleted = self
            .store
            .delete_one(
                ADDRESSES,
                json!({ "_id": address_id, "patient_id": patient_id }),
            )
            .await?;
        if deleted == 0 {
            return Err(PatientError::AddressNotFound);
        }
        Ok(())
    }
}
