use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DataApiClient;
use shared_models::auth::UserRole;

use crate::models::{Account, AuthError, RegisterDoctorAccountRequest, RegisterPatientRequest};
use crate::services::password;

pub struct AccountService {
    store: DataApiClient,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: DataApiClient::new(config),
        }
    }

    /// Creates a patient login account together with its patient record.
    /// Both documents share the same id.
    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<Account, AuthError> {
        if self
            .find_by_email(UserRole::Patient, &request.email)
            .await?
            .is_some()
        {
            return Err(AuthError::EmailTaken(request.email));
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: request.email.clone(),
            password_hash: password::hash_password(&request.password)?,
            face_encoding: None,
        };

        let document =
            serde_json::to_value(&account).map_err(|e| AuthError::Decode(e.to_string()))?;
        self.store
            .insert_one(UserRole::Patient.collection(), document)
            .await?;

        self.store
            .insert_one(
                "patients",
                json!({
                    "_id": account.id,
                    "first_name": request.first_name,
                    "last_name": request.last_name,
                    "email": request.email,
                    "phone": request.phone,
                }),
            )
            .await?;

        info!("Registered patient account {}", account.id);
        Ok(account)
    }

    /// Creates a doctor login account for an existing doctor profile.
    /// The account id is the doctor profile id.
    pub async fn register_doctor_account(
        &self,
        request: RegisterDoctorAccountRequest,
    ) -> Result<Account, AuthError> {
        let profile = self
            .store
            .find_one("doctors", json!({ "_id": &request.doctor_id }))
            .await?;
        if profile.is_none() {
            return Err(AuthError::NotFound);
        }

        if self
            .find_by_email(UserRole::Doctor, &request.email)
            .await?
            .is_some()
        {
            return Err(AuthError::EmailTaken(request.email));
        }

        let account = Account {
            id: request.doctor_id,
            email: request.email,
            password_hash: password::hash_password(&request.password)?,
            face_encoding: None,
        };

        let document =
            serde_json::to_value(&account).map_err(|e| AuthError::Decode(e.to_string()))?;
        self.store
            .insert_one(UserRole::Doctor.collection(), document)
            .await?;

        info!("Registered doctor account {}", account.id);
        Ok(account)
    }

    pub async fn find_by_email(
        &self,
        role: UserRole,
        email: &str,
    ) -> Result<Option<Account>, AuthError> {
        let document = self
            .store
            .find_one(role.collection(), json!({ "email": email }))
            .await?;
        document
            .map(|doc| serde_json::from_value(doc).map_err(|e| AuthError::Decode(e.to_string())))
            .transpose()
    }

    /// Checks a password against the patient and doctor account
    /// collections in turn. Admins sign in through their own endpoint.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password_input: &str,
    ) -> Result<(Account, UserRole), AuthError> {
        for role in [UserRole::Patient, UserRole::Doctor] {
            if let Some(account) = self.find_by_email(role, email).await? {
                if password::verify_password(password_input, &account.password_hash)? {
                    debug!("Credentials verified for {} as {}", email, role);
                    return Ok((account, role));
                }
                return Err(AuthError::InvalidCredentials);
            }
        }
        Err(AuthError::InvalidCredentials)
    }

    pub async fn verify_admin_credentials(
        &self,
        email: &str,
        password_input: &str,
    ) -> Result<Account, AuthError> {
        let account = self
            .find_by_email(UserRole::Admin, email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !password::verify_password(password_input, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(account)
    }

    /// Stores a face encoding on an existing account.
    pub async fn save_face_encoding(
        &self,
        role: UserRole,
        account_id: &str,
        encoding: &[f64],
    ) -> Result<(), AuthError> {
        let outcome = self
            .store
            .update_one(
                role.collection(),
                json!({ "_id": account_id }),
                json!({ "$set": { "face_encoding": encoding } }),
                false,
            )
            .await?;
        if outcome.matched_count == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    pub async fn accounts_with_face_encoding(
        &self,
        role: UserRole,
    ) -> Result<Vec<Account>, AuthError> {
        let documents = self
            .store
            .find(
                role.collection(),
                json!({ "face_encoding": { "$ne": null } }),
            )
            .await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(|e| AuthError::Decode(e.to_string())))
            .collect()
    }
}
