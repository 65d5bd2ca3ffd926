use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Patient record owned by a single researcher.
///
/// `code` is the researcher's own pseudonymized identifier and is unique
/// per researcher, never globally.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: Uuid,
    pub researcher_id: Uuid,
    pub code: String,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePatientRequest {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 16))]
    pub sex: Option<String>,
    #[validate(length(max = 256))]
    pub diagnosis: Option<String>,
    #[validate(length(max = 2048))]
    pub notes: Option<String>,
}

/// Partial update. Absent fields keep their stored values; `code` is the
/// stable lookup key and cannot be changed after creation.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePatientRequest {
    #[validate(length(min = 1, max = 128))]
    pub full_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 16))]
    pub sex: Option<String>,
    #[validate(length(max = 256))]
    pub diagnosis: Option<String>,
    #[validate(length(max = 2048))]
    pub notes: Option<String>,
}

impl UpdatePatientRequest {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.birth_date.is_none()
            && self.sex.is_none()
            && self.diagnosis.is_none()
            && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_patient_request_validation() {
        let request = CreatePatientRequest {
            code: "P-001".to_string(),
            full_name: "Case One".to_string(),
            birth_date: None,
            sex: Some("F".to_string()),
            diagnosis: Some("glioblastoma".to_string()),
            notes: None,
        };
        assert!(request.validate().is_ok());

        let bad = CreatePatientRequest {
            code: "".to_string(),
            full_name: "Case One".to_string(),
            birth_date: None,
            sex: None,
            diagnosis: None,
            notes: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_update_request_empty_detection() {
        let empty = UpdatePatientRequest::default();
        assert!(empty.is_empty());

        let update = UpdatePatientRequest {
            diagnosis: Some("astrocytoma".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
