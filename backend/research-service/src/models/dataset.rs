use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

/// Dataset kind enum matching database dataset_kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "dataset_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Genomic,
    Imaging,
    Phenotype,
    Signal,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Genomic => "genomic",
            DatasetKind::Imaging => "imaging",
            DatasetKind::Phenotype => "phenotype",
            DatasetKind::Signal => "signal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "genomic" => Some(DatasetKind::Genomic),
            "imaging" => Some(DatasetKind::Imaging),
            "phenotype" => Some(DatasetKind::Phenotype),
            "signal" => Some(DatasetKind::Signal),
            _ => None,
        }
    }
}

/// Dataset metadata attached to a patient. The records themselves live in
/// external storage; this service tracks what exists and how much of it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dataset {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub kind: DatasetKind,
    pub name: String,
    pub description: Option<String>,
    pub record_count: Option<i32>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateDatasetRequest {
    pub kind: DatasetKind,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub record_count: Option<i32>,
}

/// One row of the per-kind aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DatasetKindCount {
    pub kind: DatasetKind,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            DatasetKind::Genomic,
            DatasetKind::Imaging,
            DatasetKind::Phenotype,
            DatasetKind::Signal,
        ] {
            assert_eq!(DatasetKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(DatasetKind::from_str("proteomic"), None);
    }

    #[test]
    fn test_create_dataset_request_validation() {
        let request = CreateDatasetRequest {
            kind: DatasetKind::Genomic,
            name: "WGS batch 3".to_string(),
            description: None,
            record_count: Some(124),
        };
        assert!(request.validate().is_ok());

        let bad = CreateDatasetRequest {
            kind: DatasetKind::Imaging,
            name: "".to_string(),
            description: None,
            record_count: Some(-5),
        };
        assert!(bad.validate().is_err());
    }
}
