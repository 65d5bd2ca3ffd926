//! Dataset metadata endpoints, nested under patients plus one aggregation.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::dataset_repo;
use crate::error::{ApiError, Result};
use crate::handlers::patients::load_owned_patient;
use crate::middleware::ResearcherId;
use crate::models::dataset::{CreateDatasetRequest, DatasetKind, DatasetKindCount};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DatasetFilterQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DatasetSummaryResponse {
    pub total: i64,
    pub kinds: Vec<DatasetKindCount>,
}

/// POST /patients/{id}/datasets
pub async fn create_dataset(
    state: web::Data<AppState>,
    researcher_id: ResearcherId,
    path: web::Path<Uuid>,
    payload: web::Json<CreateDatasetRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    let patient = load_owned_patient(&state, researcher_id.0, path.into_inner()).await?;
    let dataset = dataset_repo::create_dataset(&state.db, patient.id, &payload).await?;
    tracing::info!(
        patient_id = %patient.id,
        dataset_id = %dataset.id,
        kind = dataset.kind.as_str(),
        "Dataset registered"
    );

    Ok(HttpResponse::Created().json(dataset))
}

/// GET /patients/{id}/datasets?kind=genomic
pub async fn list_datasets(
    state: web::Data<AppState>,
    researcher_id: ResearcherId,
    path: web::Path<Uuid>,
    query: web::Query<DatasetFilterQuery>,
) -> Result<HttpResponse> {
    let kind = parse_kind(query.kind.as_deref())?;

    let patient = load_owned_patient(&state, researcher_id.0, path.into_inner()).await?;
    let datasets = dataset_repo::list_for_patient(&state.db, patient.id, kind).await?;

    Ok(HttpResponse::Ok().json(datasets))
}

/// GET /datasets/summary
///
/// Per-kind dataset counts across every patient the researcher owns.
pub async fn dataset_summary(
    state: web::Data<AppState>,
    researcher_id: ResearcherId,
) -> Result<HttpResponse> {
    let kinds = dataset_repo::count_by_kind(&state.db, researcher_id.0).await?;
    Ok(HttpResponse::Ok().json(summarize(kinds)))
}

fn parse_kind(raw: Option<&str>) -> Result<Option<DatasetKind>> {
    match raw {
        Some(value) => DatasetKind::from_str(value)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown dataset kind '{value}'"))),
        None => Ok(None),
    }
}

fn summarize(kinds: Vec<DatasetKindCount>) -> DatasetSummaryResponse {
    let total = kinds.iter().map(|entry| entry.count).sum();
    DatasetSummaryResponse { total, kinds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{error::ResponseError, http::StatusCode};

    #[test]
    fn test_kind_filter_parsing() {
        assert_eq!(parse_kind(None).unwrap(), None);
        assert_eq!(
            parse_kind(Some("imaging")).unwrap(),
            Some(DatasetKind::Imaging)
        );

        let err = parse_kind(Some("proteomic")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("proteomic"));
    }

    #[test]
    fn test_summary_totals_across_kinds() {
        let summary = summarize(vec![
            DatasetKindCount {
                kind: DatasetKind::Genomic,
                count: 3,
            },
            DatasetKindCount {
                kind: DatasetKind::Signal,
                count: 2,
            },
        ]);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.kinds.len(), 2);

        let empty = summarize(Vec::new());
        assert_eq!(empty.total, 0);
    }
}
