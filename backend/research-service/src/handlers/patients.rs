//! Patient record CRUD, scoped to the owning researcher.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::patient_repo;
use crate::error::{ApiError, Result};
use crate::middleware::ResearcherId;
use crate::models::patient::{CreatePatientRequest, Patient, UpdatePatientRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PatientSearchQuery {
    pub search: Option<String>,
}

/// POST /patients
pub async fn create_patient(
    state: web::Data<AppState>,
    researcher_id: ResearcherId,
    payload: web::Json<CreatePatientRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    if patient_repo::code_exists(&state.db, researcher_id.0, &payload.code).await? {
        return Err(ApiError::Validation(format!(
            "Patient code '{}' is already in use",
            payload.code
        )));
    }

    let patient = patient_repo::create_patient(&state.db, researcher_id.0, &payload).await?;
    tracing::info!(
        researcher_id = %researcher_id.0,
        patient_id = %patient.id,
        "Patient record created"
    );

    Ok(HttpResponse::Created().json(patient))
}

/// GET /patients?search=term
pub async fn list_patients(
    state: web::Data<AppState>,
    researcher_id: ResearcherId,
    query: web::Query<PatientSearchQuery>,
) -> Result<HttpResponse> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let patients = patient_repo::list_for_researcher(&state.db, researcher_id.0, search).await?;
    Ok(HttpResponse::Ok().json(patients))
}

/// GET /patients/{id}
pub async fn get_patient(
    state: web::Data<AppState>,
    researcher_id: ResearcherId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let patient = load_owned_patient(&state, researcher_id.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(patient))
}

/// PATCH /patients/{id}
pub async fn update_patient(
    state: web::Data<AppState>,
    researcher_id: ResearcherId,
    path: web::Path<Uuid>,
    payload: web::Json<UpdatePatientRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;
    if payload.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let patient = load_owned_patient(&state, researcher_id.0, path.into_inner()).await?;
    let updated = patient_repo::update_patient(&state.db, patient.id, &payload).await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Fetch a patient and check ownership. Absence is a 404; someone else's
/// record is a 403 rather than pretending it does not exist.
pub(crate) async fn load_owned_patient(
    state: &AppState,
    researcher_id: Uuid,
    patient_id: Uuid,
) -> Result<Patient> {
    let patient = patient_repo::find_by_id(&state.db, patient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;

    ensure_owner(&patient, researcher_id)?;
    Ok(patient)
}

fn ensure_owner(patient: &Patient, researcher_id: Uuid) -> Result<()> {
    if patient.researcher_id != researcher_id {
        return Err(ApiError::Authorization(
            "Patient record belongs to another researcher".to_string(),
        ));
    }
    Ok(())
}
