/// Patient record database operations
use crate::models::patient::{CreatePatientRequest, UpdatePatientRequest};
use crate::models::Patient;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_patient(
    pool: &PgPool,
    researcher_id: Uuid,
    fields: &CreatePatientRequest,
) -> Result<Patient, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        r#"
        INSERT INTO patients (id, researcher_id, code, full_name, birth_date, sex, diagnosis, notes, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(researcher_id)
    .bind(&fields.code)
    .bind(&fields.full_name)
    .bind(fields.birth_date)
    .bind(&fields.sex)
    .bind(&fields.diagnosis)
    .bind(&fields.notes)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, patient_id: Uuid) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
        .bind(patient_id)
        .fetch_optional(pool)
        .await
}

/// List a researcher's patients, newest first. An optional search term
/// filters by substring match on code or diagnosis.
pub async fn list_for_researcher(
    pool: &PgPool,
    researcher_id: Uuid,
    search: Option<&str>,
) -> Result<Vec<Patient>, sqlx::Error> {
    let search_pattern = search.map(|s| format!("%{}%", s));

    sqlx::query_as::<_, Patient>(
        r#"
        SELECT *
        FROM patients
        WHERE researcher_id = $1
          AND ($2::text IS NULL OR code ILIKE $2 OR diagnosis ILIKE $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(researcher_id)
    .bind(search_pattern)
    .fetch_all(pool)
    .await
}

/// Apply a partial update. Absent fields keep their stored values.
pub async fn update_patient(
    pool: &PgPool,
    patient_id: Uuid,
    fields: &UpdatePatientRequest,
) -> Result<Patient, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        r#"
        UPDATE patients
        SET
            full_name = COALESCE($2, full_name),
            birth_date = COALESCE($3, birth_date),
            sex = COALESCE($4, sex),
            diagnosis = COALESCE($5, diagnosis),
            notes = COALESCE($6, notes),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(patient_id)
    .bind(&fields.full_name)
    .bind(fields.birth_date)
    .bind(&fields.sex)
    .bind(&fields.diagnosis)
    .bind(&fields.notes)
    .fetch_one(pool)
    .await
}

/// Check if a researcher already uses a patient code
pub async fn code_exists(
    pool: &PgPool,
    researcher_id: Uuid,
    code: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE researcher_id = $1 AND code = $2)",
    )
    .bind(researcher_id)
    .bind(code)
    .fetch_one(pool)
    .await
}
