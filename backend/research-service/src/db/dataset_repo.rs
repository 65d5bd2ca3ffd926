/// Dataset metadata database operations
use crate::models::dataset::CreateDatasetRequest;
use crate::models::{Dataset, DatasetKind, DatasetKindCount};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_dataset(
    pool: &PgPool,
    patient_id: Uuid,
    fields: &CreateDatasetRequest,
) -> Result<Dataset, sqlx::Error> {
    sqlx::query_as::<_, Dataset>(
        r#"
        INSERT INTO datasets (id, patient_id, kind, name, description, record_count, uploaded_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(patient_id)
    .bind(fields.kind)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.record_count)
    .fetch_one(pool)
    .await
}

/// List a patient's datasets, optionally narrowed to one kind.
pub async fn list_for_patient(
    pool: &PgPool,
    patient_id: Uuid,
    kind: Option<DatasetKind>,
) -> Result<Vec<Dataset>, sqlx::Error> {
    sqlx::query_as::<_, Dataset>(
        r#"
        SELECT *
        FROM datasets
        WHERE patient_id = $1
          AND ($2::dataset_kind IS NULL OR kind = $2)
        ORDER BY uploaded_at DESC
        "#,
    )
    .bind(patient_id)
    .bind(kind)
    .fetch_all(pool)
    .await
}

/// Dataset counts per kind across every patient the researcher owns.
pub async fn count_by_kind(
    pool: &PgPool,
    researcher_id: Uuid,
) -> Result<Vec<DatasetKindCount>, sqlx::Error> {
    sqlx::query_as::<_, DatasetKindCount>(
        r#"
        SELECT d.kind, COUNT(*) AS count
        FROM datasets d
        JOIN patients p ON p.id = d.patient_id
        WHERE p.researcher_id = $1
        GROUP BY d.kind
        ORDER BY count DESC
        "#,
    )
    .bind(researcher_id)
    .fetch_all(pool)
    .await
}
