//! Profile endpoint for the authenticated researcher.

use actix_web::{web, HttpResponse};

use crate::db::researcher_repo;
use crate::error::{ApiError, Result};
use crate::middleware::ResearcherId;
use crate::models::researcher::ProfileResponse;
use crate::AppState;

/// GET /researchers/me
pub async fn get_me(
    state: web::Data<AppState>,
    researcher_id: ResearcherId,
) -> Result<HttpResponse> {
    let researcher = researcher_repo::find_by_id(&state.db, researcher_id.0)
        .await?
        .ok_or_else(|| ApiError::NotFound("Researcher not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(&researcher)))
}
