//! Case catalogue handlers.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;

use casework_types::case::{Case, CaseWithAgent};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/cases - All cases ordered by id.
pub async fn list_cases(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<Case>>>, AppError> {
    let start = Instant::now();
    let cases = state.case_service.list().await?;
    Ok(Json(ApiResponse::success(cases, start).with_link("self", "/api/v1/cases")))
}

/// GET /api/v1/cases/{slug} - One case with its agent.
pub async fn get_case(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<CaseWithAgent>>, AppError> {
    let start = Instant::now();
    let case = state
        .case_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Case '{slug}' not found")))?;

    Ok(Json(
        ApiResponse::success(case, start).with_link("self", format!("/api/v1/cases/{slug}")),
    ))
}
