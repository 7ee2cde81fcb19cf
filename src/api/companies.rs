//! `/companies` handlers.

use super::{AppState, ApiError, blocking};
use crate::models::{Company, CompanyId, FieldMap};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

type JsonBody = Result<Json<FieldMap>, JsonRejection>;

/// `GET /companies`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Company>>, ApiError> {
    let companies = state.companies;
    Ok(Json(blocking(move || companies.list()).await?))
}

/// `POST /companies`
pub async fn create(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    let Json(input) = body?;
    let companies = state.companies;
    let company = blocking(move || companies.create(&input)).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// `GET /companies/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Company>, ApiError> {
    let companies = state.companies;
    let id = CompanyId::new(id);
    Ok(Json(blocking(move || companies.get(&id)).await?))
}

/// `PUT /companies/{id}`
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<Json<Company>, ApiError> {
    let Json(input) = body?;
    let companies = state.companies;
    let id = CompanyId::new(id);
    Ok(Json(blocking(move || companies.replace(&id, &input)).await?))
}

/// `PATCH /companies/{id}`
pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<Json<Company>, ApiError> {
    let Json(input) = body?;
    let companies = state.companies;
    let id = CompanyId::new(id);
    Ok(Json(blocking(move || companies.patch(&id, &input)).await?))
}

/// `DELETE /companies/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let companies = state.companies;
    let id = CompanyId::new(id);
    blocking(move || companies.delete(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /companies/{id}/children`
pub async fn children(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Company>>, ApiError> {
    let companies = state.companies;
    let id = CompanyId::new(id);
    Ok(Json(blocking(move || companies.children(&id)).await?))
}

/// `GET /companies/{id}/ancestors`
pub async fn ancestors(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Company>>, ApiError> {
    let companies = state.companies;
    let id = CompanyId::new(id);
    Ok(Json(blocking(move || companies.ancestors(&id)).await?))
}
