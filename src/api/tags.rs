use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{FieldValidator, assigned_only_flag, check_name};
use super::{ApiError, ApiResponse, AppState, TagDto};

#[derive(Debug, Default, Deserialize)]
pub struct TagListQuery {
    /// `"1"` limits the list to tags assigned to at least one recipe
    pub assigned_only: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    #[serde(default)]
    pub name: String,
}

/// GET /recipe/tags
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<TagListQuery>,
) -> Result<Json<ApiResponse<Vec<TagDto>>>, ApiError> {
    let assigned_only = assigned_only_flag(query.assigned_only.as_deref());
    let tags = state.store().list_tags(user.id, assigned_only).await?;
    let dtos: Vec<TagDto> = tags.into_iter().map(TagDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// PATCH /recipe/tags/{id}
pub async fn update_tag(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTagRequest>,
) -> Result<Json<ApiResponse<TagDto>>, ApiError> {
    let mut validator = FieldValidator::new();
    validator.check("name", check_name(&payload.name));
    validator.finish()?;

    let tag = state
        .store()
        .update_tag(user.id, id, &payload.name)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag", id))?;

    Ok(Json(ApiResponse::success(TagDto::from(tag))))
}

/// DELETE /recipe/tags/{id}
pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.store().delete_tag(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Tag", id))
    }
}
