use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{FieldValidator, assigned_only_flag, check_name};
use super::{ApiError, ApiResponse, AppState, IngredientDto};

#[derive(Debug, Default, Deserialize)]
pub struct IngredientListQuery {
    pub assigned_only: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIngredientRequest {
    #[serde(default)]
    pub name: String,
}

/// GET /recipe/ingredients
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<IngredientListQuery>,
) -> Result<Json<ApiResponse<Vec<IngredientDto>>>, ApiError> {
    let assigned_only = assigned_only_flag(query.assigned_only.as_deref());
    let ingredients = state
        .store()
        .list_ingredients(user.id, assigned_only)
        .await?;
    let dtos: Vec<IngredientDto> = ingredients.into_iter().map(IngredientDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// PATCH /recipe/ingredients/{id}
pub async fn update_ingredient(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateIngredientRequest>,
) -> Result<Json<ApiResponse<IngredientDto>>, ApiError> {
    let mut validator = FieldValidator::new();
    validator.check("name", check_name(&payload.name));
    validator.finish()?;

    let ingredient = state
        .store()
        .update_ingredient(user.id, id, &payload.name)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient", id))?;

    Ok(Json(ApiResponse::success(IngredientDto::from(ingredient))))
}

/// DELETE /recipe/ingredients/{id}
pub async fn delete_ingredient(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.store().delete_ingredient(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Ingredient", id))
    }
}
