use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{FieldValidator, check_name, check_time_minutes, parse_price};
use super::{ApiError, ApiResponse, AppState, NameRef, RecipeDetailDto, RecipeImageDto, RecipeListDto};
use crate::models::recipe::{RecipeInput, RecipePatch};

/// Writable recipe fields. Everything is optional at the serde level so the
/// same shape serves POST, PUT, and PATCH; required-field enforcement is done
/// per method in the handlers.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeWriteRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    /// Accepted as JSON string or number, validated as a decimal
    pub price: Option<serde_json::Value>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<NameRef>>,
    pub ingredients: Option<Vec<NameRef>>,
}

/// GET /recipe/recipes
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<RecipeListDto>>>, ApiError> {
    let recipes = state.store().list_recipes(user.id).await?;
    let dtos: Vec<RecipeListDto> = recipes.iter().map(RecipeListDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /recipe/recipes
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<RecipeWriteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecipeDetailDto>>), ApiError> {
    let input = validate_full(payload)?;
    let recipe = state.store().create_recipe(user.id, input).await?;

    tracing::info!(user_id = user.id, recipe_id = recipe.id, "Recipe created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RecipeDetailDto::from(recipe))),
    ))
}

/// GET /recipe/recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let recipe = state
        .store()
        .get_recipe(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe", id))?;

    Ok(Json(ApiResponse::success(RecipeDetailDto::from(recipe))))
}

/// PUT /recipe/recipes/{id} — full update, all writable fields required
pub async fn replace_recipe(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(mut payload): Json<RecipeWriteRequest>,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    // Association lists stay optional even on PUT: only a supplied list
    // (possibly empty) replaces the current set
    let tags = payload.tags.take();
    let ingredients = payload.ingredients.take();

    let input = validate_full(payload)?;
    let patch = RecipePatch {
        title: Some(input.title),
        time_minutes: Some(input.time_minutes),
        price: Some(input.price),
        description: Some(input.description),
        link: input.link,
        tags: names(tags),
        ingredients: names(ingredients),
    };

    apply_patch(&state, current, id, patch).await
}

/// PATCH /recipe/recipes/{id} — partial update; a supplied tag/ingredient
/// list (even empty) replaces the association set
pub async fn patch_recipe(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<RecipeWriteRequest>,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let patch = validate_partial(payload)?;
    apply_patch(&state, current, id, patch).await
}

async fn apply_patch(
    state: &AppState,
    CurrentUser(user): CurrentUser,
    id: i32,
    patch: RecipePatch,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let recipe = state
        .store()
        .update_recipe(user.id, id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe", id))?;

    Ok(Json(ApiResponse::success(RecipeDetailDto::from(recipe))))
}

/// DELETE /recipe/recipes/{id}
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.store().delete_recipe(user.id, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Recipe", id))
    }
}

/// POST /recipe/recipes/{id}/upload-image
/// Multipart upload; the stored path keeps only the original extension.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<RecipeImageDto>>, ApiError> {
    // 404 before reading the body so other owners' ids stay unguessable
    if state.store().get_recipe(user.id, id).await?.is_none() {
        return Err(ApiError::not_found("Recipe", id));
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_field("image", format!("Invalid upload: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let original_filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_field("image", format!("Invalid upload: {e}")))?;

        if bytes.is_empty() {
            return Err(ApiError::validation_field(
                "image",
                "The submitted file is empty.",
            ));
        }

        let path = state
            .image_service
            .save_recipe_image(&original_filename, &bytes)
            .await?;

        let recipe = state
            .store()
            .set_recipe_image(user.id, id, &path)
            .await?
            .ok_or_else(|| ApiError::not_found("Recipe", id))?;

        return Ok(Json(ApiResponse::success(RecipeImageDto {
            id: recipe.id,
            image: recipe.image,
        })));
    }

    Err(ApiError::validation_field(
        "image",
        "No file was submitted.",
    ))
}

/// Validate the full writable field set (POST and PUT)
fn validate_full(payload: RecipeWriteRequest) -> Result<RecipeInput, ApiError> {
    let mut validator = FieldValidator::new();

    match &payload.title {
        Some(title) => validator.check("title", check_name(title)),
        None => validator.add("title", "This field is required."),
    }
    match payload.time_minutes {
        Some(time_minutes) => validator.check("time_minutes", check_time_minutes(time_minutes)),
        None => validator.add("time_minutes", "This field is required."),
    }
    let price = match &payload.price {
        Some(value) => match parse_price(value) {
            Ok(price) => Some(price),
            Err(message) => {
                validator.add("price", message);
                None
            }
        },
        None => {
            validator.add("price", "This field is required.");
            None
        }
    };
    validator.finish()?;

    Ok(RecipeInput {
        title: payload.title.unwrap_or_default(),
        time_minutes: payload.time_minutes.unwrap_or_default(),
        price: price.unwrap_or_default(),
        description: payload.description.unwrap_or_default(),
        link: payload.link,
        tags: names(payload.tags).unwrap_or_default(),
        ingredients: names(payload.ingredients).unwrap_or_default(),
    })
}

/// Validate only the fields that are present (PATCH)
fn validate_partial(payload: RecipeWriteRequest) -> Result<RecipePatch, ApiError> {
    let mut validator = FieldValidator::new();

    if let Some(title) = &payload.title {
        validator.check("title", check_name(title));
    }
    if let Some(time_minutes) = payload.time_minutes {
        validator.check("time_minutes", check_time_minutes(time_minutes));
    }
    let price = match &payload.price {
        Some(value) => match parse_price(value) {
            Ok(price) => Some(price),
            Err(message) => {
                validator.add("price", message);
                None
            }
        },
        None => None,
    };
    validator.finish()?;

    Ok(RecipePatch {
        title: payload.title,
        time_minutes: payload.time_minutes,
        price,
        description: payload.description,
        link: payload.link,
        tags: names(payload.tags),
        ingredients: names(payload.ingredients),
    })
}

fn names(refs: Option<Vec<NameRef>>) -> Option<Vec<String>> {
    refs.map(|list| list.into_iter().map(|r| r.name).collect())
}
