use serde::{Deserialize, Serialize};

use super::error::FieldErrors;
use crate::db::User;
use crate::entities::{ingredients, tags};
use crate::models::recipe::Recipe;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-field validation messages for 400 responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub fn field_errors(fields: FieldErrors) -> Self {
        Self {
            success: false,
            data: None,
            error: Some("Validation failed".to_string()),
            errors: Some(fields),
        }
    }
}

/// Never carries the password or its hash.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub name: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TagDto {
    pub id: i32,
    pub name: String,
}

impl From<tags::Model> for TagDto {
    fn from(tag: tags::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngredientDto {
    pub id: i32,
    pub name: String,
}

impl From<ingredients::Model> for IngredientDto {
    fn from(ingredient: ingredients::Model) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
        }
    }
}

/// List form: the base field set only. The detail form below repeats the
/// base fields and extends them; the two field lists are assembled
/// explicitly per view rather than through inheritance.
#[derive(Debug, Serialize)]
pub struct RecipeListDto {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: String,
    pub link: Option<String>,
}

impl From<&Recipe> for RecipeListDto {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price.to_string(),
            link: recipe.link.clone(),
        }
    }
}

/// Detail form: base fields plus description, image, and nested reads.
#[derive(Debug, Serialize)]
pub struct RecipeDetailDto {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: String,
    pub link: Option<String>,
    pub description: String,
    pub image: Option<String>,
    pub tags: Vec<TagDto>,
    pub ingredients: Vec<IngredientDto>,
}

impl From<Recipe> for RecipeDetailDto {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price.to_string(),
            link: recipe.link,
            description: recipe.description,
            image: recipe.image,
            tags: recipe.tags.into_iter().map(TagDto::from).collect(),
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(IngredientDto::from)
                .collect(),
        }
    }
}

/// Nested tag/ingredient writes arrive as `{ "name": ... }` objects and are
/// resolved by name with get-or-create-by-owner semantics.
#[derive(Debug, Deserialize)]
pub struct NameRef {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RecipeImageDto {
    pub id: i32,
    pub image: Option<String>,
}
