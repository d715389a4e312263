use rust_decimal::Decimal;

use crate::entities::{ingredients, recipes, tags};

/// A recipe hydrated with its tag and ingredient associations.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: Option<String>,
    pub image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub tags: Vec<tags::Model>,
    pub ingredients: Vec<ingredients::Model>,
}

impl Recipe {
    #[must_use]
    pub fn from_parts(
        model: recipes::Model,
        tags: Vec<tags::Model>,
        ingredients: Vec<ingredients::Model>,
    ) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            time_minutes: model.time_minutes,
            price: model.price,
            description: model.description,
            link: model.link,
            image: model.image,
            created_at: model.created_at,
            updated_at: model.updated_at,
            tags,
            ingredients,
        }
    }
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Fields for creating a recipe. Tag/ingredient names are resolved with
/// get-or-create-by-owner semantics.
#[derive(Debug, Clone)]
pub struct RecipeInput {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: Option<String>,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// Partial update. `None` leaves a field untouched; a present `tags` or
/// `ingredients` list (even empty) fully replaces the association set.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}
