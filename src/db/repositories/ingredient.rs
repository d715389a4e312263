use std::collections::BTreeSet;

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{ingredients, prelude::*, recipe_ingredients, recipes};

/// Same contract as `TagRepository`, substituting ingredients.
pub struct IngredientRepository {
    conn: DatabaseConnection,
}

impl IngredientRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32, name: &str) -> Result<ingredients::Model> {
        let model = ingredients::ActiveModel {
            user_id: Set(user_id),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    pub async fn list_for_user(
        &self,
        user_id: i32,
        assigned_only: bool,
    ) -> Result<Vec<ingredients::Model>> {
        let mut query = Ingredients::find().filter(ingredients::Column::UserId.eq(user_id));

        if assigned_only {
            let recipe_ids: Vec<i32> = Recipes::find()
                .filter(recipes::Column::UserId.eq(user_id))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|r| r.id)
                .collect();

            let assigned: BTreeSet<i32> = RecipeIngredients::find()
                .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|link| link.ingredient_id)
                .collect();

            query = query.filter(ingredients::Column::Id.is_in(assigned));
        }

        let rows = query
            .order_by_desc(ingredients::Column::Name)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn get_for_user(&self, user_id: i32, id: i32) -> Result<Option<ingredients::Model>> {
        let ingredient = Ingredients::find_by_id(id)
            .filter(ingredients::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;

        Ok(ingredient)
    }

    pub async fn update_name(
        &self,
        user_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Option<ingredients::Model>> {
        let Some(ingredient) = self.get_for_user(user_id, id).await? else {
            return Ok(None);
        };

        let mut active: ingredients::ActiveModel = ingredient.into();
        active.name = Set(name.to_string());
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    pub async fn delete(&self, user_id: i32, id: i32) -> Result<bool> {
        let result = Ingredients::delete_many()
            .filter(ingredients::Column::Id.eq(id))
            .filter(ingredients::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
