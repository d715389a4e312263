use std::collections::HashMap;

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::{ingredients, prelude::*, recipe_ingredients, recipe_tags, recipes, tags};
use crate::models::recipe::{Recipe, RecipeInput, RecipePatch};

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a recipe with its tag/ingredient names resolved inside one
    /// transaction.
    pub async fn create(&self, user_id: i32, input: RecipeInput) -> Result<Recipe> {
        let txn = self.conn.begin().await?;

        let now = chrono::Utc::now().to_rfc3339();

        let recipe = recipes::ActiveModel {
            user_id: Set(user_id),
            title: Set(input.title),
            time_minutes: Set(input.time_minutes),
            price: Set(input.price),
            description: Set(input.description),
            link: Set(input.link),
            image: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let tag_ids = resolve_tag_names(&txn, user_id, &input.tags).await?;
        link_tags(&txn, recipe.id, &tag_ids).await?;

        let ingredient_ids = resolve_ingredient_names(&txn, user_id, &input.ingredients).await?;
        link_ingredients(&txn, recipe.id, &ingredient_ids).await?;

        txn.commit().await?;

        self.hydrate(recipe).await
    }

    /// List the owner's recipes, most recently created first.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Recipe>> {
        let rows = Recipes::find()
            .filter(recipes::Column::UserId.eq(user_id))
            .order_by_desc(recipes::Column::Id)
            .all(&self.conn)
            .await?;

        self.hydrate_many(rows).await
    }

    pub async fn get_for_user(&self, user_id: i32, id: i32) -> Result<Option<Recipe>> {
        let row = Recipes::find_by_id(id)
            .filter(recipes::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;

        match row {
            Some(model) => Ok(Some(self.hydrate(model).await?)),
            None => Ok(None),
        }
    }

    /// Partial update; returns `None` when the id does not belong to the
    /// owner. A supplied tag/ingredient list (even empty) replaces the
    /// association set; an omitted one is left untouched.
    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>> {
        let txn = self.conn.begin().await?;

        let Some(existing) = Recipes::find_by_id(id)
            .filter(recipes::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(None);
        };

        let mut active: recipes::ActiveModel = existing.into();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(time_minutes) = patch.time_minutes {
            active.time_minutes = Set(time_minutes);
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(link) = patch.link {
            active.link = Set(Some(link));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&txn).await?;

        if let Some(tag_names) = patch.tags {
            RecipeTags::delete_many()
                .filter(recipe_tags::Column::RecipeId.eq(id))
                .exec(&txn)
                .await?;
            let tag_ids = resolve_tag_names(&txn, user_id, &tag_names).await?;
            link_tags(&txn, id, &tag_ids).await?;
        }

        if let Some(ingredient_names) = patch.ingredients {
            RecipeIngredients::delete_many()
                .filter(recipe_ingredients::Column::RecipeId.eq(id))
                .exec(&txn)
                .await?;
            let ingredient_ids = resolve_ingredient_names(&txn, user_id, &ingredient_names).await?;
            link_ingredients(&txn, id, &ingredient_ids).await?;
        }

        txn.commit().await?;

        Ok(Some(self.hydrate(updated).await?))
    }

    /// Delete a recipe; association rows go with it via cascade.
    pub async fn delete(&self, user_id: i32, id: i32) -> Result<bool> {
        let result = Recipes::delete_many()
            .filter(recipes::Column::Id.eq(id))
            .filter(recipes::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Record the storage path of an uploaded recipe image.
    pub async fn set_image(&self, user_id: i32, id: i32, path: &str) -> Result<Option<Recipe>> {
        let Some(existing) = Recipes::find_by_id(id)
            .filter(recipes::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let mut active: recipes::ActiveModel = existing.into();
        active.image = Set(Some(path.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;

        Ok(Some(self.hydrate(updated).await?))
    }

    async fn hydrate(&self, model: recipes::Model) -> Result<Recipe> {
        let mut hydrated = self.hydrate_many(vec![model]).await?;
        hydrated
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Recipe vanished during hydration"))
    }

    /// Attach tags/ingredients by reading the association tables in bulk.
    async fn hydrate_many(&self, rows: Vec<recipes::Model>) -> Result<Vec<Recipe>> {
        let recipe_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let tag_links = RecipeTags::find()
            .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids.clone()))
            .all(&self.conn)
            .await?;
        let ingredient_links = RecipeIngredients::find()
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids))
            .all(&self.conn)
            .await?;

        let tag_ids: Vec<i32> = tag_links.iter().map(|l| l.tag_id).collect();
        let ingredient_ids: Vec<i32> = ingredient_links.iter().map(|l| l.ingredient_id).collect();

        let tags_by_id: HashMap<i32, tags::Model> = Tags::find()
            .filter(tags::Column::Id.is_in(tag_ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let ingredients_by_id: HashMap<i32, ingredients::Model> = Ingredients::find()
            .filter(ingredients::Column::Id.is_in(ingredient_ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        let recipes = rows
            .into_iter()
            .map(|model| {
                let tags = tag_links
                    .iter()
                    .filter(|l| l.recipe_id == model.id)
                    .filter_map(|l| tags_by_id.get(&l.tag_id).cloned())
                    .collect();
                let ingredients = ingredient_links
                    .iter()
                    .filter(|l| l.recipe_id == model.id)
                    .filter_map(|l| ingredients_by_id.get(&l.ingredient_id).cloned())
                    .collect();
                Recipe::from_parts(model, tags, ingredients)
            })
            .collect();

        Ok(recipes)
    }
}

/// Get-or-create scoped to the owner: reuse the owner's tag with a matching
/// name when one exists, otherwise create it. Duplicate same-name rows, if
/// any, resolve to the oldest.
async fn resolve_tag_names<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    names: &[String],
) -> Result<Vec<i32>> {
    let mut ids = Vec::with_capacity(names.len());

    for name in names {
        let existing = Tags::find()
            .filter(tags::Column::UserId.eq(user_id))
            .filter(tags::Column::Name.eq(name))
            .order_by_asc(tags::Column::Id)
            .one(conn)
            .await?;

        let id = match existing {
            Some(tag) => tag.id,
            None => {
                tags::ActiveModel {
                    user_id: Set(user_id),
                    name: Set(name.clone()),
                    ..Default::default()
                }
                .insert(conn)
                .await?
                .id
            }
        };

        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

async fn resolve_ingredient_names<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    names: &[String],
) -> Result<Vec<i32>> {
    let mut ids = Vec::with_capacity(names.len());

    for name in names {
        let existing = Ingredients::find()
            .filter(ingredients::Column::UserId.eq(user_id))
            .filter(ingredients::Column::Name.eq(name))
            .order_by_asc(ingredients::Column::Id)
            .one(conn)
            .await?;

        let id = match existing {
            Some(ingredient) => ingredient.id,
            None => {
                ingredients::ActiveModel {
                    user_id: Set(user_id),
                    name: Set(name.clone()),
                    ..Default::default()
                }
                .insert(conn)
                .await?
                .id
            }
        };

        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

async fn link_tags<C: ConnectionTrait>(conn: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    let links: Vec<recipe_tags::ActiveModel> = tag_ids
        .iter()
        .map(|&tag_id| recipe_tags::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        })
        .collect();

    RecipeTags::insert_many(links).exec(conn).await?;
    Ok(())
}

async fn link_ingredients<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    ingredient_ids: &[i32],
) -> Result<()> {
    if ingredient_ids.is_empty() {
        return Ok(());
    }

    let links: Vec<recipe_ingredients::ActiveModel> = ingredient_ids
        .iter()
        .map(|&ingredient_id| recipe_ingredients::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
        })
        .collect();

    RecipeIngredients::insert_many(links).exec(conn).await?;
    Ok(())
}
