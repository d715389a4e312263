use std::collections::BTreeSet;

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{prelude::*, recipe_tags, recipes, tags};

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32, name: &str) -> Result<tags::Model> {
        let model = tags::ActiveModel {
            user_id: Set(user_id),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    /// List the owner's tags, most recent names first.
    ///
    /// With `assigned_only`, restrict to tags attached to at least one of the
    /// owner's recipes; a tag attached to several recipes appears once. The
    /// filter reads the association table explicitly rather than joining
    /// through the recipe entity.
    pub async fn list_for_user(&self, user_id: i32, assigned_only: bool) -> Result<Vec<tags::Model>> {
        let mut query = Tags::find().filter(tags::Column::UserId.eq(user_id));

        if assigned_only {
            let recipe_ids: Vec<i32> = Recipes::find()
                .filter(recipes::Column::UserId.eq(user_id))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|r| r.id)
                .collect();

            let assigned: BTreeSet<i32> = RecipeTags::find()
                .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|link| link.tag_id)
                .collect();

            query = query.filter(tags::Column::Id.is_in(assigned));
        }

        let rows = query
            .order_by_desc(tags::Column::Name)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn get_for_user(&self, user_id: i32, id: i32) -> Result<Option<tags::Model>> {
        let tag = Tags::find_by_id(id)
            .filter(tags::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;

        Ok(tag)
    }

    /// Rename a tag; returns `None` when the id does not belong to the owner.
    pub async fn update_name(
        &self,
        user_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Option<tags::Model>> {
        let Some(tag) = self.get_for_user(user_id, id).await? else {
            return Ok(None);
        };

        let mut active: tags::ActiveModel = tag.into();
        active.name = Set(name.to_string());
        let updated = active.update(&self.conn).await?;

        Ok(Some(updated))
    }

    /// Delete a tag; returns `false` when the id does not belong to the owner.
    pub async fn delete(&self, user_id: i32, id: i32) -> Result<bool> {
        let result = Tags::delete_many()
            .filter(tags::Column::Id.eq(id))
            .filter(tags::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
