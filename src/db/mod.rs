use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::prelude::*;
use crate::models::recipe::{Recipe, RecipeInput, RecipePatch};

pub mod migrator;
pub mod repositories;

pub use repositories::user::{CreateUserError, NewUser, User};

use crate::entities::{ingredients, tags};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("memory") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    fn ingredient_repo(&self) -> repositories::ingredient::IngredientRepository {
        repositories::ingredient::IngredientRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        new_user: NewUser,
        security: Option<&SecurityConfig>,
    ) -> Result<User, CreateUserError> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn verify_token(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().verify_token(token).await
    }

    // ========== Recipes ==========

    pub async fn create_recipe(&self, user_id: i32, input: RecipeInput) -> Result<Recipe> {
        self.recipe_repo().create(user_id, input).await
    }

    pub async fn list_recipes(&self, user_id: i32) -> Result<Vec<Recipe>> {
        self.recipe_repo().list_for_user(user_id).await
    }

    pub async fn get_recipe(&self, user_id: i32, id: i32) -> Result<Option<Recipe>> {
        self.recipe_repo().get_for_user(user_id, id).await
    }

    pub async fn update_recipe(
        &self,
        user_id: i32,
        id: i32,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>> {
        self.recipe_repo().update(user_id, id, patch).await
    }

    pub async fn delete_recipe(&self, user_id: i32, id: i32) -> Result<bool> {
        self.recipe_repo().delete(user_id, id).await
    }

    pub async fn set_recipe_image(
        &self,
        user_id: i32,
        id: i32,
        path: &str,
    ) -> Result<Option<Recipe>> {
        self.recipe_repo().set_image(user_id, id, path).await
    }

    // ========== Tags ==========

    pub async fn create_tag(&self, user_id: i32, name: &str) -> Result<tags::Model> {
        self.tag_repo().create(user_id, name).await
    }

    pub async fn list_tags(&self, user_id: i32, assigned_only: bool) -> Result<Vec<tags::Model>> {
        self.tag_repo().list_for_user(user_id, assigned_only).await
    }

    pub async fn update_tag(
        &self,
        user_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Option<tags::Model>> {
        self.tag_repo().update_name(user_id, id, name).await
    }

    pub async fn delete_tag(&self, user_id: i32, id: i32) -> Result<bool> {
        self.tag_repo().delete(user_id, id).await
    }

    // ========== Ingredients ==========

    pub async fn create_ingredient(&self, user_id: i32, name: &str) -> Result<ingredients::Model> {
        self.ingredient_repo().create(user_id, name).await
    }

    pub async fn list_ingredients(
        &self,
        user_id: i32,
        assigned_only: bool,
    ) -> Result<Vec<ingredients::Model>> {
        self.ingredient_repo()
            .list_for_user(user_id, assigned_only)
            .await
    }

    pub async fn update_ingredient(
        &self,
        user_id: i32,
        id: i32,
        name: &str,
    ) -> Result<Option<ingredients::Model>> {
        self.ingredient_repo().update_name(user_id, id, name).await
    }

    pub async fn delete_ingredient(&self, user_id: i32, id: i32) -> Result<bool> {
        self.ingredient_repo().delete(user_id, id).await
    }

    // ========== Stats ==========

    pub async fn count_rows(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            users: Users::find().count(&self.conn).await?,
            recipes: Recipes::find().count(&self.conn).await?,
            tags: Tags::find().count(&self.conn).await?,
            ingredients: Ingredients::find().count(&self.conn).await?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StoreCounts {
    pub users: u64,
    pub recipes: u64,
    pub tags: u64,
    pub ingredients: u64,
}
