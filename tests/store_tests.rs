use forkful::db::{CreateUserError, NewUser, Store};
use forkful::models::recipe::{RecipeInput, RecipePatch};
use rust_decimal::Decimal;

async fn spawn_store() -> Store {
    Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to create in-memory store")
}

async fn seed_user(store: &Store, email: &str) -> i32 {
    store
        .create_user(NewUser::member(email, "testpass123", "Test User"), None)
        .await
        .expect("Failed to seed user")
        .id
}

fn sample_input() -> RecipeInput {
    RecipeInput {
        title: "Sample recipe".to_string(),
        time_minutes: 10,
        price: Decimal::new(525, 2),
        description: String::new(),
        link: None,
        tags: vec![],
        ingredients: vec![],
    }
}

#[tokio::test]
async fn test_create_user_normalizes_and_rejects_duplicates() {
    let store = spawn_store().await;

    let user = store
        .create_user(
            NewUser::member("Test@EXAMPLE.com", "testpass123", "Test"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(user.email, "Test@example.com");
    assert_eq!(user.token.len(), 64);
    assert!(user.is_active);
    assert!(!user.is_staff);

    // Same address modulo domain case is a duplicate
    let err = store
        .create_user(
            NewUser::member("Test@example.COM", "testpass123", "Test"),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CreateUserError::DuplicateEmail));

    let err = store
        .create_user(NewUser::member("   ", "testpass123", "Test"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CreateUserError::BlankEmail));
}

#[tokio::test]
async fn test_verify_credentials() {
    let store = spawn_store().await;
    seed_user(&store, "login@example.com").await;

    let user = store
        .verify_credentials("login@example.com", "testpass123")
        .await
        .unwrap();
    assert!(user.is_some());

    let user = store
        .verify_credentials("login@example.com", "wrongpass")
        .await
        .unwrap();
    assert!(user.is_none());

    let user = store
        .verify_credentials("nobody@example.com", "testpass123")
        .await
        .unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn test_verify_token() {
    let store = spawn_store().await;
    let user = store
        .create_user(NewUser::member("tok@example.com", "testpass123", ""), None)
        .await
        .unwrap();

    let found = store.verify_token(&user.token).await.unwrap();
    assert_eq!(found.unwrap().id, user.id);

    let found = store.verify_token("not-a-token").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_superuser_flags() {
    let store = spawn_store().await;
    let user = store
        .create_user(
            NewUser::superuser("admin@example.com", "testpass123", "Admin"),
            None,
        )
        .await
        .unwrap();
    assert!(user.is_staff);
    assert!(user.is_superuser);
}

#[tokio::test]
async fn test_tags_scoped_and_duplicates_allowed() {
    let store = spawn_store().await;
    let owner = seed_user(&store, "owner@example.com").await;
    let other = seed_user(&store, "other@example.com").await;

    store.create_tag(owner, "Vegan").await.unwrap();
    store.create_tag(owner, "Vegan").await.unwrap();
    store.create_tag(other, "Vegan").await.unwrap();

    // No uniqueness on (owner, name): direct creation may duplicate
    let tags = store.list_tags(owner, false).await.unwrap();
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().all(|t| t.user_id == owner));
}

#[tokio::test]
async fn test_update_tag_scoped_to_owner() {
    let store = spawn_store().await;
    let owner = seed_user(&store, "owner@example.com").await;
    let other = seed_user(&store, "other@example.com").await;

    let tag = store.create_tag(owner, "Dessert").await.unwrap();

    let updated = store.update_tag(other, tag.id, "Stolen").await.unwrap();
    assert!(updated.is_none());
    assert!(!store.delete_tag(other, tag.id).await.unwrap());

    let updated = store.update_tag(owner, tag.id, "Pudding").await.unwrap();
    assert_eq!(updated.unwrap().name, "Pudding");
    assert!(store.delete_tag(owner, tag.id).await.unwrap());
}

#[tokio::test]
async fn test_ingredients_scoped_to_owner() {
    let store = spawn_store().await;
    let owner = seed_user(&store, "owner@example.com").await;
    let other = seed_user(&store, "other@example.com").await;

    let ingredient = store.create_ingredient(owner, "Salt").await.unwrap();
    store.create_ingredient(other, "Pepper").await.unwrap();

    let listed = store.list_ingredients(owner, false).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Salt");

    assert!(
        store
            .update_ingredient(other, ingredient.id, "Sugar")
            .await
            .unwrap()
            .is_none()
    );
    assert!(!store.delete_ingredient(other, ingredient.id).await.unwrap());
}

#[tokio::test]
async fn test_create_recipe_resolves_names_once() {
    let store = spawn_store().await;
    let owner = seed_user(&store, "owner@example.com").await;

    let mut input = sample_input();
    input.tags = vec!["Lemon".to_string(), "Lemon".to_string()];
    input.ingredients = vec!["Sugar".to_string()];
    let recipe = store.create_recipe(owner, input).await.unwrap();

    // The repeated name collapses to one association
    assert_eq!(recipe.tags.len(), 1);
    assert_eq!(recipe.tags[0].name, "Lemon");
    assert_eq!(recipe.ingredients.len(), 1);

    // A second recipe naming the same tag reuses the row
    let mut input = sample_input();
    input.tags = vec!["Lemon".to_string()];
    let second = store.create_recipe(owner, input).await.unwrap();
    assert_eq!(second.tags[0].id, recipe.tags[0].id);

    assert_eq!(store.list_tags(owner, false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_recipe_patch_semantics() {
    let store = spawn_store().await;
    let owner = seed_user(&store, "owner@example.com").await;

    let mut input = sample_input();
    input.tags = vec!["Breakfast".to_string()];
    let recipe = store.create_recipe(owner, input).await.unwrap();

    // Omitted fields and association lists stay untouched
    let patch = RecipePatch {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    let updated = store
        .update_recipe(owner, recipe.id, patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.price, Decimal::new(525, 2));
    assert_eq!(updated.tags.len(), 1);

    // An empty list clears the associations but not the tags themselves
    let patch = RecipePatch {
        tags: Some(vec![]),
        ..Default::default()
    };
    let updated = store
        .update_recipe(owner, recipe.id, patch)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.tags.is_empty());
    assert_eq!(store.list_tags(owner, false).await.unwrap().len(), 1);
    assert_eq!(store.list_tags(owner, true).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_recipe_wrong_owner_is_none() {
    let store = spawn_store().await;
    let owner = seed_user(&store, "owner@example.com").await;
    let other = seed_user(&store, "other@example.com").await;

    let recipe = store.create_recipe(owner, sample_input()).await.unwrap();

    let patch = RecipePatch {
        title: Some("Hijacked".to_string()),
        ..Default::default()
    };
    assert!(
        store
            .update_recipe(other, recipe.id, patch)
            .await
            .unwrap()
            .is_none()
    );
    assert!(!store.delete_recipe(other, recipe.id).await.unwrap());

    let unchanged = store.get_recipe(owner, recipe.id).await.unwrap().unwrap();
    assert_eq!(unchanged.title, "Sample recipe");
}

#[tokio::test]
async fn test_delete_recipe_cascades_links_only() {
    let store = spawn_store().await;
    let owner = seed_user(&store, "owner@example.com").await;

    let mut input = sample_input();
    input.tags = vec!["Dinner".to_string()];
    input.ingredients = vec!["Rice".to_string()];
    let recipe = store.create_recipe(owner, input).await.unwrap();

    assert!(store.delete_recipe(owner, recipe.id).await.unwrap());
    assert!(store.get_recipe(owner, recipe.id).await.unwrap().is_none());

    // Tags and ingredients survive the recipe, only the links are gone
    assert_eq!(store.list_tags(owner, false).await.unwrap().len(), 1);
    assert_eq!(store.list_tags(owner, true).await.unwrap().len(), 0);
    assert_eq!(store.list_ingredients(owner, false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_set_recipe_image() {
    let store = spawn_store().await;
    let owner = seed_user(&store, "owner@example.com").await;

    let recipe = store.create_recipe(owner, sample_input()).await.unwrap();
    assert!(recipe.image.is_none());

    let updated = store
        .set_recipe_image(owner, recipe.id, "uploads/recipe/abc.jpg")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.image.as_deref(), Some("uploads/recipe/abc.jpg"));
}

#[tokio::test]
async fn test_count_rows() {
    let store = spawn_store().await;
    let owner = seed_user(&store, "owner@example.com").await;

    let mut input = sample_input();
    input.tags = vec!["Dinner".to_string()];
    store.create_recipe(owner, input).await.unwrap();

    let counts = store.count_rows().await.unwrap();
    assert_eq!(counts.users, 1);
    assert_eq!(counts.recipes, 1);
    assert_eq!(counts.tags, 1);
    assert_eq!(counts.ingredients, 0);

    store.ping().await.unwrap();
}
