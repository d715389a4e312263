use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// Derive the storage path for a recipe image from the original filename.
///
/// Only the extension (everything after the last `.`) survives from the
/// original name; the stem is replaced with a fresh UUID so paths never
/// collide and never leak the uploader's filename. A filename with no dot
/// yields a path with no extension at all.
#[must_use]
pub fn recipe_image_path(original_filename: &str) -> String {
    recipe_image_path_with_id(original_filename, Uuid::new_v4())
}

/// Deterministic variant taking the identifier explicitly.
#[must_use]
pub fn recipe_image_path_with_id(original_filename: &str, id: Uuid) -> String {
    match original_filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("uploads/recipe/{id}.{ext}"),
        _ => format!("uploads/recipe/{id}"),
    }
}

/// Writes uploaded recipe images under the configured media root.
pub struct ImageService {
    media_root: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Persist image bytes and return the derived relative path.
    pub async fn save_recipe_image(&self, original_filename: &str, bytes: &[u8]) -> Result<String> {
        let relative = recipe_image_path(original_filename);
        let file_path = self.media_root.join(&relative);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(path = %file_path.display(), size = bytes.len(), "Saved recipe image");

        Ok(relative)
    }
}
