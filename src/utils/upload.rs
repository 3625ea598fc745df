use crate::error::HttpError;
use tokio::fs;
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const RECIPE_UPLOAD_PATH: &str = "/uploads/recipes";

/// An image file pulled out of a multipart submission
#[derive(Debug)]
pub struct ImageUpload {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// File extension for an accepted image content type
///
/// None doubles as the allow-list check: jpeg, png and webp only.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Store an uploaded recipe image and return its public reference
///
/// The file lands under `{upload_dir}/uploads/recipes/` with a random uuid
/// name; the returned string is the URL path clients use.
pub async fn save_image(upload_dir: &str, image: &ImageUpload) -> Result<String, HttpError> {
    let extension = extension_for(&image.content_type).ok_or_else(|| {
        HttpError::bad_request("Unsupported file type. Use JPG, PNG or WebP.")
    })?;

    if image.data.is_empty() {
        return Err(HttpError::bad_request("Please provide an image for the recipe."));
    }

    if image.data.len() > MAX_IMAGE_BYTES {
        return Err(HttpError::bad_request("File is too large. Maximum size: 5MB."));
    }

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let dir = format!("{}{}", upload_dir, RECIPE_UPLOAD_PATH);

    fs::create_dir_all(&dir).await.map_err(|e| {
        tracing::error!("Failed to create upload directory {}: {}", dir, e);
        HttpError::server_error("Failed to store the image")
    })?;

    let file_path = format!("{}/{}", dir, file_name);
    fs::write(&file_path, &image.data).await.map_err(|e| {
        tracing::error!("Failed to write uploaded image {}: {}", file_path, e);
        HttpError::server_error("Failed to store the image")
    })?;

    Ok(format!("{}/{}", RECIPE_UPLOAD_PATH, file_name))
}

/// Best-effort removal of a previously stored image
///
/// Only references under the managed upload path are touched; a missing
/// file is not an error.
pub async fn delete_image(upload_dir: &str, image_url: &str) {
    if !image_url.starts_with(RECIPE_UPLOAD_PATH) {
        return;
    }

    let file_path = format!("{}{}", upload_dir, image_url);
    if let Err(e) = fs::remove_file(&file_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Could not delete old image {}: {}", file_path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_image_types() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[tokio::test]
    async fn rejects_unsupported_type() {
        let image = ImageUpload {
            content_type: "text/plain".to_string(),
            data: vec![1, 2, 3],
        };
        assert!(save_image("/tmp", &image).await.is_err());
    }

    #[tokio::test]
    async fn rejects_oversized_image() {
        let image = ImageUpload {
            content_type: "image/png".to_string(),
            data: vec![0; MAX_IMAGE_BYTES + 1],
        };
        assert!(save_image("/tmp", &image).await.is_err());
    }

    #[tokio::test]
    async fn delete_ignores_foreign_references() {
        // Must not touch anything outside the managed path
        delete_image("/tmp", "/etc/passwd").await;
        delete_image("/tmp", "https://example.com/image.jpg").await;
    }
}
