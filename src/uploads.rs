use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tokio::fs;
use uuid::Uuid;

use crate::llm::GeneratedImage;

/// Strips any path components from a client-supplied file name.
fn safe_file_name(original: &str) -> Option<String> {
    let name = Path::new(original).file_name()?.to_string_lossy().to_string();
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Persists an upload under its original file name and returns the stored
/// name. A name collision overwrites the previous file; last write wins, as
/// in the original service.
pub async fn persist_upload(upload_dir: &Path, original_name: &str, bytes: &[u8]) -> Result<String> {
    let file_name = safe_file_name(original_name)
        .ok_or_else(|| anyhow!("invalid upload file name: {original_name}"))?;
    let path = upload_dir.join(&file_name);
    fs::write(&path, bytes)
        .await
        .with_context(|| format!("failed to store upload {}", path.display()))?;
    Ok(file_name)
}

/// Reads a reference image previously stored in the upload directory; a bare
/// path outside it is accepted for compatibility with path-supplied requests.
pub async fn read_reference(upload_dir: &Path, entry: &str) -> Result<Vec<u8>> {
    if let Some(file_name) = safe_file_name(entry) {
        let stored = upload_dir.join(&file_name);
        if let Ok(bytes) = fs::read(&stored).await {
            return Ok(bytes);
        }
    }
    fs::read(entry)
        .await
        .with_context(|| format!("reference image not found: {entry}"))
}

/// Writes a generated image under a unique name and returns the file name.
pub async fn store_generated(generated_dir: &Path, image: &GeneratedImage) -> Result<String> {
    let file_name = format!(
        "gemini_photo_{}.{}",
        Uuid::new_v4().simple(),
        extension_for_mime(&image.mime_type)
    );
    let path = generated_dir.join(&file_name);
    fs::write(&path, &image.bytes)
        .await
        .with_context(|| format!("failed to store generated image {}", path.display()))?;
    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_names_lose_path_components() {
        assert_eq!(safe_file_name("bottle.png").as_deref(), Some("bottle.png"));
        assert_eq!(
            safe_file_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            safe_file_name("photos/summer/shot.jpg").as_deref(),
            Some("shot.jpg")
        );
        assert_eq!(safe_file_name(""), None);
        assert_eq!(safe_file_name(".."), None);
    }

    #[tokio::test]
    async fn uploads_persist_under_original_name_last_write_wins() {
        let dir = tempdir().unwrap();
        let stored = persist_upload(dir.path(), "bottle.png", b"first")
            .await
            .unwrap();
        assert_eq!(stored, "bottle.png");

        persist_upload(dir.path(), "nested/bottle.png", b"second")
            .await
            .unwrap();
        let contents = fs::read(dir.path().join("bottle.png")).await.unwrap();
        assert_eq!(contents, b"second");
    }

    #[tokio::test]
    async fn stored_uploads_read_back_as_references() {
        let dir = tempdir().unwrap();
        persist_upload(dir.path(), "bottle.png", b"reference")
            .await
            .unwrap();
        let bytes = read_reference(dir.path(), "bottle.png").await.unwrap();
        assert_eq!(bytes, b"reference");
    }

    #[tokio::test]
    async fn missing_references_are_errors() {
        let dir = tempdir().unwrap();
        assert!(read_reference(dir.path(), "absent.png").await.is_err());
    }

    #[tokio::test]
    async fn generated_images_get_unique_names_with_mime_extension() {
        let dir = tempdir().unwrap();
        let image = GeneratedImage {
            bytes: b"img".to_vec(),
            mime_type: "image/jpeg".to_string(),
        };
        let first = store_generated(dir.path(), &image).await.unwrap();
        let second = store_generated(dir.path(), &image).await.unwrap();
        assert!(first.starts_with("gemini_photo_"));
        assert!(first.ends_with(".jpg"));
        assert_ne!(first, second);
    }
}
