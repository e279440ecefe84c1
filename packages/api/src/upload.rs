//! # Profile photo files
//!
//! Photos are written to `<uploads.dir>/profile-photos/<user>-<uuid>.<ext>` and
//! referenced from the `users.profile_photo` column by their public URL path,
//! `/uploads/profile-photos/<file>`. The router serves `<uploads.dir>` under
//! `/uploads`, so the stored reference doubles as the download URL.
//!
//! Only the MIME types listed in `uploads.allowed_types` are accepted, up to
//! `uploads.max_bytes`. References that do not point inside the upload directory
//! (e.g. an external URL) are never touched on removal.

use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::error::ApiError;
use crate::settings::Uploads;

/// URL prefix under which the upload directory is served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";
const PHOTO_SUBDIR: &str = "profile-photos";

/// File extension for an accepted image MIME type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Reject files outside the allow-list or over the size cap.
pub fn validate(config: &Uploads, content_type: &str, len: usize) -> Result<&'static str, ApiError> {
    let allowed = config.allowed_types.iter().any(|t| t == content_type);
    let extension = extension_for(content_type).filter(|_| allowed).ok_or_else(|| {
        ApiError::BadRequest("Only image files (jpeg, png, gif, webp) are allowed".into())
    })?;
    if len == 0 {
        return Err(ApiError::BadRequest("No file uploaded".into()));
    }
    if len > config.max_bytes {
        return Err(ApiError::BadRequest(format!(
            "File too large (max {} bytes)",
            config.max_bytes
        )));
    }
    Ok(extension)
}

/// Write a validated photo and return its URL path.
pub async fn save_photo(
    config: &Uploads,
    user_id: i64,
    extension: &str,
    bytes: &[u8],
) -> Result<String, ApiError> {
    let dir = Path::new(&config.dir).join(PHOTO_SUBDIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(ApiError::internal)?;

    let file_name = format!("{user_id}-{}.{extension}", Uuid::new_v4().simple());
    tokio::fs::write(dir.join(&file_name), bytes)
        .await
        .map_err(ApiError::internal)?;

    Ok(format!("{UPLOADS_URL_PREFIX}{PHOTO_SUBDIR}/{file_name}"))
}

/// Filesystem path of a stored reference, if it points inside the upload directory.
pub fn local_path(config: &Uploads, url: &str) -> Option<PathBuf> {
    let relative = Path::new(url.strip_prefix(UPLOADS_URL_PREFIX)?);
    let safe = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    safe.then(|| Path::new(&config.dir).join(relative))
}

/// Best-effort removal of a previously stored photo.
pub async fn remove_photo(config: &Uploads, url: &str) {
    let Some(path) = local_path(config, url) else {
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "removed profile photo"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove profile photo"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> Uploads {
        Uploads {
            dir: dir.to_string_lossy().into_owned(),
            ..Uploads::default()
        }
    }

    #[test]
    fn test_validate() {
        let config = Uploads::default();
        assert_eq!(validate(&config, "image/png", 10).unwrap(), "png");
        assert!(validate(&config, "application/pdf", 10).is_err());
        assert!(validate(&config, "image/png", 0).is_err());
        assert!(validate(&config, "image/jpeg", config.max_bytes + 1).is_err());
        // Known extension but not in the configured allow-list.
        assert!(validate(&config, "image/heic", 10).is_err());
    }

    #[test]
    fn test_local_path_rejects_traversal() {
        let config = config(Path::new("/srv/uploads"));
        assert_eq!(
            local_path(&config, "/uploads/profile-photos/1-a.png"),
            Some(PathBuf::from("/srv/uploads/profile-photos/1-a.png"))
        );
        assert_eq!(local_path(&config, "/uploads/../etc/passwd"), None);
        assert_eq!(local_path(&config, "https://cdn.example.com/a.png"), None);
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let url = save_photo(&config, 7, "png", b"\x89PNG").await.unwrap();
        assert!(url.starts_with("/uploads/profile-photos/7-"));
        let path = local_path(&config, &url).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");

        remove_photo(&config, &url).await;
        assert!(!path.exists());
        // Removing twice is harmless.
        remove_photo(&config, &url).await;
    }
}
