use anyhow::Context;
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::state::AppState;

/// How long a presigned recipe image link stays valid.
pub const PRESIGN_TTL_SECS: u64 = 30 * 60;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
    pub filename: String,
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub name: String,
}

pub async fn upload_recipe_image(st: &AppState, img: UploadItem) -> anyhow::Result<StoredImage> {
    anyhow::ensure!(!img.body.is_empty(), "empty image upload");

    let ext = ext_from_mime(&img.content_type)
        .or_else(|| ext_from_filename(&img.filename))
        .unwrap_or("bin");
    let key = format!(
        "recipes/recipe_{}_{}.{}",
        OffsetDateTime::now_utc().unix_timestamp(),
        Uuid::new_v4(),
        ext
    );
    st.storage
        .put_object(&key, img.body, &img.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    Ok(StoredImage {
        key,
        name: img.filename,
    })
}

/// Removes a stored image; failures are logged and swallowed.
pub async fn delete_image(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = ?e, %key, "failed to delete stored image");
    }
}

pub async fn presign(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign url for key {}", key))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn ext_from_filename(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "heic" => Some("heic"),
        "gif" => Some("gif"),
        _ => None,
    }
}
