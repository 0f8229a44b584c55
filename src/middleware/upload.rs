//! Multipart upload handling for avatars, book PDFs and cover images.
//!
//! The declared MIME type is checked before a part's body is read and the
//! size ceiling while it streams in; only a fully accepted file reaches the
//! blob store.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::Path;

use axum::{
    async_trait,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    config::UploadConfig,
    error::{AppError, AppResult},
    models::user::AuthUser,
    services::blob::BlobStore,
    AppState,
};

const TOO_LARGE: &str = "File too large. Maximum size is 50MB for PDFs and 5MB for images.";

/// Per-route upload rules.
pub trait UploadKind: Send + Sync + 'static {
    /// Multipart field carrying the file.
    const FIELD: &'static str;
    const REJECTION: &'static str;

    fn accepts(content_type: &str) -> bool;
    fn limit(config: &UploadConfig) -> usize;
    /// Blob key for a new file.
    fn key(original_name: &str, uploader: Option<&AuthUser>) -> String;
    /// Path under which the stored file is referenced by clients.
    fn public_path(key: &str) -> String {
        format!("uploads/{}", key)
    }
}

fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

pub struct AvatarUpload;

impl UploadKind for AvatarUpload {
    const FIELD: &'static str = "avatar";
    const REJECTION: &'static str = "Only image files are allowed!";

    fn accepts(content_type: &str) -> bool {
        is_image(content_type)
    }

    fn limit(config: &UploadConfig) -> usize {
        config.image_limit
    }

    fn key(original_name: &str, uploader: Option<&AuthUser>) -> String {
        let owner = uploader.map(|u| u.id.to_hex()).unwrap_or_else(|| "anonymous".to_string());
        format!(
            "avatars/avatar-{}-{}{}",
            owner,
            unique_suffix(),
            extension(original_name)
        )
    }

    fn public_path(key: &str) -> String {
        format!("/uploads/{}", key)
    }
}

pub struct PdfUpload;

impl UploadKind for PdfUpload {
    const FIELD: &'static str = "pdfFile";
    const REJECTION: &'static str = "Only PDF files are allowed!";

    fn accepts(content_type: &str) -> bool {
        content_type == "application/pdf"
    }

    fn limit(config: &UploadConfig) -> usize {
        config.pdf_limit
    }

    fn key(original_name: &str, _uploader: Option<&AuthUser>) -> String {
        format!("{}-{}{}", base_name(original_name), unique_suffix(), extension(original_name))
    }
}

pub struct CoverUpload;

impl UploadKind for CoverUpload {
    const FIELD: &'static str = "coverImage";
    const REJECTION: &'static str = "Only image files are allowed!";

    fn accepts(content_type: &str) -> bool {
        is_image(content_type)
    }

    fn limit(config: &UploadConfig) -> usize {
        config.image_limit
    }

    fn key(original_name: &str, _uploader: Option<&AuthUser>) -> String {
        format!("{}-{}{}", base_name(original_name), unique_suffix(), extension(original_name))
    }
}

/// `<unix millis>-<random 0..1e9>`
fn unique_suffix() -> String {
    let random = uuid::Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("{}-{}", Utc::now().timestamp_millis(), random)
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn base_name(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .map(|s| sanitize(&s.to_string_lossy()))
        .unwrap_or_default();
    if stem.is_empty() {
        "file".to_string()
    } else {
        stem
    }
}

fn extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .map(|ext| sanitize(&ext.to_string_lossy()))
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// A file that passed the type and size checks, still in memory.
#[derive(Debug)]
pub struct AcceptedFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A file persisted to the blob store.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub key: String,
    pub public_path: String,
    pub original_name: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<AcceptedFile>,
    pub fields: HashMap<String, String>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadRejected(TOO_LARGE.to_string())
    } else {
        AppError::UploadRejected(err.body_text())
    }
}

/// Reads every part of the form, buffering the `K::FIELD` file.
pub async fn read_form<K: UploadKind>(mut multipart: Multipart, limit: usize) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let original_name = field.file_name().map(str::to_string);

        if name == K::FIELD {
            if form.file.is_some() {
                return Err(AppError::UploadRejected(format!("Unexpected field: {}", name)));
            }
            let content_type = field.content_type().unwrap_or_default().to_string();
            if !K::accepts(&content_type) {
                tracing::debug!("Rejected {} upload of type {:?}", K::FIELD, content_type);
                return Err(AppError::UploadRejected(K::REJECTION.to_string()));
            }

            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                if bytes.len() + chunk.len() > limit {
                    tracing::debug!("Rejected {} upload over {} bytes", K::FIELD, limit);
                    return Err(AppError::UploadRejected(TOO_LARGE.to_string()));
                }
                bytes.extend_from_slice(&chunk);
            }

            form.file = Some(AcceptedFile {
                original_name: original_name.unwrap_or_else(|| "upload".to_string()),
                content_type,
                bytes,
            });
        } else if original_name.is_none() {
            let text = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, text);
        }
        // stray file parts are skipped by the next `next_field`
    }

    Ok(form)
}

pub async fn persist<K: UploadKind>(
    blobs: &dyn BlobStore,
    file: AcceptedFile,
    uploader: Option<&AuthUser>,
) -> AppResult<StoredFile> {
    let key = K::key(&file.original_name, uploader);
    blobs.put(&key, &file.bytes).await?;
    tracing::info!(
        "Stored {} upload {} ({} bytes, {})",
        K::FIELD,
        key,
        file.bytes.len(),
        file.content_type
    );

    Ok(StoredFile {
        public_path: K::public_path(&key),
        key,
        original_name: file.original_name,
        size: file.bytes.len(),
    })
}

/// Extractor for multipart routes: validates, stores the file, and hands the
/// handler the stored file plus the remaining text fields.
pub struct Upload<K> {
    pub file: Option<StoredFile>,
    pub fields: HashMap<String, String>,
    kind: PhantomData<fn() -> K>,
}

impl<K> Upload<K> {
    pub fn field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }
}

#[async_trait]
impl<K: UploadKind> FromRequest<AppState> for Upload<K> {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let uploader = req.extensions().get::<AuthUser>().cloned();
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let form = read_form::<K>(multipart, K::limit(&state.config.uploads)).await?;
        let file = match form.file {
            Some(accepted) => Some(persist::<K>(state.blobs.as_ref(), accepted, uploader.as_ref()).await?),
            None => None,
        };

        Ok(Self {
            file,
            fields: form.fields,
            kind: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn mime_filters() {
        assert!(AvatarUpload::accepts("image/png"));
        assert!(CoverUpload::accepts("image/webp"));
        assert!(!AvatarUpload::accepts("application/pdf"));
        assert!(PdfUpload::accepts("application/pdf"));
        assert!(!PdfUpload::accepts("image/png"));
        assert!(!PdfUpload::accepts(""));
    }

    #[test]
    fn avatar_key_embeds_uploader() {
        let user = AuthUser {
            id: ObjectId::new(),
            role: Default::default(),
        };
        let key = AvatarUpload::key("me.JPG", Some(&user));
        assert!(key.starts_with(&format!("avatars/avatar-{}-", user.id.to_hex())));
        assert!(key.ends_with(".JPG"));
        assert_eq!(AvatarUpload::public_path(&key), format!("/uploads/{}", key));
    }

    #[test]
    fn pdf_key_keeps_sanitized_base_name() {
        let key = PdfUpload::key("My Book (1).pdf", None);
        assert!(key.starts_with("My_Book__1_-"));
        assert!(key.ends_with(".pdf"));
        assert!(!key.contains('/'));
        assert_ne!(key, PdfUpload::key("My Book (1).pdf", None));
        assert_eq!(PdfUpload::public_path("a.pdf"), "uploads/a.pdf");
    }

    #[test]
    fn traversal_names_are_flattened() {
        let key = CoverUpload::key("../../etc/passwd", None);
        assert!(key.starts_with("passwd-"));
        assert!(crate::services::blob::is_safe_key(&key));
    }
}
