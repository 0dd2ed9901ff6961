use serde::Serialize;
use sqlx::FromRow;

/// Stored binary metadata. Exactly one parent row owns a FileUpload
/// through a nullable foreign key (thumbnail_id, logo_id, image_id, ...).
#[derive(Debug, Clone, FromRow)]
pub struct FileUpload {
    pub id: i64,
    /// Storage key, `subfolder/randomname.ext`.
    pub name: String,
    pub extname: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Public shape of a stored file. Key, size and path stay internal.
#[derive(Debug, Clone, Serialize)]
pub struct FileUploadResponse {
    pub id: i64,
    pub extname: String,
    pub mime_type: String,
    pub url: String,
}

impl From<FileUpload> for FileUploadResponse {
    fn from(file: FileUpload) -> Self {
        Self {
            id: file.id,
            extname: file.extname,
            mime_type: file.mime_type,
            url: file.url,
        }
    }
}
