//! Attachment slots and the stored-file lifecycle shared by every
//! `*_id` file column: collect multipart parts, validate before the
//! first storage write, then attach / replace / remove rows in
//! `file_uploads` together with their stored objects.

use std::collections::HashMap;

use axum::extract::multipart::Multipart;
use bytes::Bytes;
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{Sqlite, Transaction};

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{CatalogKind, FileUpload, FileUploadResponse, MarketKind};
use crate::storage::StorageProvider;

pub const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "webp"];
pub const PDF_EXTS: &[&str] = &["pdf"];

const MB: i64 = 1024 * 1024;

/// One attachment slot: where its objects live and what it accepts
#[derive(Debug, Clone, Copy)]
pub struct AttachmentKind {
    pub subfolder: &'static str,
    pub allowed_exts: &'static [&'static str],
    pub max_bytes: i64,
}

pub const PRODUCT_THUMBNAIL: AttachmentKind = AttachmentKind {
    subfolder: "product-thumbnail",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

pub const SERVICE_THUMBNAIL: AttachmentKind = AttachmentKind {
    subfolder: "service-thumbnail",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

pub const PRODUCT_MEDIA: AttachmentKind = AttachmentKind {
    subfolder: "product-media",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

pub const SERVICE_MEDIA: AttachmentKind = AttachmentKind {
    subfolder: "service-media",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

pub const PRODUCT_USER_MANUAL: AttachmentKind = AttachmentKind {
    subfolder: "product-user-manual",
    allowed_exts: PDF_EXTS,
    max_bytes: MB,
};

pub const SERVICE_USER_MANUAL: AttachmentKind = AttachmentKind {
    subfolder: "service-user-manual",
    allowed_exts: PDF_EXTS,
    max_bytes: MB,
};

pub const MANUFACTURER_LOGO: AttachmentKind = AttachmentKind {
    subfolder: "manufacturer-logo",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

pub const MANUFACTURER_PROFILE_FILE: AttachmentKind = AttachmentKind {
    subfolder: "manufacturer-profile-file",
    allowed_exts: PDF_EXTS,
    max_bytes: 2 * MB,
};

pub const HEALTHCARE_LOGO: AttachmentKind = AttachmentKind {
    subfolder: "healthcare-logo",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

pub const NEWS_IMAGE: AttachmentKind = AttachmentKind {
    subfolder: "news-image",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

pub const GOV_AFFAIR_IMAGE: AttachmentKind = AttachmentKind {
    subfolder: "gov-affair-image",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

pub const REGULATION_SERVICE_IMAGE: AttachmentKind = AttachmentKind {
    subfolder: "regulation-service-image",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

pub const MARKETING_SERVICE_IMAGE: AttachmentKind = AttachmentKind {
    subfolder: "marketing-service-image",
    allowed_exts: IMAGE_EXTS,
    max_bytes: MB,
};

const fn assessment_doc(subfolder: &'static str) -> AttachmentKind {
    AttachmentKind {
        subfolder,
        allowed_exts: PDF_EXTS,
        max_bytes: 2 * MB,
    }
}

pub const ASSESSMENT_IMPORTER_LICENSE: AttachmentKind =
    assessment_doc("regulation-assessment/importer-license");
pub const ASSESSMENT_WHOLESALER_LICENSE: AttachmentKind =
    assessment_doc("regulation-assessment/wholesaler-license");
pub const ASSESSMENT_MANUFACTURER_LICENSE: AttachmentKind =
    assessment_doc("regulation-assessment/manufacturer-license");
pub const ASSESSMENT_MEDICAL_LICENSE: AttachmentKind =
    assessment_doc("regulation-assessment/medical-license");
pub const ASSESSMENT_TESTING_REPORT: AttachmentKind =
    assessment_doc("regulation-assessment/testing-report");
pub const ASSESSMENT_USER_MANUAL: AttachmentKind =
    assessment_doc("regulation-assessment/user-manual");

/// Multipart field name, parent FK column and slot of each regulation
/// assessment document.
pub const ASSESSMENT_DOCS: &[(&str, &str, &AttachmentKind)] = &[
    ("importer_license", "importer_license_id", &ASSESSMENT_IMPORTER_LICENSE),
    ("wholesaler_license", "wholesaler_license_id", &ASSESSMENT_WHOLESALER_LICENSE),
    ("manufacturer_license", "manufacturer_license_id", &ASSESSMENT_MANUFACTURER_LICENSE),
    ("medical_license", "medical_license_id", &ASSESSMENT_MEDICAL_LICENSE),
    ("testing_report", "testing_report_id", &ASSESSMENT_TESTING_REPORT),
    ("user_manual", "user_manual_id", &ASSESSMENT_USER_MANUAL),
];

pub fn catalog_thumbnail(kind: CatalogKind) -> &'static AttachmentKind {
    match kind {
        CatalogKind::Product => &PRODUCT_THUMBNAIL,
        CatalogKind::Service => &SERVICE_THUMBNAIL,
    }
}

pub fn catalog_media(kind: CatalogKind) -> &'static AttachmentKind {
    match kind {
        CatalogKind::Product => &PRODUCT_MEDIA,
        CatalogKind::Service => &SERVICE_MEDIA,
    }
}

pub fn catalog_manual(kind: CatalogKind) -> &'static AttachmentKind {
    match kind {
        CatalogKind::Product => &PRODUCT_USER_MANUAL,
        CatalogKind::Service => &SERVICE_USER_MANUAL,
    }
}

pub fn market_image(kind: MarketKind) -> &'static AttachmentKind {
    match kind {
        MarketKind::Regulation => &REGULATION_SERVICE_IMAGE,
        MarketKind::Marketing => &MARKETING_SERVICE_IMAGE,
    }
}

/// One file part of a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Lowercased extension of the client-supplied filename
    pub fn extname(&self) -> String {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    pub fn size(&self) -> i64 {
        self.bytes.len() as i64
    }
}

/// Collected multipart body: text fields by name plus file parts.
/// Repeated file fields (e.g. `images`) keep every part.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            if let Some(filename) = field.file_name() {
                let filename = filename.to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                form.files.push(UploadedFile {
                    field: name,
                    filename,
                    content_type,
                    bytes,
                });
            } else {
                let value = field.text().await.map_err(bad_multipart)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str()).filter(|s| !s.is_empty())
    }

    pub fn require_text(&self, name: &str) -> Result<&str> {
        self.text(name)
            .ok_or_else(|| AppError::field(name, &format!("{name} is required")))
    }

    pub fn bool_field(&self, name: &str) -> Result<Option<bool>> {
        match self.text(name).map(|s| s.trim()) {
            None => Ok(None),
            Some("true") | Some("1") => Ok(Some(true)),
            Some("false") | Some("0") => Ok(Some(false)),
            Some(_) => Err(AppError::field(name, &format!("{name} must be a boolean"))),
        }
    }

    pub fn i64_field(&self, name: &str) -> Result<Option<i64>> {
        match self.text(name).map(|s| s.trim()) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::field(name, &format!("{name} must be a number"))),
        }
    }

    /// Comma separated id list field (`"1,2,3"`)
    pub fn id_list(&self, name: &str) -> Result<Vec<i64>> {
        match self.text(name) {
            None => Ok(Vec::new()),
            Some(raw) => parse_id_csv(raw)
                .ok_or_else(|| AppError::field(name, &format!("{name} must be a list of ids"))),
        }
    }

    /// JSON-encoded text field holding a structured collection
    pub fn json_field<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|_| AppError::field(name, &format!("{name} must be valid JSON"))),
        }
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == name)
    }

    pub fn file_list(&self, name: &str) -> Vec<&UploadedFile> {
        self.files.iter().filter(|f| f.field == name).collect()
    }

    /// All file parts, consumed. Used where the slot a file fills is
    /// decided by its field name downstream.
    pub fn into_files(self) -> Vec<UploadedFile> {
        self.files
    }
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", e))
}

/// Parses `"1,2,3"`; None when any entry is not an integer
pub fn parse_id_csv(raw: &str) -> Option<Vec<i64>> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

/// A validated upload written to storage, not yet attached to a row
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub key: String,
    pub extname: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub url: String,
}

/// Checks extension and size against the slot before anything is
/// written. Failures carry the multipart field name.
pub fn validate(kind: &AttachmentKind, upload: &UploadedFile) -> Result<()> {
    let ext = upload.extname();
    if !kind.allowed_exts.contains(&ext.as_str()) {
        return Err(AppError::field(
            &upload.field,
            &format!(
                "Invalid file extension {}. Only {} are allowed",
                ext,
                kind.allowed_exts.join(", ")
            ),
        ));
    }
    if upload.size() > kind.max_bytes {
        return Err(AppError::field(
            &upload.field,
            &format!("File size should be less than {}mb", kind.max_bytes / MB),
        ));
    }
    Ok(())
}

/// Writes the object under a fresh random key and returns the row
/// fields for it. Validation runs again here so a missed earlier
/// check cannot slip an oversized object through.
pub async fn store(
    storage: &dyn StorageProvider,
    base_url: &str,
    kind: &AttachmentKind,
    upload: &UploadedFile,
) -> Result<StoredFile> {
    validate(kind, upload)?;

    let ext = upload.extname();
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase();
    let key = format!("{}/{}.{}", kind.subfolder, stem, ext);
    let path = format!("/uploads/{}", key);
    let url = format!("{}{}", base_url, path);

    storage.put(&key, upload.bytes.clone()).await?;

    Ok(StoredFile {
        key,
        extname: ext,
        mime_type: upload.content_type.clone(),
        size: upload.size(),
        path,
        url,
    })
}

/// Absent -> Present: inserts the `file_uploads` row, returns its id
/// for the parent FK column.
pub async fn attach(tx: &mut Transaction<'_, Sqlite>, file: &StoredFile) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO file_uploads (name, extname, mime_type, size, path, url) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&file.key)
    .bind(&file.extname)
    .bind(&file.mime_type)
    .bind(file.size)
    .bind(&file.path)
    .bind(&file.url)
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Present -> Present': the row keeps its id, the old object goes
/// away. Falls back to attach when the slot was empty.
pub async fn replace(
    tx: &mut Transaction<'_, Sqlite>,
    storage: &dyn StorageProvider,
    existing_id: Option<i64>,
    file: &StoredFile,
) -> Result<i64> {
    let Some(id) = existing_id else {
        return attach(tx, file).await;
    };

    let old: Option<(String,)> = sqlx::query_as("SELECT name FROM file_uploads WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    let Some((old_key,)) = old else {
        return attach(tx, file).await;
    };

    if old_key != file.key {
        storage.delete(&old_key).await?;
    }

    sqlx::query(
        "UPDATE file_uploads SET name = ?, extname = ?, mime_type = ?, size = ?, path = ?, url = ?, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(&file.key)
    .bind(&file.extname)
    .bind(&file.mime_type)
    .bind(file.size)
    .bind(&file.path)
    .bind(&file.url)
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(id)
}

/// Present -> Absent: removes the row and its stored object. Missing
/// rows are fine, the slot may already be empty.
pub async fn remove(db: &Database, storage: &dyn StorageProvider, file_id: i64) -> Result<()> {
    let row: Option<(String,)> = sqlx::query_as("SELECT name FROM file_uploads WHERE id = ?")
        .bind(file_id)
        .fetch_optional(db.pool())
        .await?;
    let Some((key,)) = row else {
        return Ok(());
    };

    sqlx::query("DELETE FROM file_uploads WHERE id = ?")
        .bind(file_id)
        .execute(db.pool())
        .await?;
    storage.delete(&key).await?;
    Ok(())
}

/// Loads a slot's row as its response shape; None for empty slots
pub async fn load_file(db: &Database, id: Option<i64>) -> Result<Option<FileUploadResponse>> {
    let Some(id) = id else { return Ok(None) };
    let file: Option<FileUpload> = sqlx::query_as("SELECT * FROM file_uploads WHERE id = ?")
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    Ok(file.map(FileUploadResponse::from))
}

/// Recovers the storage key from a persisted public URL
pub fn object_key(url: &str) -> Option<&str> {
    url.split_once("/uploads/").map(|(_, key)| key)
}
