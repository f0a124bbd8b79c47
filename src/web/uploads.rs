use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use axum::extract::Multipart;
use chrono::{DateTime, Utc};
use mime::Mime;
use serde::Serialize;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};
use tracing::{info, warn};

use crate::interaction::validation::{
    FileKind, FileRejection, MAX_FILE_SIZE, SelectedFile, format_file_size, validate_file,
};

/// Name of the multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";
pub const NO_FILE_MESSAGE: &str = "No file selected!";

/// Result type used by the upload helpers.
pub type UploadResult<T> = Result<T, UploadError>;

/// Error returned when validating or persisting an uploaded file.
///
/// `code` travels back to the page as `?error=<code>`.
#[derive(Debug)]
pub struct UploadError {
    code: &'static str,
    message: String,
}

impl UploadError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn no_file() -> Self {
        Self::new("no_file", NO_FILE_MESSAGE)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new("upload_failed", message)
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UploadError {}

impl From<FileRejection> for UploadError {
    fn from(rejection: FileRejection) -> Self {
        Self::new(rejection.code(), rejection.message())
    }
}

/// A file sitting in the upload directory.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredUpload {
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub kind: FileKind,
    pub url: String,
    pub modified_at: Option<String>,
}

impl StoredUpload {
    fn new(name: String, size: u64, modified_at: Option<DateTime<Utc>>) -> Self {
        Self {
            kind: FileKind::from_mime(content_type_for(&name).essence_str()),
            url: format!("/uploads/{name}"),
            size_label: format_file_size(size),
            modified_at: modified_at.map(|at| at.to_rfc3339()),
            name,
            size,
        }
    }
}

/// Ensures the destination directory exists.
pub async fn ensure_directory(path: &Path) -> UploadResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| UploadError::storage(format!("could not create upload directory: {err}")))
}

/// True for bare file names that cannot escape the upload directory.
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && sanitize_filename::sanitize(name) == name
}

pub fn content_type_for(name: &str) -> Mime {
    mime_guess::from_path(name).first_or_octet_stream()
}

/// Lowercased, sanitized extension of the client-side file name.
fn extension_of(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    sanitize_filename::sanitize(extension).to_ascii_lowercase()
}

fn stored_name(number: usize, extension: &str) -> String {
    if extension.is_empty() {
        number.to_string()
    } else {
        format!("{number}.{extension}")
    }
}

fn sequence_of(name: &str) -> Option<u64> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    stem.parse().ok()
}

/// Lists stored uploads, numbered files first in numeric order.
///
/// A missing directory lists as empty.
pub async fn list_uploads(dir: &Path) -> UploadResult<Vec<StoredUpload>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(UploadError::storage(format!(
                "could not read upload directory: {err}"
            )));
        }
    };

    let mut uploads = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| UploadError::storage(format!("could not read upload directory: {err}")))?
    {
        let metadata = match entry.metadata().await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(err) => {
                warn!(?err, path = %entry.path().display(), "skipping unreadable upload");
                continue;
            }
        };
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let modified_at = metadata.modified().ok().map(DateTime::<Utc>::from);
        uploads.push(StoredUpload::new(name, metadata.len(), modified_at));
    }

    uploads.sort_by_key(|upload| {
        (
            sequence_of(&upload.name).unwrap_or(u64::MAX),
            upload.name.clone(),
        )
    });
    Ok(uploads)
}

/// Creates `<n>.<ext>` where `n` is one more than the number of stored files,
/// stepping past names that are already taken.
async fn create_numbered(dir: &Path, extension: &str) -> UploadResult<(String, PathBuf, File)> {
    let mut number = list_uploads(dir).await?.len() + 1;
    loop {
        let name = stored_name(number, extension);
        let path = dir.join(&name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((name, path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => number += 1,
            Err(err) => {
                return Err(UploadError::storage(format!("could not save file: {err}")));
            }
        }
    }
}

/// Reserves the next name under `numbering` and returns with the lock
/// released, so concurrent uploads only queue for the allocation itself.
async fn allocate_numbered(
    dir: &Path,
    extension: &str,
    numbering: &Mutex<()>,
) -> UploadResult<(String, PathBuf, File)> {
    let _guard = numbering.lock().await;
    create_numbered(dir, extension).await
}

/// Deletes a stored upload. Returns `false` when nothing by that name exists.
pub async fn remove_upload(dir: &Path, name: &str) -> UploadResult<bool> {
    if !is_plain_name(name) {
        return Ok(false);
    }
    let path = dir.join(name);
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => return Ok(false),
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => {
            return Err(UploadError::storage(format!("could not inspect file: {err}")));
        }
    }
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            info!(file = %name, "upload deleted");
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(UploadError::storage(format!("could not delete file: {err}"))),
    }
}

/// Streams bytes to disk and refuses to grow past `limit`.
pub struct LimitedWriter {
    file: File,
    path: PathBuf,
    written: u64,
    limit: u64,
}

impl LimitedWriter {
    pub fn new(file: File, path: PathBuf, limit: u64) -> Self {
        Self {
            file,
            path,
            written: 0,
            limit,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Removes the partial file when the chunk would exceed the limit.
    pub async fn write(&mut self, chunk: &[u8]) -> UploadResult<()> {
        self.written += chunk.len() as u64;
        if self.written > self.limit {
            self.discard().await;
            return Err(FileRejection::TooLarge.into());
        }
        if let Err(err) = self.file.write_all(chunk).await {
            self.discard().await;
            return Err(UploadError::storage(format!("could not write file: {err}")));
        }
        Ok(())
    }

    pub async fn finish(mut self) -> UploadResult<u64> {
        self.file
            .flush()
            .await
            .map_err(|err| UploadError::storage(format!("could not flush file: {err}")))?;
        Ok(self.written)
    }

    pub async fn discard(&mut self) {
        if let Err(err) = tokio::fs::remove_file(&self.path).await {
            if err.kind() != ErrorKind::NotFound {
                warn!(?err, path = %self.path.display(), "failed to remove partial upload");
            }
        }
    }
}

/// Reads the single `file` field, validates it and stores it under `dir`.
///
/// `numbering` serializes name allocation between concurrent uploads.
pub async fn receive_upload(
    mut multipart: Multipart,
    dir: &Path,
    numbering: &Mutex<()>,
) -> UploadResult<StoredUpload> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::storage(format!("could not parse upload form: {err}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        if original.is_empty() {
            return Err(UploadError::no_file());
        }
        let mime = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for(&original).essence_str().to_string());
        // Size is enforced while streaming.
        validate_file(&SelectedFile::new(original.as_str(), mime.as_str(), 0))?;

        ensure_directory(dir).await?;
        let (name, path, file) =
            allocate_numbered(dir, &extension_of(&original), numbering).await?;
        let mut writer = LimitedWriter::new(file, path, MAX_FILE_SIZE);

        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => {
                    writer.discard().await;
                    return Err(UploadError::storage(format!(
                        "could not read upload data: {err}"
                    )));
                }
            };
            if let Err(err) = writer.write(&chunk).await {
                // The body limit bounds what is left; reading it lets the client see the redirect.
                while let Ok(Some(_)) = field.chunk().await {}
                return Err(err);
            }
        }

        if writer.written() == 0 {
            writer.discard().await;
            return Err(UploadError::no_file());
        }
        let size = writer.finish().await?;
        info!(%original, stored = %name, size, "upload stored");
        return Ok(StoredUpload::new(name, size, Some(Utc::now())));
    }

    Err(UploadError::no_file())
}
