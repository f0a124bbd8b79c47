//! Pure predicates behind file intake and form validation.
//!
//! Nothing here touches the document, so the same rules back the browser-side
//! controller and the upload endpoint.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

/// MIME types accepted by the upload area.
pub const ALLOWED_MIME_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "video/mp4",
    "video/avi",
    "video/mov",
];

/// Largest accepted upload, 10 MiB inclusive.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+]?[1-9][0-9]{0,15}$").expect("phone pattern compiles"));

/// A file handed to the page by the chooser, a drop, or a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
}

impl FileKind {
    /// Anything that is not an image is presented as a video.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            FileKind::Image
        } else {
            FileKind::Video
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Video => "video",
        }
    }
}

/// Why a selected file was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRejection {
    UnsupportedType,
    TooLarge,
}

impl FileRejection {
    pub fn message(&self) -> &'static str {
        match self {
            FileRejection::UnsupportedType => "Please select a valid image or video file.",
            FileRejection::TooLarge => "File size must be less than 10MB.",
        }
    }

    /// Short code used in redirect query strings.
    pub fn code(&self) -> &'static str {
        match self {
            FileRejection::UnsupportedType => "invalid_type",
            FileRejection::TooLarge => "too_large",
        }
    }
}

impl fmt::Display for FileRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for FileRejection {}

pub fn is_allowed_type(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

pub fn is_within_size_limit(size: u64) -> bool {
    size <= MAX_FILE_SIZE
}

/// Type is checked before size, so an oversized PDF reports the type problem.
pub fn validate_file(file: &SelectedFile) -> Result<FileKind, FileRejection> {
    if !is_allowed_type(&file.mime) {
        return Err(FileRejection::UnsupportedType);
    }
    if !is_within_size_limit(file.size) {
        return Err(FileRejection::TooLarge);
    }
    Ok(FileKind::from_mime(&file.mime))
}

/// Human-readable size with binary units, e.g. `1.5 KB`.
///
/// The value is rounded to two decimals and trailing zeros are dropped.
/// Sizes of a terabyte and above stay in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor: u64 = 1;
    while unit < SIZE_UNITS.len() - 1 && bytes / divisor >= 1024 {
        divisor *= 1024;
        unit += 1;
    }

    let value = bytes as f64 / divisor as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", SIZE_UNITS[unit])
}

pub fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Whitespace is ignored, so `+1 555 123 4567` is accepted.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_PATTERN.is_match(&compact)
}

/// How a form control is checked beyond the required rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    Email,
    Phone,
}

impl FieldKind {
    /// Only `<input>` elements get format checks, keyed by their `type`.
    pub fn from_input(tag: &str, input_type: Option<&str>) -> Self {
        if !tag.eq_ignore_ascii_case("input") {
            return FieldKind::Plain;
        }
        match input_type.map(str::to_ascii_lowercase).as_deref() {
            Some("email") => FieldKind::Email,
            Some("tel") => FieldKind::Phone,
            _ => FieldKind::Plain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    InvalidEmail,
    InvalidPhone,
}

impl FieldError {
    pub fn message(&self) -> &'static str {
        match self {
            FieldError::Required => "This field is required",
            FieldError::InvalidEmail => "Please enter a valid email address.",
            FieldError::InvalidPhone => "Please enter a valid phone number.",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// First rule the value breaks, if any. Empty optional fields always pass.
pub fn check_field(kind: FieldKind, required: bool, value: &str) -> Option<FieldError> {
    if required && !is_filled(value) {
        return Some(FieldError::Required);
    }
    match kind {
        FieldKind::Email if !value.is_empty() && !is_valid_email(value) => {
            Some(FieldError::InvalidEmail)
        }
        FieldKind::Phone if is_filled(value) && !is_valid_phone(value) => {
            Some(FieldError::InvalidPhone)
        }
        _ => None,
    }
}
