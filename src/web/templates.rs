use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::{
    config::InteractionConfig,
    interaction::{
        forms::FORM_INVALID_MESSAGE,
        notify::Severity,
        validation::{
            ALLOWED_MIME_TYPES, FieldError, FileRejection, MAX_FILE_SIZE, format_file_size,
        },
    },
    web::uploads::StoredUpload,
};

/// Browser glue for the upload page; reads its settings from `#upload-config`.
pub const UPLOAD_PAGE_SCRIPT: &str = concat!(
    "<script>\n",
    include_str!("upload_page.js"),
    "\n</script>",
);

const PAGE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #ffffff; padding: 1.25rem 1.5rem; border-bottom: 1px solid #e2e8f0; display: flex; justify-content: space-between; align-items: center; }
        header h1 { margin: 0; font-size: 1.5rem; }
        .mobile-menu-btn { display: none; background: none; border: none; font-size: 1.25rem; cursor: pointer; color: #0f172a; }
        .mobile-menu { display: flex; gap: 1rem; }
        .mobile-menu a { color: #1d4ed8; text-decoration: none; font-weight: 600; }
        main { padding: 2rem 1.5rem; max-width: 960px; margin: 0 auto; box-sizing: border-box; }
        .card { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); margin-bottom: 2rem; transition: transform 0.2s ease, opacity 0.4s ease; }
        html.js .card:not(.animate-fade-in) { opacity: 0; transform: translateY(12px); }
        .card h2 { margin-top: 0; }
        .upload-area { border: 2px dashed #cbd5f5; border-radius: 12px; padding: 2.5rem 1.5rem; text-align: center; background: #f8fafc; color: #475569; cursor: pointer; transition: border-color 0.2s ease, background 0.2s ease; }
        .upload-area.dragover { border-color: #2563eb; background: #e0f2fe; }
        .upload-area i { font-size: 2.5rem; color: #2563eb; }
        .upload-hint { font-size: 0.85rem; color: #64748b; }
        html.js #file-input, html.js .upload-submit { display: none; }
        .upload-submit { margin-top: 1rem; }
        .file-info { margin-top: 1rem; color: #475569; }
        .file-preview { display: flex; align-items: center; gap: 0.75rem; }
        .file-icon { font-size: 2rem; }
        .file-icon.image { color: #16a34a; }
        .file-icon.video { color: #9333ea; }
        .file-name { font-weight: 600; margin: 0; word-break: break-all; }
        .file-size { margin: 0; color: #64748b; font-size: 0.9rem; }
        .btn { display: inline-flex; align-items: center; gap: 0.4rem; padding: 0.55rem 1rem; border-radius: 8px; background: #2563eb; color: #ffffff; text-decoration: none; border: none; font-weight: 600; cursor: pointer; transition: transform 0.15s ease, background 0.15s ease; }
        .btn:hover { background: #1d4ed8; }
        .btn.delete-upload { background: #dc2626; }
        .btn.delete-upload:hover { background: #b91c1c; }
        .search-input { width: 100%; padding: 0.75rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; box-sizing: border-box; margin-bottom: 1rem; }
        .file-list { display: flex; flex-direction: column; gap: 0.5rem; }
        .file-item { display: flex; align-items: center; gap: 0.75rem; padding: 0.65rem 0.85rem; border: 1px solid #e2e8f0; border-radius: 8px; transition: transform 0.15s ease; }
        .file-item .file-name { flex: 1; min-width: 0; }
        .empty { color: #94a3b8; }
        .error { border-color: #dc2626 !important; }
        .field-error { color: #dc2626; font-size: 0.85rem; margin-top: 0.25rem; }
        .notification { position: fixed; top: 1rem; right: 1rem; display: flex; align-items: center; gap: 0.6rem; padding: 0.85rem 1.1rem; border-radius: 10px; background: #e0f2fe; color: #0f172a; box-shadow: 0 12px 30px rgba(15, 23, 42, 0.12); z-index: 1000; }
        .notification + .notification { top: 4.5rem; }
        .notification-success { background: #dcfce7; color: #166534; }
        .notification-error { background: #fee2e2; color: #b91c1c; }
        .close-notification { background: none; border: none; cursor: pointer; color: inherit; }
        .file-modal { position: fixed; inset: 0; background: rgba(15, 23, 42, 0.75); display: flex; align-items: center; justify-content: center; z-index: 1100; }
        .modal-content { background: #ffffff; border-radius: 12px; padding: 1rem; position: relative; max-width: 90vw; }
        .close-modal { position: absolute; top: 0.5rem; right: 0.5rem; background: none; border: none; font-size: 1.25rem; cursor: pointer; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
        @media (max-width: 768px) {
            .mobile-menu-btn { display: block; }
            .mobile-menu { display: none; position: absolute; top: 4rem; right: 1rem; flex-direction: column; background: #ffffff; padding: 1rem; border-radius: 8px; border: 1px solid #e2e8f0; }
            .mobile-menu.active { display: flex; }
            main { padding: 1.5rem 1rem; }
        }
"#;

const FONT_AWESOME: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css";

/// A one-shot message shown above the upload card after a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub severity: Severity,
    pub message: String,
}

impl Flash {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            r#"<div class="notification notification-{kind}"><i class="fas fa-{icon}"></i><span>{message}</span><button class="close-notification" type="button"><i class="fas fa-times"></i></button></div>"#,
            kind = self.severity.as_str(),
            icon = self.severity.icon(),
            message = escape_html(&self.message),
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageMessages {
    invalid_type: &'static str,
    too_large: &'static str,
    required: &'static str,
    invalid_email: &'static str,
    invalid_phone: &'static str,
    form_invalid: &'static str,
}

/// Settings handed to the browser script, mirroring the controller's rules.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageConfig {
    allowed_types: &'static [&'static str],
    max_file_size: u64,
    auto_submit_delay_ms: u128,
    notification_ttl_ms: u128,
    messages: PageMessages,
}

impl PageConfig {
    fn new(interaction: &InteractionConfig) -> Self {
        Self {
            allowed_types: &ALLOWED_MIME_TYPES,
            max_file_size: MAX_FILE_SIZE,
            auto_submit_delay_ms: interaction.auto_submit_delay.as_millis(),
            notification_ttl_ms: interaction.notification_ttl.as_millis(),
            messages: PageMessages {
                invalid_type: FileRejection::UnsupportedType.message(),
                too_large: FileRejection::TooLarge.message(),
                required: FieldError::Required.message(),
                invalid_email: FieldError::InvalidEmail.message(),
                invalid_phone: FieldError::InvalidPhone.message(),
                form_invalid: FORM_INVALID_MESSAGE,
            },
        }
    }
}

/// JSON for a `<script type="application/json">` block; `</` is escaped so the
/// payload cannot close the element.
fn render_page_config(interaction: &InteractionConfig) -> String {
    let json = serde_json::to_string(&PageConfig::new(interaction))
        .unwrap_or_else(|_| "{}".to_string());
    json.replace("</", "<\\/")
}

pub fn render_upload_page(uploads: &[StoredUpload], flash: Option<&Flash>) -> String {
    let flash_html = flash.map(Flash::render).unwrap_or_default();
    let page_config = render_page_config(&InteractionConfig::default());
    let listing_html = render_listing(uploads);
    let footer = render_footer();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>iCapture</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <script>document.documentElement.classList.add('js');</script>
    <link rel="stylesheet" href="{font_awesome}">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <h1><i class="fas fa-camera"></i> iCapture</h1>
        <button class="mobile-menu-btn" type="button" aria-label="Menu"><i class="fas fa-bars"></i></button>
        <nav class="mobile-menu">
            <a href="/">Upload</a>
            <a href="/api/uploads">API</a>
        </nav>
    </header>
    <main>
        {flash_html}
        <section class="card">
            <h2>Upload a photo or video</h2>
            <form method="post" action="/upload" enctype="multipart/form-data">
                <div class="upload-area">
                    <i class="fas fa-cloud-upload-alt"></i>
                    <p>Drag &amp; drop a file here, or click to browse</p>
                    <p class="upload-hint">JPEG, PNG, GIF, MP4, AVI or MOV up to {limit}</p>
                    <input type="file" id="file-input" name="file" accept="image/*,video/*" required>
                </div>
                <div class="file-info">No file selected</div>
                <button class="btn upload-submit" type="submit"><i class="fas fa-upload"></i> Upload</button>
            </form>
        </section>
        <section class="card">
            <h2>Your uploads</h2>
            <input type="text" class="search-input" placeholder="Search uploads">
            {listing_html}
        </section>
        {footer}
    </main>
    <script id="upload-config" type="application/json">{page_config}</script>
    {script}
</body>
</html>"#,
        font_awesome = FONT_AWESOME,
        styles = PAGE_STYLES,
        flash_html = flash_html,
        limit = format_file_size(MAX_FILE_SIZE),
        listing_html = listing_html,
        footer = footer,
        page_config = page_config,
        script = UPLOAD_PAGE_SCRIPT,
    )
}

fn render_listing(uploads: &[StoredUpload]) -> String {
    if uploads.is_empty() {
        return r#"<p class="empty">Nothing uploaded yet.</p>"#.to_string();
    }

    let items = uploads
        .iter()
        .map(|upload| {
            format!(
                r#"<div class="file-item searchable-item"><i class="fas fa-{kind} file-icon {kind}"></i><p class="file-name">{name}</p><p class="file-size">{size}</p><a class="btn" href="{url}" target="_blank" rel="noopener"><i class="fas fa-eye"></i> View</a><button class="btn delete-upload" type="button" data-name="{name}"><i class="fas fa-trash"></i> Delete</button></div>"#,
                kind = upload.kind.as_str(),
                name = escape_html(&upload.name),
                size = escape_html(&upload.size_label),
                url = escape_html(&upload.url),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(r#"<div class="file-list">{items}</div>"#)
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(
        r#"<footer class="app-footer">© {year} iCapture</footer>"#,
        year = current_year
    )
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
