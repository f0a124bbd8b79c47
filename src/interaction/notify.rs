//! Transient banners and the file preview overlay.

use std::time::Duration;

use tracing::debug;

use crate::interaction::{
    dom::{Document, NodeId, Selector},
    scheduler::{Scheduler, Task},
    validation::FileKind,
};

const NOTIFICATION: Selector<'static> = Selector::Class("notification");
const CLOSE_NOTIFICATION: Selector<'static> = Selector::Class("close-notification");
const MODAL: Selector<'static> = Selector::Class("file-modal");
const CLOSE_MODAL: Selector<'static> = Selector::Class("close-modal");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Success => "check-circle",
            Severity::Error => "exclamation-circle",
            Severity::Info => "info-circle",
        }
    }
}

/// A banner that was put on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub node: NodeId,
    pub message: String,
    pub severity: Severity,
    pub created_at: Duration,
}

/// Appends a banner to the body and schedules its removal after `ttl`.
pub fn show_notification<S: Scheduler>(
    doc: &mut Document,
    scheduler: &mut S,
    ttl: Duration,
    message: &str,
    severity: Severity,
) -> Notification {
    let body = doc.body();
    let severity_class = format!("notification-{}", severity.as_str());
    let banner = doc.append_new(body, "div", &["notification", severity_class.as_str()]);

    let icon_class = format!("fa-{}", severity.icon());
    doc.append_new(banner, "i", &["fas", icon_class.as_str()]);
    let text = doc.append_new(banner, "span", &[]);
    doc.set_text(text, message);
    let close = doc.append_new(banner, "button", &["close-notification"]);
    doc.append_new(close, "i", &["fas", "fa-times"]);

    scheduler.schedule(ttl, Task::ExpireNotification { notification: banner });
    debug!(severity = severity.as_str(), message, "notification shown");

    Notification {
        node: banner,
        message: message.to_string(),
        severity,
        created_at: scheduler.now(),
    }
}

/// Removes an expired banner. A banner that was already dismissed is left alone.
pub fn expire_notification(doc: &mut Document, notification: NodeId) -> bool {
    doc.is_connected(notification) && doc.remove(notification)
}

/// Appends a full-screen overlay showing the file at `url`.
pub fn show_preview(doc: &mut Document, url: &str, kind: FileKind) -> NodeId {
    let body = doc.body();
    let modal = doc.append_new(body, "div", &["file-modal"]);
    let content = doc.append_new(modal, "div", &["modal-content"]);
    let close = doc.append_new(content, "button", &["close-modal"]);
    doc.append_new(close, "i", &["fas", "fa-times"]);
    let modal_body = doc.append_new(content, "div", &["modal-body"]);

    match kind {
        FileKind::Image => {
            let img = doc.append_new(modal_body, "img", &[]);
            doc.set_attribute(img, "src", url);
            doc.set_attribute(img, "alt", "Preview");
            doc.set_style(img, "max-width", "100%");
            doc.set_style(img, "max-height", "80vh");
        }
        FileKind::Video => {
            let video = doc.append_new(modal_body, "video", &[]);
            doc.set_attribute(video, "controls", "");
            doc.set_style(video, "max-width", "100%");
            doc.set_style(video, "max-height", "80vh");
            doc.set_text(video, "Your browser does not support the video tag.");
            let source = doc.append_new(video, "source", &[]);
            doc.set_attribute(source, "src", url);
            doc.set_attribute(source, "type", "video/mp4");
        }
    }

    debug!(url, kind = kind.as_str(), "preview opened");
    modal
}

/// Handles clicks on close buttons and on the bare overlay.
///
/// Returns true when something was dismissed.
pub fn dismiss_on_click(doc: &mut Document, target: NodeId) -> bool {
    if doc.closest(target, &CLOSE_NOTIFICATION).is_some() {
        if let Some(banner) = doc.closest(target, &NOTIFICATION) {
            return doc.remove(banner);
        }
    }
    if doc.closest(target, &CLOSE_MODAL).is_some() {
        if let Some(modal) = doc.closest(target, &MODAL) {
            return doc.remove(modal);
        }
    }
    if doc.matches(target, &MODAL) {
        return doc.remove(target);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::scheduler::VirtualScheduler;

    const TTL: Duration = Duration::from_millis(5000);

    #[test]
    fn banner_structure_follows_severity() {
        let mut doc = Document::new();
        let mut scheduler = VirtualScheduler::new();
        let shown = show_notification(&mut doc, &mut scheduler, TTL, "Saved", Severity::Success);

        assert!(doc.has_class(shown.node, "notification-success"));
        assert_eq!(doc.text_content(shown.node), "Saved");
        let body = doc.body();
        assert!(doc.query(body, &Selector::Class("fa-check-circle")).is_some());
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn default_severity_is_info() {
        assert_eq!(Severity::default(), Severity::Info);
        assert_eq!(Severity::default().icon(), "info-circle");
    }

    #[test]
    fn banners_coexist() {
        let mut doc = Document::new();
        let mut scheduler = VirtualScheduler::new();
        show_notification(&mut doc, &mut scheduler, TTL, "one", Severity::Info);
        show_notification(&mut doc, &mut scheduler, TTL, "one", Severity::Info);
        let body = doc.body();
        assert_eq!(doc.query_all(body, &NOTIFICATION).len(), 2);
    }

    #[test]
    fn expiry_after_dismissal_is_a_no_op() {
        let mut doc = Document::new();
        let mut scheduler = VirtualScheduler::new();
        let shown = show_notification(&mut doc, &mut scheduler, TTL, "bye", Severity::Error);
        let body = doc.body();
        let close = doc.query(body, &CLOSE_NOTIFICATION).expect("close button");

        assert!(dismiss_on_click(&mut doc, close));
        assert!(!expire_notification(&mut doc, shown.node));
    }

    #[test]
    fn image_preview_closes_on_overlay_but_not_content() {
        let mut doc = Document::new();
        let modal = show_preview(&mut doc, "/uploads/1.png", FileKind::Image);
        let body = doc.body();
        let img = doc.query(modal, &Selector::Tag("img")).expect("img");
        assert_eq!(doc.attribute(img, "src"), Some("/uploads/1.png"));
        assert_eq!(doc.attribute(img, "alt"), Some("Preview"));

        let content = doc.query(modal, &Selector::Class("modal-content")).expect("content");
        assert!(!dismiss_on_click(&mut doc, content));
        assert!(!dismiss_on_click(&mut doc, img));
        assert!(doc.is_connected(modal));

        assert!(dismiss_on_click(&mut doc, modal));
        assert!(doc.query(body, &MODAL).is_none());
    }

    #[test]
    fn video_preview_closes_on_button() {
        let mut doc = Document::new();
        let modal = show_preview(&mut doc, "/uploads/2.mp4", FileKind::Video);
        let source = doc.query(modal, &Selector::Tag("source")).expect("source");
        assert_eq!(doc.attribute(source, "type"), Some("video/mp4"));

        let icon = doc
            .query(modal, &Selector::Class("fa-times"))
            .expect("close icon");
        assert!(dismiss_on_click(&mut doc, icon));
        assert!(!doc.is_connected(modal));
    }

    #[test]
    fn previews_stack_independently() {
        let mut doc = Document::new();
        let first = show_preview(&mut doc, "/a.png", FileKind::Image);
        let second = show_preview(&mut doc, "/b.png", FileKind::Image);
        assert!(dismiss_on_click(&mut doc, second));
        assert!(doc.is_connected(first));
    }
}
