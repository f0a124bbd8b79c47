use std::time::Duration;

use super::*;
use crate::interaction::{
    dom::{Rect, Selector},
    validation::MAX_FILE_SIZE,
};

struct Fixture {
    doc: Document,
    area: NodeId,
    input: NodeId,
    info: NodeId,
    upload_form: NodeId,
    profile_form: NodeId,
    name: NodeId,
    email: NodeId,
    phone: NodeId,
    menu_button: NodeId,
    menu_panel: NodeId,
    card: NodeId,
}

/// Mirrors the structure rendered by the upload page template.
fn fixture() -> Fixture {
    let mut doc = Document::new();
    let body = doc.body();

    let header = doc.append_new(body, "header", &[]);
    let menu_button = doc.append_new(header, "button", &["mobile-menu-btn"]);
    let menu_panel = doc.append_new(header, "nav", &["mobile-menu"]);

    let card = doc.append_new(body, "section", &["card"]);
    let upload_form = doc.append_new(card, "form", &[]);
    doc.set_attribute(upload_form, "enctype", "multipart/form-data");
    let area = doc.append_new(upload_form, "div", &["upload-area"]);
    doc.append_new(area, "p", &[]);
    let input = doc.append_new(area, "input", &[]);
    doc.set_attribute(input, "id", "file-input");
    doc.set_attribute(input, "type", "file");
    let info = doc.append_new(upload_form, "div", &["file-info"]);
    doc.set_text(info, "No file selected");

    let profile_form = doc.append_new(body, "form", &[]);
    let name_group = doc.append_new(profile_form, "div", &["form-group"]);
    let name = doc.append_new(name_group, "input", &[]);
    doc.set_attribute(name, "type", "text");
    doc.set_attribute(name, "required", "");
    let email_group = doc.append_new(profile_form, "div", &["form-group"]);
    let email = doc.append_new(email_group, "input", &[]);
    doc.set_attribute(email, "type", "email");
    let phone_group = doc.append_new(profile_form, "div", &["form-group"]);
    let phone = doc.append_new(phone_group, "input", &[]);
    doc.set_attribute(phone, "type", "tel");
    doc.set_attribute(phone, "required", "");

    Fixture {
        doc,
        area,
        input,
        info,
        upload_form,
        profile_form,
        name,
        email,
        phone,
        menu_button,
        menu_panel,
        card,
    }
}

fn page(fixture: &Fixture) -> (Page<VirtualScheduler>, Handles) {
    init(
        fixture.doc.clone(),
        VirtualScheduler::new(),
        InteractionConfig::default(),
    )
}

fn notifications(page: &Page<VirtualScheduler>) -> Vec<NodeId> {
    let doc = page.document();
    doc.query_all(doc.body(), &Selector::Class("notification"))
}

fn field_errors(page: &Page<VirtualScheduler>) -> Vec<NodeId> {
    let doc = page.document();
    doc.query_all(doc.body(), &Selector::Class("field-error"))
}

fn png(size: u64) -> SelectedFile {
    SelectedFile::new("holiday.png", "image/png", size)
}

#[test]
fn init_wires_every_present_behavior() {
    let fx = fixture();
    let (_page, handles) = page(&fx);
    assert!(handles.file_intake.is_some());
    assert!(handles.form_validation.is_some());
    assert!(handles.mobile_menu.is_some());
    assert_eq!(handles.into_vec().len(), 5);
}

#[test]
fn missing_elements_skip_behaviors_silently() {
    let (mut page, handles) = init(
        Document::new(),
        VirtualScheduler::new(),
        InteractionConfig::default(),
    );
    assert!(handles.file_intake.is_none());
    assert!(handles.form_validation.is_none());
    assert!(handles.mobile_menu.is_none());
    assert!(page.init_search().is_none());
    assert_eq!(page.assign_files(vec![png(10)]), None);
}

#[test]
fn accepted_drop_renders_preview_and_submits_after_delay() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    let dispatch = page.dispatch(Event::Drop {
        target: fx.area,
        files: vec![png(1536)],
    });
    assert!(dispatch.default_prevented);

    let doc = page.document();
    assert_eq!(doc.files(fx.input).len(), 1);
    let name = doc.query(fx.info, &Selector::Class("file-name")).expect("name");
    assert_eq!(doc.text_content(name), "holiday.png");
    let size = doc.query(fx.info, &Selector::Class("file-size")).expect("size");
    assert_eq!(doc.text_content(size), "1.5 KB");
    assert!(doc.query(fx.info, &Selector::Class("fa-image")).is_some());

    assert_eq!(page.advance(Duration::from_millis(999)), 0);
    assert!(page.take_effects().is_empty());

    assert_eq!(page.advance(Duration::from_millis(1)), 1);
    assert_eq!(
        page.take_effects(),
        vec![Effect::SubmitForm {
            form: fx.upload_form
        }]
    );
    assert!(page.intake().and_then(UploadIntake::pending).is_none());
}

#[test]
fn disallowed_type_leaves_info_untouched_and_schedules_nothing() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    page.document_mut()
        .set_files(fx.input, vec![SelectedFile::new("notes.pdf", "application/pdf", 100)]);
    page.dispatch(Event::Change { target: fx.input });

    let doc = page.document();
    assert_eq!(doc.text_content(fx.info), "No file selected");
    assert!(doc.query(fx.info, &Selector::Class("file-preview")).is_none());

    let banners = notifications(&page);
    assert_eq!(banners.len(), 1);
    assert!(page.document().has_class(banners[0], "notification-error"));
    assert_eq!(
        page.document().text_content(banners[0]),
        "Please select a valid image or video file."
    );

    // Only the banner expiry is queued.
    assert_eq!(page.scheduler().pending(), 1);
    page.advance(Duration::from_secs(10));
    assert!(page.take_effects().is_empty());
}

#[test]
fn size_limit_is_inclusive_through_the_page() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    let at_limit = page.assign_files(vec![png(MAX_FILE_SIZE)]);
    assert!(matches!(
        at_limit,
        Some(IntakeOutcome::Accepted {
            submission_scheduled: true,
            ..
        })
    ));

    let over = page.assign_files(vec![png(MAX_FILE_SIZE + 1)]);
    assert_eq!(
        over,
        Some(IntakeOutcome::Rejected(
            validation::FileRejection::TooLarge
        ))
    );
    let last = *notifications(&page).last().expect("banner");
    assert_eq!(
        page.document().text_content(last),
        "File size must be less than 10MB."
    );
}

#[test]
fn new_selection_supersedes_pending_submission() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    page.assign_files(vec![png(10)]);
    page.advance(Duration::from_millis(500));
    page.assign_files(vec![SelectedFile::new("clip.mp4", "video/mp4", 20)]);

    // The first timer fires at 1000 ms but belongs to a superseded selection.
    page.advance(Duration::from_millis(500));
    assert!(page.take_effects().is_empty());

    page.advance(Duration::from_millis(500));
    assert_eq!(page.take_effects().len(), 1);
}

#[test]
fn rejected_selection_discards_pending_submission() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    page.assign_files(vec![png(10)]);
    page.assign_files(vec![SelectedFile::new("a.txt", "text/plain", 1)]);
    page.advance(Duration::from_secs(2));
    assert!(page.take_effects().is_empty());
}

#[test]
fn auto_submit_is_a_no_op_once_the_form_is_gone() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    page.assign_files(vec![png(10)]);
    page.document_mut().remove(fx.upload_form);
    assert_eq!(page.advance(Duration::from_secs(1)), 1);
    assert!(page.take_effects().is_empty());
}

#[test]
fn drag_state_and_click_to_browse() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    assert!(page.dispatch(Event::DragOver { target: fx.area }).default_prevented);
    assert!(page.document().has_class(fx.area, "dragover"));
    page.dispatch(Event::DragLeave { target: fx.area });
    assert!(!page.document().has_class(fx.area, "dragover"));

    page.dispatch(Event::DragOver { target: fx.area });
    page.dispatch(Event::Drop {
        target: fx.area,
        files: Vec::new(),
    });
    assert!(!page.document().has_class(fx.area, "dragover"));
    assert_eq!(page.scheduler().pending(), 0);

    page.dispatch(Event::Click { target: fx.area });
    assert_eq!(
        page.take_effects(),
        vec![Effect::OpenFileChooser { input: fx.input }]
    );
    page.dispatch(Event::Click { target: fx.input });
    assert!(page.take_effects().is_empty());
}

#[test]
fn drops_outside_the_area_are_ignored() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);
    let outside = page.document().body();

    let dispatch = page.dispatch(Event::Drop {
        target: outside,
        files: vec![png(10)],
    });
    assert!(!dispatch.default_prevented);
    assert!(page.document().files(fx.input).is_empty());
}

#[test]
fn empty_required_field_blocks_submission_idempotently() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    for _ in 0..3 {
        let dispatch = page.dispatch(Event::Submit {
            form: fx.profile_form,
        });
        assert!(dispatch.default_prevented);
        assert!(page.take_effects().is_empty());
        // name and phone are required and empty
        assert_eq!(field_errors(&page).len(), 2);
    }

    let doc = page.document();
    assert!(doc.has_class(fx.name, "error"));
    assert!(doc.has_class(fx.phone, "error"));
    assert!(!doc.has_class(fx.email, "error"));
    let name_group = doc.parent(fx.name).expect("group");
    let error = doc
        .query(name_group, &Selector::Class("field-error"))
        .expect("inline error");
    assert_eq!(doc.text_content(error), "This field is required");

    let banners = notifications(&page);
    assert_eq!(banners.len(), 3);
    assert_eq!(
        page.document().text_content(banners[0]),
        "Please fix the errors before submitting."
    );
}

#[test]
fn format_errors_then_correction_clears_them() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);
    {
        let doc = page.document_mut();
        doc.set_value(fx.name, "Ada");
        doc.set_value(fx.email, "not-an-email");
        doc.set_value(fx.phone, "abc");
    }

    assert!(page.dispatch(Event::Submit { form: fx.profile_form }).default_prevented);
    let texts: Vec<String> = field_errors(&page)
        .into_iter()
        .map(|node| page.document().text_content(node))
        .collect();
    assert_eq!(
        texts,
        vec![
            "Please enter a valid email address.".to_string(),
            "Please enter a valid phone number.".to_string(),
        ]
    );

    {
        let doc = page.document_mut();
        doc.set_value(fx.email, "a@b.co");
        doc.set_value(fx.phone, "+15551234567");
    }
    let dispatch = page.dispatch(Event::Submit { form: fx.profile_form });
    assert!(!dispatch.default_prevented);
    assert!(field_errors(&page).is_empty());
    assert!(!page.document().has_class(fx.email, "error"));
    assert_eq!(
        page.take_effects(),
        vec![Effect::SubmitForm {
            form: fx.profile_form
        }]
    );
}

#[test]
fn notification_expires_after_five_seconds() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    let shown = page.notify("Uploaded", Severity::Success);
    page.advance(Duration::from_millis(4999));
    assert!(page.document().is_connected(shown.node));
    page.advance(Duration::from_millis(1));
    assert!(!page.document().is_connected(shown.node));
}

#[test]
fn dismissed_notification_expiry_is_harmless() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    let shown = page.notify("Heads up", Severity::Info);
    let close = page
        .document()
        .query(shown.node, &Selector::Class("close-notification"))
        .expect("close");
    page.dispatch(Event::Click { target: close });
    assert!(notifications(&page).is_empty());
    assert_eq!(page.advance(Duration::from_secs(5)), 1);
}

#[test]
fn preview_modal_closes_on_background_click() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);

    let modal = page.preview("/uploads/1.mp4", FileKind::Video);
    let content = page
        .document()
        .query(modal, &Selector::Class("modal-content"))
        .expect("content");
    page.dispatch(Event::Click { target: content });
    assert!(page.document().is_connected(modal));
    page.dispatch(Event::Click { target: modal });
    assert!(!page.document().is_connected(modal));
}

#[test]
fn scroll_reveal_and_menu_glue() {
    let fx = fixture();
    let (mut page, _handles) = page(&fx);
    page.document_mut().set_rect(fx.card, Rect::new(100.0, 300.0));

    page.dispatch(Event::Viewport(Viewport { height: 900.0 }));
    assert!(page.document().has_class(fx.card, "animate-fade-in"));

    page.dispatch(Event::Click {
        target: fx.menu_button,
    });
    assert!(page.document().has_class(fx.menu_panel, "active"));
    page.dispatch(Event::Click { target: fx.info });
    assert!(!page.document().has_class(fx.menu_panel, "active"));

    page.dispatch(Event::MouseEnter { target: fx.card });
    assert_eq!(
        page.document().style(fx.card, "transform"),
        Some("translateY(-2px)")
    );
}

#[test]
fn disposed_behaviors_stop_reacting_but_timers_still_fire() {
    let fx = fixture();
    let (mut page, handles) = page(&fx);

    page.assign_files(vec![png(10)]);
    let intake = handles.file_intake.expect("intake handle");
    assert!(page.dispose(intake));

    page.dispatch(Event::DragOver { target: fx.area });
    assert!(!page.document().has_class(fx.area, "dragover"));

    page.advance(Duration::from_secs(1));
    assert_eq!(page.take_effects().len(), 1);

    let forms = handles.form_validation.expect("forms handle");
    page.dispose(forms);
    let dispatch = page.dispatch(Event::Submit {
        form: fx.profile_form,
    });
    assert!(!dispatch.default_prevented);
    assert!(field_errors(&page).is_empty());
}

#[test]
fn search_is_opt_in() {
    let mut fx = fixture();
    let body = fx.doc.body();
    let input = fx.doc.append_new(body, "input", &["search-input"]);
    let item = fx.doc.append_new(body, "div", &["searchable-item"]);
    fx.doc.set_text(item, "1.png");
    let (mut page, _handles) = page(&fx);

    page.document_mut().set_value(input, "mp4");
    page.dispatch(Event::Input { target: input });
    assert_eq!(page.document().style(item, "display"), None);

    let handle = page.init_search().expect("search handle");
    assert_eq!(handle.behavior(), Behavior::Search);
    page.dispatch(Event::Input { target: input });
    assert_eq!(page.document().style(item, "display"), Some("none"));
}
