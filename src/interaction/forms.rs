//! Submit-time form checks with inline field errors.

use std::collections::HashMap;

use tracing::debug;

use crate::interaction::{
    Context,
    dom::{Document, NodeId, Selector},
    notify::Severity,
    scheduler::Scheduler,
    validation::{FieldError, FieldKind, check_field},
};

pub const FORM: Selector<'static> = Selector::Tag("form");
const FORM_CONTROL: Selector<'static> = Selector::Any(&[
    Selector::Tag("input"),
    Selector::Tag("textarea"),
    Selector::Tag("select"),
]);

const ERROR_CLASS: &str = "error";
const FIELD_ERROR_CLASS: &str = "field-error";
pub const FORM_INVALID_MESSAGE: &str = "Please fix the errors before submitting.";

/// Result of one validation pass over a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormReport {
    pub invalid: Vec<(NodeId, FieldError)>,
}

impl FormReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Guards the forms present at wiring time and tracks the inline error
/// element currently attached to each field.
#[derive(Debug, Default)]
pub struct FormValidation {
    forms: Vec<NodeId>,
    field_errors: HashMap<NodeId, NodeId>,
}

impl FormValidation {
    /// `None` when the page has no forms.
    pub fn observe(doc: &Document) -> Option<Self> {
        let body = doc.body();
        let forms = doc.query_all(body, &FORM);
        if forms.is_empty() {
            return None;
        }
        Some(Self {
            forms,
            field_errors: HashMap::new(),
        })
    }

    pub fn guards(&self, form: NodeId) -> bool {
        self.forms.contains(&form)
    }

    /// Validates every control in `form`, redrawing inline errors.
    ///
    /// On failure the aggregate notification is raised and the caller must
    /// suppress the submission.
    pub fn on_submit<S: Scheduler>(&mut self, cx: &mut Context<'_, S>, form: NodeId) -> FormReport {
        let mut report = FormReport::default();

        for field in cx.doc.query_all(form, &FORM_CONTROL) {
            match field_error(cx.doc, field) {
                Some(error) => {
                    cx.doc.add_class(field, ERROR_CLASS);
                    self.show_error(cx.doc, field, error);
                    report.invalid.push((field, error));
                }
                None => {
                    cx.doc.remove_class(field, ERROR_CLASS);
                    self.clear_error(cx.doc, field);
                }
            }
        }

        if !report.is_valid() {
            debug!(invalid = report.invalid.len(), "form submission blocked");
            cx.notify(FORM_INVALID_MESSAGE, Severity::Error);
        }
        report
    }

    fn show_error(&mut self, doc: &mut Document, field: NodeId, error: FieldError) {
        self.clear_error(doc, field);
        let Some(parent) = doc.parent(field) else {
            return;
        };
        let node = doc.append_new(parent, "div", &[FIELD_ERROR_CLASS]);
        doc.set_text(node, error.message());
        self.field_errors.insert(field, node);
    }

    fn clear_error(&mut self, doc: &mut Document, field: NodeId) {
        if let Some(node) = self.field_errors.remove(&field) {
            doc.remove(node);
        }
    }
}

/// Applies the required, email and phone rules to one control.
pub fn field_error(doc: &Document, field: NodeId) -> Option<FieldError> {
    let element = doc.element(field)?;
    let input_type = element.attribute("type");
    let kind = FieldKind::from_input(element.tag(), input_type);
    let required = element.has_attribute("required");

    // A file input counts as filled once something was chosen.
    if input_type.is_some_and(|t| t.eq_ignore_ascii_case("file")) {
        return (required && element.files().is_empty()).then_some(FieldError::Required);
    }

    check_field(kind, required, element.value())
}
