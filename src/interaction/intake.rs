//! Upload area wiring: click, drag-and-drop and chooser changes all funnel
//! into [`UploadIntake::select`].

use tracing::{debug, info};

use crate::interaction::{
    Context, Effect,
    dom::{Document, NodeId, Selector},
    notify::Severity,
    scheduler::{Scheduler, Task},
    validation::{FileKind, FileRejection, SelectedFile, format_file_size, validate_file},
};

pub const UPLOAD_AREA: Selector<'static> = Selector::Class("upload-area");
pub const FILE_INPUT: Selector<'static> = Selector::Id("file-input");
pub const FILE_INFO: Selector<'static> = Selector::Class("file-info");
pub const UPLOAD_FORM: Selector<'static> = Selector::All(&[
    Selector::Tag("form"),
    Selector::AttrEq("enctype", "multipart/form-data"),
]);

const DRAGOVER_CLASS: &str = "dragover";

/// What the file-info region shows for an accepted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewDescriptor {
    pub kind: FileKind,
    pub file_name: String,
    pub size_label: String,
}

impl PreviewDescriptor {
    pub fn describe(file: &SelectedFile, kind: FileKind) -> Self {
        Self {
            kind,
            file_name: file.name.clone(),
            size_label: format_file_size(file.size),
        }
    }

    /// Font Awesome glyph class, `fa-image` or `fa-video`.
    pub fn icon_class(&self) -> &'static str {
        match self.kind {
            FileKind::Image => "fa-image",
            FileKind::Video => "fa-video",
        }
    }

    /// Replaces the content of `region` with the preview card.
    pub fn render_into(&self, doc: &mut Document, region: NodeId) -> NodeId {
        doc.clear_children(region);
        let card = doc.append_new(region, "div", &["file-preview"]);
        doc.append_new(
            card,
            "i",
            &["fas", self.icon_class(), "file-icon", self.kind.as_str()],
        );
        let name = doc.append_new(card, "p", &["file-name"]);
        doc.set_text(name, &self.file_name);
        let size = doc.append_new(card, "p", &["file-size"]);
        doc.set_text(size, &self.size_label);
        card
    }
}

/// The accepted file waiting for its auto-submit timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub file: SelectedFile,
    pub form: NodeId,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Accepted {
        preview: PreviewDescriptor,
        submission_scheduled: bool,
    },
    Rejected(FileRejection),
    /// The event carried no file.
    Empty,
}

#[derive(Debug)]
pub struct UploadIntake {
    area: NodeId,
    input: NodeId,
    pending: Option<PendingSubmission>,
    generation: u64,
}

impl UploadIntake {
    /// Finds the upload area and file input; `None` when either is missing.
    pub fn locate(doc: &Document) -> Option<Self> {
        let body = doc.body();
        let area = doc.query(body, &UPLOAD_AREA)?;
        let input = doc.query(body, &FILE_INPUT)?;
        Some(Self {
            area,
            input,
            pending: None,
            generation: 0,
        })
    }

    pub fn input(&self) -> NodeId {
        self.input
    }

    pub fn pending(&self) -> Option<&PendingSubmission> {
        self.pending.as_ref()
    }

    pub fn is_within_area(&self, doc: &Document, target: NodeId) -> bool {
        doc.contains(self.area, target)
    }

    pub fn on_click<S: Scheduler>(&self, cx: &mut Context<'_, S>, target: NodeId) {
        // The input opens its own chooser.
        if target != self.input {
            cx.effects.push(Effect::OpenFileChooser { input: self.input });
        }
    }

    pub fn on_drag_over<S: Scheduler>(&self, cx: &mut Context<'_, S>) {
        cx.doc.add_class(self.area, DRAGOVER_CLASS);
    }

    pub fn on_drag_leave<S: Scheduler>(&self, cx: &mut Context<'_, S>) {
        cx.doc.remove_class(self.area, DRAGOVER_CLASS);
    }

    pub fn on_drop<S: Scheduler>(
        &mut self,
        cx: &mut Context<'_, S>,
        files: Vec<SelectedFile>,
    ) -> IntakeOutcome {
        cx.doc.remove_class(self.area, DRAGOVER_CLASS);
        let Some(first) = files.first().cloned() else {
            return IntakeOutcome::Empty;
        };
        cx.doc.set_files(self.input, files);
        self.select(cx, &first)
    }

    pub fn on_change<S: Scheduler>(&mut self, cx: &mut Context<'_, S>) -> IntakeOutcome {
        match cx.doc.files(self.input).first().cloned() {
            Some(file) => self.select(cx, &file),
            None => IntakeOutcome::Empty,
        }
    }

    /// Validates `file`, renders its preview and schedules the auto-submit.
    ///
    /// Any new selection, accepted or not, supersedes the pending one.
    pub fn select<S: Scheduler>(
        &mut self,
        cx: &mut Context<'_, S>,
        file: &SelectedFile,
    ) -> IntakeOutcome {
        self.generation += 1;
        self.pending = None;

        let kind = match validate_file(file) {
            Ok(kind) => kind,
            Err(rejection) => {
                debug!(name = %file.name, mime = %file.mime, size = file.size, ?rejection, "file rejected");
                cx.notify(rejection.message(), Severity::Error);
                return IntakeOutcome::Rejected(rejection);
            }
        };

        let preview = PreviewDescriptor::describe(file, kind);
        let body = cx.doc.body();
        if let Some(region) = cx.doc.query(body, &FILE_INFO) {
            preview.render_into(cx.doc, region);
        }

        let submission_scheduled = match cx.doc.query(body, &UPLOAD_FORM) {
            Some(form) => {
                cx.scheduler.schedule(
                    cx.config.auto_submit_delay,
                    Task::SubmitForm {
                        form,
                        generation: self.generation,
                    },
                );
                self.pending = Some(PendingSubmission {
                    file: file.clone(),
                    form,
                    generation: self.generation,
                });
                true
            }
            None => false,
        };

        info!(name = %file.name, size = file.size, submission_scheduled, "file accepted");
        IntakeOutcome::Accepted {
            preview,
            submission_scheduled,
        }
    }

    /// Runs a due auto-submit. Superseded selections and detached forms are skipped.
    pub fn fire_submit<S: Scheduler>(
        &mut self,
        cx: &mut Context<'_, S>,
        form: NodeId,
        generation: u64,
    ) -> bool {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == generation && pending.form == form);
        if !is_current {
            debug!(generation, "stale auto-submit skipped");
            return false;
        }
        self.pending = None;
        if !cx.doc.is_connected(form) {
            return false;
        }
        cx.effects.push(Effect::SubmitForm { form });
        true
    }
}
