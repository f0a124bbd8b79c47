//! Headless controller for the upload page.
//!
//! The host owns a [`Page`]: it feeds DOM events into [`Page::dispatch`],
//! performs the queued [`Effect`]s it cannot delegate (opening the native file
//! chooser, submitting a form) and calls [`Page::run_due_tasks`] whenever the
//! scheduler says a timer is due.

pub mod dom;
pub mod forms;
pub mod intake;
pub mod menu;
pub mod notify;
pub mod reveal;
pub mod scheduler;
pub mod validation;

#[cfg(test)]
mod tests;

use std::{collections::HashSet, time::Duration};

use tracing::debug;

use crate::config::InteractionConfig;

use self::{
    dom::{Document, NodeId},
    forms::FormValidation,
    intake::{IntakeOutcome, UploadIntake},
    menu::{MobileMenu, SearchFilter},
    notify::{Notification, Severity},
    reveal::{HoverLift, RevealObserver, Viewport},
    scheduler::{Scheduler, Task, VirtualScheduler},
    validation::{FileKind, SelectedFile},
};

/// DOM events the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Click { target: NodeId },
    DragOver { target: NodeId },
    DragLeave { target: NodeId },
    Drop { target: NodeId, files: Vec<SelectedFile> },
    /// The file input's selection changed; files are already assigned.
    Change { target: NodeId },
    Submit { form: NodeId },
    Input { target: NodeId },
    MouseEnter { target: NodeId },
    MouseLeave { target: NodeId },
    /// Layout or scroll position changed.
    Viewport(Viewport),
}

/// Side-effects only the host environment can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    OpenFileChooser { input: NodeId },
    /// Native submission, bypassing submit handlers.
    SubmitForm { form: NodeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatch {
    pub default_prevented: bool,
}

/// Borrowed view handed to behaviors while they handle an event or a timer.
pub struct Context<'a, S: Scheduler> {
    pub doc: &'a mut Document,
    pub scheduler: &'a mut S,
    pub config: &'a InteractionConfig,
    pub effects: &'a mut Vec<Effect>,
}

impl<S: Scheduler> Context<'_, S> {
    pub fn notify(&mut self, message: &str, severity: Severity) -> Notification {
        notify::show_notification(
            self.doc,
            self.scheduler,
            self.config.notification_ttl,
            message,
            severity,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    FileIntake,
    FormValidation,
    ScrollReveal,
    HoverLift,
    MobileMenu,
    Search,
}

/// Unwires one behavior when passed to [`Page::dispose`].
#[must_use = "a dropped disposer leaves its behavior wired for the page lifetime"]
#[derive(Debug, PartialEq, Eq)]
pub struct Disposer {
    behavior: Behavior,
}

impl Disposer {
    pub fn behavior(&self) -> Behavior {
        self.behavior
    }
}

/// One disposer per behavior that found its elements during [`init`].
#[derive(Debug, Default)]
pub struct Handles {
    pub file_intake: Option<Disposer>,
    pub form_validation: Option<Disposer>,
    pub scroll_reveal: Option<Disposer>,
    pub hover_lift: Option<Disposer>,
    pub mobile_menu: Option<Disposer>,
}

impl Handles {
    pub fn into_vec(self) -> Vec<Disposer> {
        [
            self.file_intake,
            self.form_validation,
            self.scroll_reveal,
            self.hover_lift,
            self.mobile_menu,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

pub struct Page<S: Scheduler> {
    doc: Document,
    scheduler: S,
    config: InteractionConfig,
    effects: Vec<Effect>,
    active: HashSet<Behavior>,
    intake: Option<UploadIntake>,
    forms: Option<FormValidation>,
    reveal: Option<RevealObserver>,
    hover: Option<HoverLift>,
    menu: Option<MobileMenu>,
    search: Option<SearchFilter>,
}

/// Wires every behavior whose elements exist in `document`.
///
/// Missing elements are not an error; the matching handle is simply `None`.
pub fn init<S: Scheduler>(
    document: Document,
    scheduler: S,
    config: InteractionConfig,
) -> (Page<S>, Handles) {
    let mut page = Page {
        intake: UploadIntake::locate(&document),
        forms: FormValidation::observe(&document),
        reveal: Some(RevealObserver::observe(&document, config.reveal)),
        hover: Some(HoverLift::observe(&document)),
        menu: MobileMenu::locate(&document),
        search: None,
        doc: document,
        scheduler,
        config,
        effects: Vec::new(),
        active: HashSet::new(),
    };

    let handles = Handles {
        file_intake: page.activate_if(Behavior::FileIntake, page.intake.is_some()),
        form_validation: page.activate_if(Behavior::FormValidation, page.forms.is_some()),
        scroll_reveal: page.activate_if(Behavior::ScrollReveal, page.reveal.is_some()),
        hover_lift: page.activate_if(Behavior::HoverLift, page.hover.is_some()),
        mobile_menu: page.activate_if(Behavior::MobileMenu, page.menu.is_some()),
    };
    debug!(wired = page.active.len(), "page initialized");

    (page, handles)
}

impl<S: Scheduler> Page<S> {
    fn activate_if(&mut self, behavior: Behavior, present: bool) -> Option<Disposer> {
        if !present {
            return None;
        }
        self.active.insert(behavior);
        Some(Disposer { behavior })
    }

    fn is_active(&self, behavior: Behavior) -> bool {
        self.active.contains(&behavior)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn intake(&self) -> Option<&UploadIntake> {
        self.intake.as_ref()
    }

    /// Drains the side-effects queued since the last call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Unwires a behavior. Timers it already scheduled still fire.
    pub fn dispose(&mut self, disposer: Disposer) -> bool {
        let removed = self.active.remove(&disposer.behavior);
        if removed {
            debug!(behavior = ?disposer.behavior, "behavior disposed");
        }
        removed
    }

    /// Wires the list search filter; `None` when the page has no search input.
    pub fn init_search(&mut self) -> Option<Disposer> {
        self.search = SearchFilter::locate(&self.doc);
        let present = self.search.is_some();
        self.activate_if(Behavior::Search, present)
    }

    pub fn notify(&mut self, message: &str, severity: Severity) -> Notification {
        notify::show_notification(
            &mut self.doc,
            &mut self.scheduler,
            self.config.notification_ttl,
            message,
            severity,
        )
    }

    pub fn preview(&mut self, url: &str, kind: FileKind) -> NodeId {
        notify::show_preview(&mut self.doc, url, kind)
    }

    /// Assigns files to the chooser from script and runs the selection path.
    pub fn assign_files(&mut self, files: Vec<SelectedFile>) -> Option<IntakeOutcome> {
        if !self.is_active(Behavior::FileIntake) {
            return None;
        }
        let Page {
            doc,
            scheduler,
            config,
            effects,
            intake,
            ..
        } = self;
        let intake = intake.as_mut()?;
        doc.set_files(intake.input(), files);
        let mut cx = Context {
            doc,
            scheduler,
            config,
            effects,
        };
        Some(intake.on_change(&mut cx))
    }

    pub fn dispatch(&mut self, event: Event) -> Dispatch {
        let intake_on = self.is_active(Behavior::FileIntake);
        let forms_on = self.is_active(Behavior::FormValidation);
        let reveal_on = self.is_active(Behavior::ScrollReveal);
        let hover_on = self.is_active(Behavior::HoverLift);
        let menu_on = self.is_active(Behavior::MobileMenu);
        let search_on = self.is_active(Behavior::Search);

        let Page {
            doc,
            scheduler,
            config,
            effects,
            intake,
            forms,
            reveal,
            hover,
            menu,
            search,
            ..
        } = self;
        let mut cx = Context {
            doc,
            scheduler,
            config,
            effects,
        };
        let intake = intake.as_mut().filter(|_| intake_on);
        let mut outcome = Dispatch::default();

        match event {
            Event::Click { target } => {
                notify::dismiss_on_click(cx.doc, target);
                if let Some(intake) = intake {
                    if intake.is_within_area(cx.doc, target) {
                        intake.on_click(&mut cx, target);
                    }
                }
                if let Some(menu) = menu.as_ref().filter(|_| menu_on) {
                    menu.on_click(cx.doc, target);
                }
            }
            Event::DragOver { target } => {
                if let Some(intake) = intake.filter(|i| i.is_within_area(cx.doc, target)) {
                    outcome.default_prevented = true;
                    intake.on_drag_over(&mut cx);
                }
            }
            Event::DragLeave { target } => {
                if let Some(intake) = intake.filter(|i| i.is_within_area(cx.doc, target)) {
                    intake.on_drag_leave(&mut cx);
                }
            }
            Event::Drop { target, files } => {
                if let Some(intake) = intake.filter(|i| i.is_within_area(cx.doc, target)) {
                    outcome.default_prevented = true;
                    intake.on_drop(&mut cx, files);
                }
            }
            Event::Change { target } => {
                if let Some(intake) = intake.filter(|i| i.input() == target) {
                    intake.on_change(&mut cx);
                }
            }
            Event::Submit { form } => {
                if let Some(forms) = forms.as_mut().filter(|f| forms_on && f.guards(form)) {
                    let report = forms.on_submit(&mut cx, form);
                    outcome.default_prevented = !report.is_valid();
                }
                if !outcome.default_prevented {
                    cx.effects.push(Effect::SubmitForm { form });
                }
            }
            Event::Input { target } => {
                if let Some(search) = search.as_ref().filter(|s| search_on && s.input() == target) {
                    search.on_input(cx.doc);
                }
            }
            Event::MouseEnter { target } => {
                if let Some(hover) = hover.as_ref().filter(|_| hover_on) {
                    hover.on_enter(cx.doc, target);
                }
            }
            Event::MouseLeave { target } => {
                if let Some(hover) = hover.as_ref().filter(|_| hover_on) {
                    hover.on_leave(cx.doc, target);
                }
            }
            Event::Viewport(viewport) => {
                if let Some(reveal) = reveal.as_mut().filter(|_| reveal_on) {
                    reveal.on_viewport(cx.doc, viewport);
                }
            }
        }

        outcome
    }

    /// Runs every task whose deadline has passed. Returns how many ran.
    pub fn run_due_tasks(&mut self) -> usize {
        let due = self.scheduler.take_due();
        let count = due.len();
        for task in due {
            match task {
                Task::SubmitForm { form, generation } => {
                    let Page {
                        doc,
                        scheduler,
                        config,
                        effects,
                        intake,
                        ..
                    } = self;
                    if let Some(intake) = intake.as_mut() {
                        let mut cx = Context {
                            doc,
                            scheduler,
                            config,
                            effects,
                        };
                        intake.fire_submit(&mut cx, form, generation);
                    }
                }
                Task::ExpireNotification { notification } => {
                    notify::expire_notification(&mut self.doc, notification);
                }
            }
        }
        count
    }
}

impl Page<VirtualScheduler> {
    /// Moves the virtual clock forward and runs whatever became due.
    pub fn advance(&mut self, by: Duration) -> usize {
        self.scheduler.advance(by);
        self.run_due_tasks()
    }
}
