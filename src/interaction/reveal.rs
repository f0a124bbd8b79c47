//! Scroll-triggered fade-in and hover lift.

use tracing::debug;

use crate::interaction::dom::{Document, NodeId, Rect, Selector};

pub const REVEAL_TARGETS: Selector<'static> = Selector::Any(&[
    Selector::Class("card"),
    Selector::Class("dashboard-container"),
    Selector::Class("login-card"),
]);
pub const HOVER_TARGETS: Selector<'static> = Selector::Any(&[
    Selector::Class("btn"),
    Selector::Class("card"),
    Selector::Class("file-item"),
]);

const REVEALED_CLASS: &str = "animate-fade-in";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealOptions {
    /// Fraction of the element that must be visible.
    pub threshold: f64,
    /// Added to the viewport bottom edge; negative values shrink it.
    pub bottom_margin: f64,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            bottom_margin: -50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub height: f64,
}

/// Share of `rect` inside the viewport after applying the bottom margin.
pub fn visible_ratio(rect: Rect, viewport: Viewport, options: &RevealOptions) -> f64 {
    let root_bottom = viewport.height + options.bottom_margin;
    if rect.height <= 0.0 {
        let inside = rect.top >= 0.0 && rect.top <= root_bottom;
        return if inside { 1.0 } else { 0.0 };
    }
    let visible = rect.bottom().min(root_bottom) - rect.top.max(0.0);
    (visible.max(0.0) / rect.height).min(1.0)
}

/// One-shot reveal of the elements present when the page was wired.
#[derive(Debug)]
pub struct RevealObserver {
    watching: Vec<NodeId>,
    options: RevealOptions,
}

impl RevealObserver {
    pub fn observe(doc: &Document, options: RevealOptions) -> Self {
        let body = doc.body();
        Self {
            watching: doc.query_all(body, &REVEAL_TARGETS),
            options,
        }
    }

    pub fn watching(&self) -> &[NodeId] {
        &self.watching
    }

    /// Reveals elements that crossed the threshold and stops watching them.
    pub fn on_viewport(&mut self, doc: &mut Document, viewport: Viewport) -> Vec<NodeId> {
        let options = self.options;
        let mut revealed = Vec::new();
        self.watching.retain(|node| {
            let Some(rect) = doc.rect(*node) else {
                return doc.element(*node).is_some();
            };
            let ratio = visible_ratio(rect, viewport, &options);
            if ratio > 0.0 && ratio >= options.threshold {
                doc.add_class(*node, REVEALED_CLASS);
                revealed.push(*node);
                false
            } else {
                true
            }
        });
        if !revealed.is_empty() {
            debug!(count = revealed.len(), "elements revealed");
        }
        revealed
    }
}

/// Lifts interactive elements by two pixels while hovered.
#[derive(Debug)]
pub struct HoverLift {
    targets: Vec<NodeId>,
}

impl HoverLift {
    pub fn observe(doc: &Document) -> Self {
        let body = doc.body();
        Self {
            targets: doc.query_all(body, &HOVER_TARGETS),
        }
    }

    pub fn on_enter(&self, doc: &mut Document, target: NodeId) {
        if self.targets.contains(&target) {
            doc.set_style(target, "transform", "translateY(-2px)");
        }
    }

    pub fn on_leave(&self, doc: &mut Document, target: NodeId) {
        if self.targets.contains(&target) {
            doc.set_style(target, "transform", "translateY(0)");
        }
    }
}
