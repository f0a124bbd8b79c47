//! Mobile navigation toggle and the list search filter.

use crate::interaction::dom::{Document, NodeId, Selector};

pub const MENU_BUTTON: Selector<'static> = Selector::Class("mobile-menu-btn");
pub const MENU_PANEL: Selector<'static> = Selector::Class("mobile-menu");
pub const SEARCH_INPUT: Selector<'static> = Selector::Class("search-input");
pub const SEARCHABLE_ITEM: Selector<'static> = Selector::Class("searchable-item");

const ACTIVE_CLASS: &str = "active";

#[derive(Debug)]
pub struct MobileMenu {
    button: NodeId,
    panel: NodeId,
}

impl MobileMenu {
    pub fn locate(doc: &Document) -> Option<Self> {
        let body = doc.body();
        Some(Self {
            button: doc.query(body, &MENU_BUTTON)?,
            panel: doc.query(body, &MENU_PANEL)?,
        })
    }

    /// The button toggles the panel; clicks outside both close it.
    pub fn on_click(&self, doc: &mut Document, target: NodeId) {
        if doc.contains(self.button, target) {
            doc.toggle_class(self.panel, ACTIVE_CLASS);
        } else if !doc.contains(self.panel, target) {
            doc.remove_class(self.panel, ACTIVE_CLASS);
        }
    }
}

#[derive(Debug)]
pub struct SearchFilter {
    input: NodeId,
}

impl SearchFilter {
    pub fn locate(doc: &Document) -> Option<Self> {
        let body = doc.body();
        doc.query(body, &SEARCH_INPUT).map(|input| Self { input })
    }

    pub fn input(&self) -> NodeId {
        self.input
    }

    /// Shows items whose text contains the query, case-insensitively.
    /// Returns how many stay visible.
    pub fn on_input(&self, doc: &mut Document) -> usize {
        let term = doc.value(self.input).to_lowercase();
        let body = doc.body();
        let mut visible = 0;
        for item in doc.query_all(body, &SEARCHABLE_ITEM) {
            let matches = doc.text_content(item).to_lowercase().contains(&term);
            doc.set_style(item, "display", if matches { "block" } else { "none" });
            if matches {
                visible += 1;
            }
        }
        visible
    }
}
