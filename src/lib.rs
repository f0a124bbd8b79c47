//! Upload page interaction controller for iCapture, plus the small web service
//! that hosts the page and stores what it submits.

pub mod config;
pub mod interaction;
pub mod web;

pub use interaction::{Effect, Event, Page, init};
pub use web::{AppState, escape_html, render_footer};
