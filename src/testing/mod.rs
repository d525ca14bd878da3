//! Headless testing: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to drive an [`App`](crate::app::App) without a host page.
//! Use [`component_html`] and related helpers to capture component trees as
//! HTML for snapshot-style assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{component_html, component_outer_html, document_html, pretty};
