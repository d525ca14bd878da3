//! Built-in components.

pub mod dialog;

pub use dialog::{Dialog, DialogManager};
