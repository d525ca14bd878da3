//! # ezui
//!
//! A small declarative UI component framework over a headless DOM.
//!
//! A component is an HTML template plus CSS, built once into an encapsulated
//! shadow tree. Application state lives in [`Property`] fields; binding a
//! property to an element keeps that element in sync on every write, with no
//! manual DOM code. Components nest into each other's named slots and talk
//! through [`EventSubject`] channels.
//!
//! ## Core Systems
//!
//! - **[`dom`]**: slotmap-backed node arena with scoped queries and serialization
//! - **[`markup`]**: logos-based template tokenizer, fragment parser, inline style helpers
//! - **[`document`]**, **[`window`]**, **[`timer`]**: host services (events, viewport, intervals)
//! - **[`component`]**: shadow-tree components, composition, bindings, event wiring
//! - **[`reactive`]**: observable properties with pipes and sinks, pub/sub subjects
//! - **[`widgets`]**: built-in components (the modal dialog)
//! - **[`net`]**: the `ajax` primitive over reqwest
//! - **[`context`]**, **[`app`]**: shared services, configuration, bootstrap, run loop
//! - **[`testing`]**: headless pilot and snapshot helpers

// Foundation
pub mod dom;
pub mod error;
pub mod markup;

// Host services
pub mod document;
pub mod event;
pub mod net;
pub mod timer;
pub mod window;

// Components and reactivity
pub mod component;
pub mod reactive;
pub mod widgets;

// Application
pub mod app;
pub mod context;
pub mod testing;

pub use app::{App, AppConfig, SlotPolicy};
pub use component::{BindValue, Binding, BindingKind, Component, Composable, LifecycleEvent};
pub use context::Context;
pub use error::{Error, Result};
pub use reactive::{EventSubject, Property};
pub use widgets::{Dialog, DialogManager};
pub use window::Size;
