//! Event system: event payloads, listener registry, bubble paths.

pub mod dom_event;
pub mod handler;

pub use dom_event::{DomEvent, EventType, WindowEvent};
pub use handler::{ListenerFn, ListenerRegistry};
