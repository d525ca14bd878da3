//! Event payloads: DOM events and window events.

use std::cell::Cell;
use std::fmt;

use crate::dom::NodeId;
use crate::window::Size;

// ---------------------------------------------------------------------------
// EventType
// ---------------------------------------------------------------------------

/// Event type name. The common types have dedicated variants; anything else
/// is carried as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Input,
    Change,
    Blur,
    Focus,
    Resize,
    Custom(String),
}

impl EventType {
    /// The DOM name of this event type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Click => "click",
            Self::Input => "input",
            Self::Change => "change",
            Self::Blur => "blur",
            Self::Focus => "focus",
            Self::Resize => "resize",
            Self::Custom(name) => name,
        }
    }

    /// Whether the event carries the target's current form value.
    pub fn carries_value(&self) -> bool {
        matches!(self, Self::Input | Self::Change)
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        match name {
            "click" => Self::Click,
            "input" => Self::Input,
            "change" => Self::Change,
            "blur" => Self::Blur,
            "focus" => Self::Focus,
            "resize" => Self::Resize,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DomEvent
// ---------------------------------------------------------------------------

/// An event travelling from its target up through the target's ancestors.
#[derive(Debug)]
pub struct DomEvent {
    /// What happened.
    pub event_type: EventType,
    /// The node the event was dispatched at.
    pub target: NodeId,
    /// The target's `id`, if any.
    pub target_id: Option<String>,
    /// For `input`/`change`: the target's value at dispatch time.
    pub value: Option<String>,
    /// For `input`/`change` on checkboxes and radios: the checked state.
    pub checked: Option<bool>,
    current_target: Cell<NodeId>,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    /// Create an event aimed at `target`.
    pub fn new(event_type: EventType, target: NodeId) -> Self {
        Self {
            event_type,
            target,
            target_id: None,
            value: None,
            checked: None,
            current_target: Cell::new(target),
            propagation_stopped: Cell::new(false),
        }
    }

    /// The node whose listener is currently running.
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub(crate) fn set_current_target(&self, node: NodeId) {
        self.current_target.set(node);
    }

    /// Stop the event from reaching further ancestors. Listeners on the
    /// current node still run.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Whether [`stop_propagation`](Self::stop_propagation) was called.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

// ---------------------------------------------------------------------------
// WindowEvent
// ---------------------------------------------------------------------------

/// An event delivered to window-level listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEvent {
    /// What happened.
    pub event_type: EventType,
    /// Viewport size at dispatch time.
    pub size: Size,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in ["click", "input", "change", "blur", "focus", "resize", "keyup"] {
            assert_eq!(EventType::from(name).as_str(), name);
        }
        assert_eq!(EventType::from("keyup"), EventType::Custom("keyup".into()));
    }

    #[test]
    fn only_input_and_change_carry_values() {
        assert!(EventType::Input.carries_value());
        assert!(EventType::Change.carries_value());
        assert!(!EventType::Click.carries_value());
    }
}
