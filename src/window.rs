//! Window: viewport size and window-level listeners.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{EventType, WindowEvent};

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

type WindowCallback = Rc<dyn Fn(&WindowEvent)>;

struct WindowListener {
    event_type: EventType,
    callback: WindowCallback,
    /// `false` once the listener's owner has been dropped.
    alive: Box<dyn Fn() -> bool>,
}

struct WindowState {
    size: Size,
    listeners: Vec<WindowListener>,
}

/// Shared handle to the window.
#[derive(Clone)]
pub struct Window {
    state: Rc<RefCell<WindowState>>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Window")
            .field("size", &state.size)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl Window {
    /// Create a window with the given viewport size.
    pub fn new(size: Size) -> Self {
        Self {
            state: Rc::new(RefCell::new(WindowState {
                size,
                listeners: Vec::new(),
            })),
        }
    }

    /// Current viewport size.
    pub fn size(&self) -> Size {
        self.state.borrow().size
    }

    /// Register a window listener. Registrations are never deduplicated.
    pub fn add_listener(
        &self,
        event_type: impl Into<EventType>,
        callback: impl Fn(&WindowEvent) + 'static,
    ) {
        self.push(WindowListener {
            event_type: event_type.into(),
            callback: Rc::new(callback),
            alive: Box::new(|| true),
        });
    }

    /// Register a listener that lives as long as `owner`. The owner is held
    /// weakly; once it is dropped the listener is removed on the next
    /// registration, dispatch or count.
    pub fn add_owned_listener<O: 'static>(
        &self,
        event_type: impl Into<EventType>,
        owner: &Rc<O>,
        callback: impl Fn(&Rc<O>, &WindowEvent) + 'static,
    ) {
        let weak = Rc::downgrade(owner);
        let liveness = Weak::clone(&weak);
        self.push(WindowListener {
            event_type: event_type.into(),
            callback: Rc::new(move |event: &WindowEvent| {
                if let Some(owner) = weak.upgrade() {
                    callback(&owner, event);
                }
            }),
            alive: Box::new(move || liveness.strong_count() > 0),
        });
    }

    fn push(&self, listener: WindowListener) {
        self.prune();
        self.state.borrow_mut().listeners.push(listener);
    }

    /// Drop listeners whose owner is gone. The removed closures are dropped
    /// after the borrow is released.
    fn prune(&self) -> usize {
        let dead: Vec<WindowListener> = {
            let mut state = self.state.borrow_mut();
            let (live, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut state.listeners)
                .into_iter()
                .partition(|listener| (listener.alive)());
            state.listeners = live;
            dead
        };
        if !dead.is_empty() {
            debug!(pruned = dead.len(), "window listeners released");
        }
        dead.len()
    }

    /// Number of live listeners for `event_type`.
    pub fn listener_count(&self, event_type: &EventType) -> usize {
        self.prune();
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.event_type == *event_type)
            .count()
    }

    /// Deliver `event_type` to every matching listener, in registration order.
    pub fn dispatch(&self, event_type: impl Into<EventType>) -> usize {
        let event_type = event_type.into();
        self.prune();
        let (event, callbacks) = {
            let state = self.state.borrow();
            let callbacks: Vec<WindowCallback> = state
                .listeners
                .iter()
                .filter(|listener| listener.event_type == event_type)
                .map(|listener| Rc::clone(&listener.callback))
                .collect();
            (
                WindowEvent {
                    event_type,
                    size: state.size,
                },
                callbacks,
            )
        };
        for callback in &callbacks {
            callback(&event);
        }
        callbacks.len()
    }

    /// Change the viewport size and fire `resize`.
    pub fn resize(&self, width: u32, height: u32) {
        self.state.borrow_mut().size = Size::new(width, height);
        debug!(width, height, "window resized");
        self.dispatch(EventType::Resize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn resize_updates_size_and_notifies() {
        let window = Window::new(Size::new(800, 600));
        let seen = Rc::new(Cell::new(Size::default()));
        let seen_c = Rc::clone(&seen);
        window.add_listener("resize", move |ev: &WindowEvent| seen_c.set(ev.size));
        window.resize(1024, 768);
        assert_eq!(window.size(), Size::new(1024, 768));
        assert_eq!(seen.get(), Size::new(1024, 768));
    }

    #[test]
    fn listeners_are_filtered_by_type() {
        let window = Window::new(Size::new(1, 1));
        let hits = Rc::new(Cell::new(0));
        let hits_c = Rc::clone(&hits);
        window.add_listener("scroll", move |_: &WindowEvent| hits_c.set(hits_c.get() + 1));
        assert_eq!(window.dispatch(EventType::Resize), 0);
        assert_eq!(window.dispatch("scroll"), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn listener_may_register_another_listener() {
        let window = Window::new(Size::new(1, 1));
        let w = window.clone();
        window.add_listener("resize", move |_: &WindowEvent| {
            w.add_listener("resize", |_: &WindowEvent| {});
        });
        window.resize(2, 2);
        assert_eq!(window.listener_count(&EventType::Resize), 2);
    }

    #[test]
    fn owned_listeners_go_away_with_their_owner() {
        let window = Window::new(Size::new(1, 1));
        let hits = Rc::new(Cell::new(0));
        let owners: Vec<Rc<()>> = (0..4).map(|_| Rc::new(())).collect();
        for owner in &owners {
            let hits = Rc::clone(&hits);
            window.add_owned_listener("resize", owner, move |_, _: &WindowEvent| {
                hits.set(hits.get() + 1)
            });
        }
        window.add_listener("resize", |_: &WindowEvent| {});
        assert_eq!(window.listener_count(&EventType::Resize), 5);

        let mut owners = owners;
        owners.truncate(1);
        assert_eq!(window.listener_count(&EventType::Resize), 2);
        assert_eq!(window.dispatch(EventType::Resize), 2);
        assert_eq!(hits.get(), 1);

        drop(owners);
        window.resize(3, 3);
        assert_eq!(window.listener_count(&EventType::Resize), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn size_deserializes_from_json() {
        let size: Size = serde_json::from_str(r#"{"width":320,"height":200}"#).unwrap();
        assert_eq!(size, Size::new(320, 200));
    }
}
