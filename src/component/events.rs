//! Wiring DOM, window and timer events to an owner's methods.
//!
//! Handlers receive a strong `Rc` to their owner, upgraded from a weak
//! reference at dispatch time. Listeners therefore never keep a component
//! alive; once the owner is gone its DOM and window listeners do nothing and
//! its intervals cancel themselves.

use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::debug;

use super::Component;
use crate::error::Result;
use crate::event::{DomEvent, EventType, WindowEvent};
use crate::timer::{IntervalHandle, TimerId};

impl Component {
    /// Listen for `event_type` on the element `id` of this component.
    ///
    /// For `input` and `change` the event carries the element's value.
    pub fn on<O: 'static>(
        &self,
        id: &str,
        event_type: impl Into<EventType>,
        owner: &Rc<O>,
        handler: impl Fn(&Rc<O>, &DomEvent) + 'static,
    ) -> Result<&Self> {
        let node = self.element(id)?;
        let event_type = event_type.into();
        debug!(id, event = %event_type, "event bound");
        let owner: Weak<O> = Rc::downgrade(owner);
        self.document()
            .add_event_listener(node, event_type, move |event: &DomEvent| {
                if let Some(owner) = owner.upgrade() {
                    handler(&owner, event);
                }
            });
        Ok(self)
    }

    pub fn on_click<O: 'static>(
        &self,
        id: &str,
        owner: &Rc<O>,
        handler: impl Fn(&Rc<O>, &DomEvent) + 'static,
    ) -> Result<&Self> {
        self.on(id, EventType::Click, owner, handler)
    }

    pub fn on_blur<O: 'static>(
        &self,
        id: &str,
        owner: &Rc<O>,
        handler: impl Fn(&Rc<O>, &DomEvent) + 'static,
    ) -> Result<&Self> {
        self.on(id, EventType::Blur, owner, handler)
    }

    pub fn on_change<O: 'static>(
        &self,
        id: &str,
        owner: &Rc<O>,
        handler: impl Fn(&Rc<O>, &DomEvent) + 'static,
    ) -> Result<&Self> {
        self.on(id, EventType::Change, owner, handler)
    }

    pub fn on_input<O: 'static>(
        &self,
        id: &str,
        owner: &Rc<O>,
        handler: impl Fn(&Rc<O>, &DomEvent) + 'static,
    ) -> Result<&Self> {
        self.on(id, EventType::Input, owner, handler)
    }

    /// Listen for a window-level event. Every call installs its own
    /// listener, so each live component instance is notified independently.
    /// The listener is released once `owner` is dropped.
    pub fn on_window<O: 'static>(
        &self,
        event_type: impl Into<EventType>,
        owner: &Rc<O>,
        handler: impl Fn(&Rc<O>, &WindowEvent) + 'static,
    ) -> &Self {
        self.ctx().window().add_owned_listener(event_type, owner, handler);
        self
    }

    /// Call `handler` every `period`. The handle passed to each tick cancels
    /// the interval; the component also cancels it on dispose or drop.
    pub fn every<O: 'static>(
        &self,
        period: Duration,
        owner: &Rc<O>,
        handler: impl Fn(&Rc<O>, &IntervalHandle) + 'static,
    ) -> TimerId {
        let owner: Weak<O> = Rc::downgrade(owner);
        let id = self
            .ctx()
            .scheduler()
            .set_interval(period, move |tick: &IntervalHandle| match owner.upgrade() {
                Some(owner) => handler(&owner, tick),
                None => tick.cancel(),
            });
        self.own_timer(id);
        debug!(?id, ?period, "interval bound");
        id
    }
}
