//! Pilot: programmatic interaction with a headless App.
//!
//! The `Pilot` wraps an [`App`] and provides methods to simulate user input
//! (clicks, typing, focus changes, window resizes), advance virtual time,
//! settle network requests and drive popups, so component behaviour can be
//! asserted without a host page.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::app::{App, AppConfig};
use crate::component::{Composable, LifecycleEvent};
use crate::context::Context;
use crate::error::Result;
use crate::event::EventType;
use crate::net::Transport;

/// A headless app driver for testing.
///
/// # Examples
///
/// ```ignore
/// use ezui::testing::Pilot;
///
/// let mut pilot = Pilot::new();
/// let counter = pilot.mount(Counter::new)?;
/// pilot.click(&counter, "increment")?;
/// assert_eq!(counter.component().text("count")?, "1");
/// ```
pub struct Pilot {
    app: App,
    lifecycle: Rc<RefCell<Vec<LifecycleEvent>>>,
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new()
    }
}

impl Pilot {
    /// Create a pilot over an app with the default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a pilot from an [`AppConfig`].
    pub fn with_config(config: AppConfig) -> Self {
        let app = App::new(config);
        let lifecycle = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&lifecycle);
        app.ctx()
            .lifecycle_events()
            .subscribe(move |event: &LifecycleEvent| log.borrow_mut().push(*event));
        Self { app, lifecycle }
    }

    /// Route `ajax` requests through `transport` (usually a canned mock).
    pub fn with_transport(self, transport: Arc<dyn Transport>) -> Self {
        self.app.ctx().set_transport(transport);
        self
    }

    /// Borrow the underlying app.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Borrow the underlying app mutably.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn ctx(&self) -> &Context {
        self.app.ctx()
    }

    /// Bootstrap `build` as the entry component.
    pub fn mount<C, F>(&mut self, build: F) -> Result<C>
    where
        C: Composable + Clone + 'static,
        F: FnOnce(&Context) -> Result<C>,
    {
        self.app.bootstrap(build)
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Click element `id` of `target`.
    pub fn click(&self, target: &impl Composable, id: &str) -> Result<usize> {
        target.component().click(id)
    }

    /// Focus element `id`, replace its value with `text` and fire `input`.
    pub fn type_text(&self, target: &impl Composable, id: &str, text: &str) -> Result<()> {
        let component = target.component();
        component.focus(id)?;
        component.set_value(id, text)?;
        let node = component.element(id)?;
        self.ctx().document().dispatch_event(node, EventType::Input);
        Ok(())
    }

    /// Fire `change` on element `id`.
    pub fn change(&self, target: &impl Composable, id: &str) -> Result<()> {
        let node = target.component().element(id)?;
        self.ctx().document().dispatch_event(node, EventType::Change);
        Ok(())
    }

    /// Set a checkbox/radio and fire `input` then `change`.
    pub fn check(&self, target: &impl Composable, id: &str, checked: bool) -> Result<()> {
        let node = target.component().element(id)?;
        let document = self.ctx().document();
        document.set_checked(node, checked);
        document.dispatch_event(node, EventType::Input);
        document.dispatch_event(node, EventType::Change);
        Ok(())
    }

    /// Blur element `id` (focusing it first if needed).
    pub fn blur(&self, target: &impl Composable, id: &str) -> Result<()> {
        let node = target.component().element(id)?;
        let document = self.ctx().document();
        if document.focused() != Some(node) {
            document.focus(node);
        }
        document.blur(node);
        Ok(())
    }

    /// Resize the window.
    pub fn resize(&self, width: u32, height: u32) {
        self.ctx().window().resize(width, height);
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Advance virtual time by `ms` milliseconds, firing due intervals and
    /// delivering finished requests.
    pub fn advance(&self, ms: u64) -> usize {
        self.app.step(Duration::from_millis(ms))
    }

    /// Deliver finished requests without moving time.
    pub fn process(&self) -> usize {
        self.ctx().pump_network()
    }

    /// Wait for every outstanding request and deliver it.
    pub async fn settle(&self) -> usize {
        self.ctx().settle_network().await
    }

    /// Click button `index` of the top-most popup.
    pub fn click_popup_button(&self, index: usize) -> bool {
        self.ctx().dialogs().click_popup_button(index)
    }

    // ── Query ────────────────────────────────────────────────────────

    /// The whole document serialized.
    pub fn html(&self) -> String {
        super::snapshot::document_html(self.ctx())
    }

    /// Lifecycle events since the last call, including those already
    /// forwarded by [`advance`](Self::advance).
    pub fn lifecycle_events(&self) -> Vec<LifecycleEvent> {
        self.ctx().flush_lifecycle();
        std::mem::take(&mut *self.lifecycle.borrow_mut())
    }

    /// Whether the app is still running (has not quit).
    pub fn is_running(&self) -> bool {
        !self.app.should_quit()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Binding, Component};
    use crate::reactive::Property;
    use std::rc::Rc;

    struct Greeter {
        base: Component,
        name: Property<String>,
        greeting: Property<String>,
    }

    impl Composable for Greeter {
        fn component(&self) -> &Component {
            &self.base
        }
    }

    fn greeter(ctx: &Context) -> Result<Rc<Greeter>> {
        let this = Rc::new(Greeter {
            base: Component::new(
                ctx,
                r#"<input id="name"><p id="greeting"></p><input id="loud" type="checkbox">"#,
                "",
            ),
            name: Property::new("name", String::new()),
            greeting: Property::new("greeting", String::new()),
        });
        this.base
            .bind(&this.name, Binding::value("name"))?
            .bind(&this.greeting, Binding::inner_markup("greeting"))?;
        this.base.on_input("name", &this, |this, ev| {
            this.greeting
                .set(format!("Hello, {}!", ev.value.as_deref().unwrap_or_default()))
        })?;
        Ok(this)
    }

    #[test]
    fn mount_attaches_to_body() {
        let mut pilot = Pilot::new();
        let g = pilot.mount(greeter).unwrap();
        assert!(g.component().is_mounted());
        assert_eq!(
            pilot.lifecycle_events(),
            vec![LifecycleEvent::Mount {
                host: g.component().host()
            }]
        );
    }

    #[test]
    fn type_text_updates_bound_properties() {
        let mut pilot = Pilot::new();
        let g = pilot.mount(greeter).unwrap();
        pilot.type_text(&g, "name", "Ada").unwrap();
        assert_eq!(g.name.get(), "Ada");
        assert_eq!(g.base.text("greeting").unwrap(), "Hello, Ada!");
    }

    #[test]
    fn check_sets_checked_state() {
        let mut pilot = Pilot::new();
        let g = pilot.mount(greeter).unwrap();
        pilot.check(&g, "loud", true).unwrap();
        let node = g.base.element("loud").unwrap();
        assert!(pilot.ctx().document().with_dom(|dom| dom.checked(node)));
    }

    #[test]
    fn advance_moves_virtual_time() {
        let pilot = Pilot::new();
        pilot.advance(250);
        assert_eq!(pilot.ctx().scheduler().now(), Duration::from_millis(250));
        assert!(pilot.is_running());
    }

    #[test]
    fn click_on_missing_id_is_an_error() {
        let mut pilot = Pilot::new();
        let g = pilot.mount(greeter).unwrap();
        assert!(pilot.click(&g, "nope").is_err());
    }

    #[test]
    fn html_includes_the_mounted_tree() {
        let mut pilot = Pilot::new();
        pilot.mount(greeter).unwrap();
        assert!(pilot.html().contains(r#"<div class="ez-host">"#));
    }
}
