//! Components: an HTML template and CSS built into an encapsulated shadow tree.
//!
//! Every component owns one host element:
//!
//! ```text
//! <div class="ez-host">
//!   #shadow-root
//!     <style>/* copies of the page's ambient stylesheets */</style>
//!     <style>/* the component's own css */</style>
//!     <div id="root">/* the parsed template */</div>
//! ```
//!
//! Id lookups are scoped to the shadow root and never descend into a nested
//! component, so two components may use the same ids without interfering.
//! Children are composed into named slots (any element id in the template,
//! `root` by default) with [`Component::add_component_to`].
//!
//! Bindings live in [`bind`], event wiring in [`events`].

pub mod bind;
pub mod events;
pub mod lifecycle;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::app::SlotPolicy;
use crate::context::Context;
use crate::document::Document;
use crate::dom::{NodeData, NodeId};
use crate::error::{Error, Result};
use crate::markup::parse_fragment;
use crate::net::HttpMethod;
use crate::reactive::EventSubject;
use crate::timer::TimerId;

pub use bind::{BindValue, Binding, BindingKind};
pub use lifecycle::{LifecycleEvent, LifecycleTracker};

/// Class carried by every component host element.
pub const HOST_CLASS: &str = "ez-host";
/// Id of the wrapper holding the parsed template; the default slot.
pub const ROOT_ID: &str = "root";

struct ComponentInner {
    ctx: Context,
    host: NodeId,
    shadow: NodeId,
    root: NodeId,
    template: String,
    css: String,
    timers: RefCell<Vec<TimerId>>,
    disposed: Cell<bool>,
}

impl Drop for ComponentInner {
    fn drop(&mut self) {
        let scheduler = self.ctx.scheduler();
        for id in self.timers.get_mut().drain(..) {
            scheduler.cancel(id);
        }
        if self.disposed.get() {
            return;
        }
        // A mounted tree stays rendered; only an orphaned one is freed.
        let host = self.host;
        self.ctx.document().try_with_mut(|state| {
            if state.dom.contains(host) && state.dom.parent(host).is_none() {
                state.remove_subtree(host);
            }
        });
    }
}

/// Handle to a component. Clones share the same tree.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("host", &self.inner.host)
            .field("timers", &self.inner.timers.borrow().len())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

/// Anything that wraps a [`Component`]: application components embed one
/// and expose it here so they can be composed.
pub trait Composable {
    fn component(&self) -> &Component;
}

impl Composable for Component {
    fn component(&self) -> &Component {
        self
    }
}

impl<C: Composable + ?Sized> Composable for Rc<C> {
    fn component(&self) -> &Component {
        (**self).component()
    }
}

impl Component {
    /// Build the host element and its shadow tree. The component starts
    /// detached; mount it with [`add_component`](Self::add_component) on a
    /// parent or [`append_to_dom_element`](Self::append_to_dom_element).
    pub fn new(ctx: &Context, html: &str, css: &str) -> Self {
        let document = ctx.document();
        let ambient = document.ambient_stylesheets();
        let (host, shadow, root) = document.with_mut(|state| {
            let dom = &mut state.dom;
            let host = dom.insert(NodeData::element("div").with_class(HOST_CLASS));
            let shadow = dom.insert_child(host, NodeData::shadow_root());
            for sheet in ambient {
                if let Some(copy) = dom.deep_clone(sheet) {
                    dom.reparent(copy, shadow, false);
                }
            }
            let style = dom.insert_child(shadow, NodeData::element("style"));
            if !css.is_empty() {
                dom.insert_child(style, NodeData::text(css));
            }
            let root = dom.insert_child(shadow, NodeData::element("div").with_id(ROOT_ID));
            parse_fragment(dom, root, html);
            (host, shadow, root)
        });
        debug!(?host, template_len = html.len(), css_len = css.len(), "component built");
        Self {
            inner: Rc::new(ComponentInner {
                ctx: ctx.clone(),
                host,
                shadow,
                root,
                template: html.to_owned(),
                css: css.to_owned(),
                timers: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn ctx(&self) -> &Context {
        &self.inner.ctx
    }

    pub fn document(&self) -> &Document {
        self.inner.ctx.document()
    }

    /// The host element attached to parents and pages.
    pub fn host(&self) -> NodeId {
        self.inner.host
    }

    pub fn shadow_root(&self) -> NodeId {
        self.inner.shadow
    }

    /// The wrapper element holding the template.
    pub fn root(&self) -> NodeId {
        self.inner.root
    }

    /// The template this component was built from.
    pub fn template(&self) -> &str {
        &self.inner.template
    }

    /// The component's own CSS.
    pub fn css(&self) -> &str {
        &self.inner.css
    }

    /// The element the host is currently attached to.
    pub fn host_parent(&self) -> Option<NodeId> {
        self.document().with_dom(|dom| dom.parent(self.inner.host))
    }

    /// Whether the host is attached anywhere.
    pub fn is_mounted(&self) -> bool {
        self.host_parent().is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Whether two handles refer to the same component.
    pub fn same_component(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Find an element by id in this component's own tree.
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.document()
            .with_dom(|dom| dom.find_in_scope(self.inner.shadow, id))
    }

    /// Like [`find`](Self::find), but a missing id is an error.
    pub fn element(&self, id: &str) -> Result<NodeId> {
        if self.is_disposed() {
            return Err(Error::Detached);
        }
        self.find(id).ok_or_else(|| Error::ElementNotFound { id: id.to_owned() })
    }

    // ── Composition ──────────────────────────────────────────────────

    /// Append `child` to the default `root` slot.
    pub fn add_component(&self, child: &impl Composable) -> Result<()> {
        self.add_component_to(child, ROOT_ID, false)
    }

    /// Attach `child` under the element `slot` of this component's tree,
    /// appended or (with `at_front`) prepended.
    ///
    /// A slot that does not resolve is skipped with a warning under
    /// [`SlotPolicy::Permissive`] and is an error under [`SlotPolicy::Strict`].
    pub fn add_component_to(&self, child: &impl Composable, slot: &str, at_front: bool) -> Result<()> {
        let child_host = child.component().host();
        let Some(target) = self.find(slot) else {
            return match self.ctx().config().slot_policy {
                SlotPolicy::Permissive => {
                    warn!(slot, "add_component: slot not found, child not attached");
                    Ok(())
                }
                SlotPolicy::Strict => Err(Error::SlotNotFound { id: slot.to_owned() }),
            };
        };
        let attached = self
            .document()
            .with_dom_mut(|dom| dom.reparent(child_host, target, at_front));
        if attached {
            self.ctx().lifecycle_mut().on_mount(child_host);
            debug!(slot, at_front, "component added");
        } else {
            warn!(slot, "add_component: refusing to attach a component inside itself");
        }
        Ok(())
    }

    /// Detach `child` from wherever it is mounted and hand it back.
    pub fn remove_component<C: Composable>(&self, child: C) -> C {
        let host = child.component().host();
        if self.document().with_dom_mut(|dom| dom.detach(host)) {
            self.ctx().lifecycle_mut().on_unmount(host);
            debug!(?host, "component removed");
        }
        child
    }

    /// Attach this component under an arbitrary document element.
    pub fn append_to_dom_element(&self, node: NodeId) -> bool {
        let host = self.inner.host;
        let attached = self
            .document()
            .with_dom_mut(|dom| dom.reparent(host, node, false));
        if attached {
            self.ctx().lifecycle_mut().on_mount(host);
        }
        attached
    }

    // ── DOM passthroughs ─────────────────────────────────────────────

    /// Focus the element `id`.
    pub fn focus(&self, id: &str) -> Result<()> {
        let node = self.element(id)?;
        self.document().focus(node);
        Ok(())
    }

    /// Click the element `id`. Returns the number of listeners that ran.
    pub fn click(&self, id: &str) -> Result<usize> {
        let node = self.element(id)?;
        Ok(self.document().click(node))
    }

    /// Read the value of the form element `id`.
    pub fn get_value(&self, id: &str) -> Result<String> {
        let node = self.element(id)?;
        self.document().value(node)
    }

    /// Write the value of the form element `id` without firing events.
    pub fn set_value(&self, id: &str, value: &str) -> Result<()> {
        let node = self.element(id)?;
        if self.document().set_value(node, value) {
            Ok(())
        } else {
            self.document().value(node).map(|_| ())
        }
    }

    /// Serialized children of element `id`.
    pub fn inner_html(&self, id: &str) -> Result<String> {
        let node = self.element(id)?;
        Ok(self.document().inner_html(node))
    }

    /// Text content of element `id`.
    pub fn text(&self, id: &str) -> Result<String> {
        let node = self.element(id)?;
        Ok(self.document().with_dom(|dom| dom.text_content(node)))
    }

    /// Serialized template wrapper, without the injected styles.
    pub fn root_html(&self) -> String {
        self.document().inner_html(self.inner.root)
    }

    /// Serialized host element including its shadow tree.
    pub fn outer_html(&self) -> String {
        self.document()
            .with_dom(|dom| dom.outer_html(self.inner.host))
    }

    /// Issue an HTTP request through the context's network service.
    pub fn ajax(
        &self,
        url: &str,
        method: HttpMethod,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> EventSubject<Value> {
        self.ctx().ajax(url, method, headers, body)
    }

    // ── Teardown ─────────────────────────────────────────────────────

    pub(crate) fn own_timer(&self, id: TimerId) {
        self.inner.timers.borrow_mut().push(id);
    }

    /// Number of live timers owned by this component.
    pub fn timer_count(&self) -> usize {
        let scheduler = self.ctx().scheduler();
        self.inner
            .timers
            .borrow()
            .iter()
            .filter(|&&id| scheduler.is_active(id))
            .count()
    }

    /// Cancel owned timers, detach the host and free the whole tree.
    /// Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let timers = std::mem::take(&mut *self.inner.timers.borrow_mut());
        let scheduler = self.ctx().scheduler();
        for id in timers {
            scheduler.cancel(id);
        }
        let host = self.inner.host;
        let removed = self.document().remove_node(host);
        self.ctx().lifecycle_mut().on_unmount(host);
        debug!(?host, removed, "component disposed");
    }
}
