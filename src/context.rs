//! Context: the services a component tree shares.
//!
//! A [`Context`] bundles the document, the window, the timer scheduler, the
//! configuration, and the lazily created resize notifier, network service
//! and dialog manager. Components receive it explicitly at construction;
//! nothing in the crate is process-global.

use std::cell::{Cell, OnceCell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::app::AppConfig;
use crate::component::lifecycle::{LifecycleEvent, LifecycleTracker};
use crate::document::Document;
use crate::event::{EventType, WindowEvent};
use crate::net::{HttpMethod, HttpRequest, Network, ReqwestTransport, Transport};
use crate::reactive::EventSubject;
use crate::timer::Scheduler;
use crate::widgets::dialog::DialogManager;
use crate::window::{Size, Window};

struct ContextInner {
    config: AppConfig,
    document: Document,
    window: Window,
    scheduler: Scheduler,
    resize: OnceCell<EventSubject<Size>>,
    transport: RefCell<Option<Arc<dyn Transport>>>,
    network: OnceCell<Rc<Network>>,
    dialogs: DialogManager,
    lifecycle: RefCell<LifecycleTracker>,
    lifecycle_events: EventSubject<LifecycleEvent>,
    quit: Cell<bool>,
}

/// Shared handle to the services of one application.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("document", &self.inner.document)
            .field("window", &self.inner.window)
            .field("scheduler", &self.inner.scheduler)
            .field("dialogs", &self.inner.dialogs.len())
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Context {
    /// Create a context with a fresh document sized and styled per `config`.
    pub fn new(config: AppConfig) -> Self {
        let document = Document::new();
        if let Some(title) = &config.title {
            document.set_title(title);
        }
        for css in &config.stylesheets {
            document.add_stylesheet(css);
        }
        let window = Window::new(config.viewport);
        debug!(viewport = ?config.viewport, policy = ?config.slot_policy, "context created");
        Self {
            inner: Rc::new(ContextInner {
                config,
                document,
                window,
                scheduler: Scheduler::new(),
                resize: OnceCell::new(),
                transport: RefCell::new(None),
                network: OnceCell::new(),
                dialogs: DialogManager::new(),
                lifecycle: RefCell::new(LifecycleTracker::new()),
                lifecycle_events: EventSubject::new(),
                quit: Cell::new(false),
            }),
        }
    }

    /// Like [`new`](Self::new), but requests go through `transport` instead
    /// of the default reqwest client.
    pub fn with_transport(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
        let ctx = Self::new(config);
        ctx.set_transport(transport);
        ctx
    }

    /// Replace the transport. Has no effect once a request has been made.
    pub fn set_transport(&self, transport: Arc<dyn Transport>) {
        if self.inner.network.get().is_some() {
            debug!("network already started; transport override ignored");
            return;
        }
        *self.inner.transport.borrow_mut() = Some(transport);
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn window(&self) -> &Window {
        &self.inner.window
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn dialogs(&self) -> &DialogManager {
        &self.inner.dialogs
    }

    /// The lifecycle tracker, after releasing hosts whose nodes were freed.
    pub fn lifecycle(&self) -> Ref<'_, LifecycleTracker> {
        self.release_freed_hosts();
        self.inner.lifecycle.borrow()
    }

    /// Take the queued lifecycle events, oldest first.
    pub fn drain_lifecycle(&self) -> Vec<LifecycleEvent> {
        self.release_freed_hosts();
        self.inner.lifecycle.borrow_mut().drain()
    }

    /// Subject that [`flush_lifecycle`](Self::flush_lifecycle) (and so every
    /// run-loop step) forwards lifecycle events to.
    pub fn lifecycle_events(&self) -> EventSubject<LifecycleEvent> {
        self.inner.lifecycle_events.clone()
    }

    /// Drain the lifecycle log into [`lifecycle_events`](Self::lifecycle_events).
    /// Events nobody subscribed to are dropped.
    pub fn flush_lifecycle(&self) -> usize {
        let events = self.drain_lifecycle();
        for event in &events {
            self.inner.lifecycle_events.next(event);
        }
        events.len()
    }

    fn release_freed_hosts(&self) {
        let Ok(mut tracker) = self.inner.lifecycle.try_borrow_mut() else {
            return;
        };
        let released = self
            .inner
            .document
            .with_dom(|dom| tracker.release_freed(|host| dom.contains(host)));
        if released > 0 {
            debug!(released, "freed component hosts unmounted");
        }
    }

    pub(crate) fn lifecycle_mut(&self) -> RefMut<'_, LifecycleTracker> {
        self.inner.lifecycle.borrow_mut()
    }

    /// The viewport-size broadcast.
    ///
    /// The first call installs a single native `resize` listener on the
    /// window; every caller shares the returned subject.
    pub fn resize_notifier(&self) -> EventSubject<Size> {
        self.inner
            .resize
            .get_or_init(|| {
                let subject = EventSubject::new();
                let fan_out = subject.clone();
                self.inner
                    .window
                    .add_listener(EventType::Resize, move |ev: &WindowEvent| {
                        fan_out.next(&ev.size)
                    });
                debug!("resize notifier installed");
                subject
            })
            .clone()
    }

    /// The network service, created on first use.
    pub fn network(&self) -> Rc<Network> {
        Rc::clone(self.inner.network.get_or_init(|| {
            let transport = self
                .inner
                .transport
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
            Rc::new(Network::new(transport))
        }))
    }

    /// Deliver finished requests without creating the network service.
    pub fn pump_network(&self) -> usize {
        self.inner.network.get().map_or(0, |network| network.pump())
    }

    /// Wait for every outstanding request and deliver it.
    pub async fn settle_network(&self) -> usize {
        let Some(network) = self.inner.network.get().cloned() else {
            return 0;
        };
        network.settle().await
    }

    /// Issue an HTTP request. The subject emits the parsed JSON body, or an
    /// error on its error channel for transport failures, non-2xx statuses
    /// and undecodable bodies.
    pub fn ajax(
        &self,
        url: &str,
        method: HttpMethod,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> EventSubject<Value> {
        let mut request = HttpRequest::new(method, url);
        for (name, value) in headers {
            request = request.with_header(*name, *value);
        }
        if let Some(body) = body {
            request = request.with_body(body);
        }
        self.network().ajax(request)
    }

    /// Ask the run loop to stop.
    pub fn quit(&self) {
        self.inner.quit.set(true);
    }

    pub fn quit_requested(&self) -> bool {
        self.inner.quit.get()
    }

    pub(crate) fn reset_quit(&self) {
        self.inner.quit.set(false);
    }

    /// Whether two handles share the same services.
    pub fn same_context(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
