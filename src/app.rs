//! App: configuration, bootstrap and the live run loop.
//!
//! [`App`] owns the [`Context`] and the entry component. [`App::bootstrap`]
//! mounts the entry component under the element with id [`MAIN_ID`] when the
//! page has one, otherwise under `<body>`. The run loop is a tokio interval
//! that advances the timer scheduler and delivers network completions.

use std::any::Any;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::component::Composable;
use crate::context::Context;
use crate::error::Result;
use crate::window::Size;

/// Reserved id of the element the entry component mounts under.
pub const MAIN_ID: &str = "ez-main";

// ---------------------------------------------------------------------------
// SlotPolicy
// ---------------------------------------------------------------------------

/// What `add_component` does when the target slot id does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotPolicy {
    /// Log a warning and do nothing.
    #[default]
    Permissive,
    /// Fail with [`Error::SlotNotFound`](crate::Error::SlotNotFound).
    Strict,
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Optional document title.
    pub title: Option<String>,
    /// Initial viewport size.
    pub viewport: Size,
    /// Missing-slot behaviour of `add_component`.
    pub slot_policy: SlotPolicy,
    /// Tick interval of the live run loop, in milliseconds.
    pub tick_ms: u64,
    /// Ambient stylesheets injected into `<head>` before any component is built.
    pub stylesheets: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: None,
            viewport: Size::new(1280, 720),
            slot_policy: SlotPolicy::Permissive,
            tick_ms: 16,
            stylesheets: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Development preset: strict slot resolution.
    pub fn development() -> Self {
        Self::default().with_slot_policy(SlotPolicy::Strict)
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the title (builder).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the viewport size (builder).
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Size::new(width, height);
        self
    }

    /// Set the slot policy (builder).
    pub fn with_slot_policy(mut self, policy: SlotPolicy) -> Self {
        self.slot_policy = policy;
        self
    }

    /// Set the run-loop tick interval (builder).
    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    /// Add an ambient stylesheet (builder).
    pub fn with_stylesheet(mut self, css: impl Into<String>) -> Self {
        self.stylesheets.push(css.into());
        self
    }

    /// The run-loop tick as a duration (never zero).
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The application: a context plus the entry component keeping it alive.
pub struct App {
    ctx: Context,
    entry: Option<Box<dyn Any>>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("ctx", &self.ctx)
            .field("bootstrapped", &self.entry.is_some())
            .finish()
    }
}

impl App {
    /// Create an app with a fresh document.
    pub fn new(config: AppConfig) -> Self {
        Self {
            ctx: Context::new(config),
            entry: None,
        }
    }

    /// The app's context.
    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// Replace the page body with `html`. Used by test harnesses to provide
    /// an isolated page before bootstrapping.
    pub fn load_test_html(&self, html: &str) {
        debug!(len = html.len(), "loading test page");
        self.ctx.document().replace_body(html);
    }

    /// Build the entry component and mount it.
    ///
    /// The app keeps a clone of the returned handle, so the entry component
    /// lives as long as the app.
    pub fn bootstrap<C, F>(&mut self, build: F) -> Result<C>
    where
        C: Composable + Clone + 'static,
        F: FnOnce(&Context) -> Result<C>,
    {
        let component = build(&self.ctx)?;
        let document = self.ctx.document();
        let target = document
            .get_element_by_id(MAIN_ID)
            .unwrap_or_else(|| document.body());
        component.component().append_to_dom_element(target);
        info!(under_main = target != document.body(), "application bootstrapped");
        self.entry = Some(Box::new(component.clone()));
        Ok(component)
    }

    /// The entry component, if bootstrapped with type `C`.
    pub fn entry<C: 'static>(&self) -> Option<&C> {
        self.entry.as_ref().and_then(|entry| entry.downcast_ref::<C>())
    }

    /// Advance timers by `elapsed`, deliver finished network requests and
    /// forward queued lifecycle events to
    /// [`Context::lifecycle_events`]. Returns the timer ticks plus the
    /// delivered requests.
    pub fn step(&self, elapsed: Duration) -> usize {
        let ticks = self.ctx.scheduler().advance(elapsed);
        let delivered = self.ctx.pump_network();
        let forwarded = self.ctx.flush_lifecycle();
        if forwarded > 0 {
            trace!(forwarded, "lifecycle events forwarded");
        }
        ticks + delivered
    }

    /// Drive the app for `duration` of wall-clock time, or until
    /// [`quit`](Self::quit) is requested.
    pub async fn run_for(&self, duration: Duration) {
        let tick = self.ctx.config().tick();
        let mut interval = tokio::time::interval(tick);
        let start = tokio::time::Instant::now();
        self.ctx.reset_quit();
        while !self.ctx.quit_requested() && start.elapsed() < duration {
            interval.tick().await;
            self.step(tick);
        }
        debug!(elapsed = ?start.elapsed(), "run loop finished");
    }

    /// Drive the app until [`quit`](Self::quit) is requested.
    pub async fn run(&self) {
        self.run_for(Duration::MAX).await;
    }

    /// Ask the run loop to stop after the current tick.
    pub fn quit(&self) {
        self.ctx.quit();
    }

    /// Whether a quit has been requested.
    pub fn should_quit(&self) -> bool {
        self.ctx.quit_requested()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
