//! Modal dialog built as a component, and the per-context dialog stack.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::component::{Binding, Component, Composable};
use crate::context::Context;
use crate::dom::NodeData;
use crate::error::Result;
use crate::reactive::{EventSubject, Property};

const TEMPLATE: &str = concat!(
    r#"<div id="background" class="ez-dialog-background">"#,
    r#"<div id="dialog" class="ez-dialog" role="dialog">"#,
    r#"<div id="title" class="ez-dialog-title"></div>"#,
    r#"<div id="message" class="ez-dialog-message"></div>"#,
    r#"<div id="buttons" class="ez-dialog-buttons"></div>"#,
    r#"</div></div>"#,
);

const CSS: &str = "\
.ez-dialog-background { position: fixed; inset: 0; align-items: center; justify-content: center; background: rgba(0, 0, 0, 0.4); }
.ez-dialog { min-width: 16rem; padding: 1rem; background: white; border-radius: 4px; }
.ez-dialog-title { font-weight: bold; margin-bottom: 0.5rem; }
.ez-dialog-buttons { display: flex; gap: 0.5rem; justify-content: flex-end; margin-top: 1rem; }";

/// Id of the `index`-th button of a dialog.
pub fn button_id(index: usize) -> String {
    format!("ez-dialog-button-{index}")
}

/// A modal overlay with a title, a message and a row of buttons.
pub struct Dialog {
    base: Component,
    /// Title text (markup).
    pub title: Property<String>,
    /// Message text (markup).
    pub message: Property<String>,
    display: Property<String>,
    buttons: RefCell<Vec<String>>,
    closed: EventSubject<String>,
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("title", &self.title.get())
            .field("buttons", &self.buttons.borrow())
            .field("visible", &self.is_visible())
            .finish()
    }
}

impl Composable for Dialog {
    fn component(&self) -> &Component {
        &self.base
    }
}

impl Dialog {
    /// Build a hidden, empty dialog.
    pub fn new(ctx: &Context) -> Result<Rc<Self>> {
        let this = Rc::new(Self {
            base: Component::new(ctx, TEMPLATE, CSS),
            title: Property::new("title", String::new()),
            message: Property::new("message", String::new()),
            display: Property::new("display", "none".to_string()),
            buttons: RefCell::new(Vec::new()),
            closed: EventSubject::new(),
        });
        this.base
            .bind(&this.title, Binding::inner_markup("title"))?
            .bind(&this.message, Binding::inner_markup("message"))?
            .bind(&this.display, Binding::style("background", "display"))?;
        Ok(this)
    }

    /// Build, fill, attach and show a dialog in one go.
    ///
    /// The returned subject emits the label of the clicked button; the
    /// dialog then removes itself.
    pub fn popup(
        ctx: &Context,
        attach_to: &impl Composable,
        message: &str,
        title: &str,
        buttons: &[&str],
        button_class: &str,
    ) -> Result<EventSubject<String>> {
        let dialog = Self::new(ctx)?;
        dialog.title.set(title.to_owned());
        dialog.message.set(message.to_owned());
        for label in buttons {
            dialog.add_button(label, button_class)?;
        }
        attach_to.component().add_component(&dialog)?;
        dialog.show(true);
        ctx.dialogs().push(Rc::clone(&dialog));
        debug!(title, buttons = buttons.len(), "popup shown");
        Ok(dialog.closed())
    }

    /// Append a button. Clicking it closes the dialog with `label`.
    pub fn add_button(self: &Rc<Self>, label: &str, class: &str) -> Result<String> {
        let index = self.buttons.borrow().len();
        let id = button_id(index);
        let row = self.base.element("buttons")?;
        self.base.document().with_dom_mut(|dom| {
            let button = dom.insert_child(
                row,
                NodeData::element("button")
                    .with_id(id.as_str())
                    .with_classes(class.split_whitespace()),
            );
            dom.insert_child(button, NodeData::text(label));
        });
        self.buttons.borrow_mut().push(label.to_owned());
        let label = label.to_owned();
        self.base
            .on_click(&id, self, move |dialog, _| dialog.close_with(&label))?;
        Ok(id)
    }

    /// Show or hide the scrim.
    pub fn show(&self, visible: bool) {
        self.display
            .set(if visible { "flex" } else { "none" }.to_string());
    }

    pub fn is_visible(&self) -> bool {
        self.display.with(|d| d != "none")
    }

    /// Button labels in order.
    pub fn buttons(&self) -> Vec<String> {
        self.buttons.borrow().clone()
    }

    /// Emits the clicked button's label.
    pub fn closed(&self) -> EventSubject<String> {
        self.closed.clone()
    }

    /// Click the `index`-th button. Returns `false` if there is none.
    pub fn click_button(&self, index: usize) -> bool {
        if index >= self.buttons.borrow().len() {
            return false;
        }
        self.base.click(&button_id(index)).is_ok()
    }

    /// Emit `label`, hide, detach and release the dialog.
    pub fn close_with(self: &Rc<Self>, label: &str) {
        debug!(label, "dialog closed");
        self.closed.next(&label.to_owned());
        self.show(false);
        let ctx = self.base.ctx().clone();
        if let Some(parent) = self.base.host_parent() {
            self.base.document().with_dom_mut(|dom| dom.detach(self.base.host()));
            debug!(?parent, "dialog detached");
        }
        ctx.dialogs().remove(self);
        self.base.dispose();
    }
}

// ---------------------------------------------------------------------------
// DialogManager
// ---------------------------------------------------------------------------

/// Stack of the dialogs currently shown in one context, most recent on top.
#[derive(Default)]
pub struct DialogManager {
    stack: RefCell<Vec<Rc<Dialog>>>,
}

impl fmt::Debug for DialogManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogManager")
            .field("open", &self.len())
            .finish()
    }
}

impl DialogManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, dialog: Rc<Dialog>) {
        self.stack.borrow_mut().push(dialog);
    }

    /// Remove `dialog` wherever it sits in the stack.
    pub fn remove(&self, dialog: &Rc<Dialog>) -> bool {
        let mut stack = self.stack.borrow_mut();
        let before = stack.len();
        stack.retain(|d| !Rc::ptr_eq(d, dialog));
        stack.len() != before
    }

    /// The most recently shown dialog still open.
    pub fn top(&self) -> Option<Rc<Dialog>> {
        self.stack.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.stack.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.borrow().is_empty()
    }

    /// Click button `index` of the top dialog.
    pub fn click_popup_button(&self, index: usize) -> bool {
        match self.top() {
            Some(dialog) => dialog.click_button(index),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(ctx: &Context) -> Component {
        let page = Component::new(ctx, "<main></main>", "");
        page.append_to_dom_element(ctx.document().body());
        page
    }

    #[test]
    fn popup_fills_and_shows() {
        let ctx = Context::default();
        let page = page(&ctx);
        Dialog::popup(&ctx, &page, "Delete?", "Confirm", &["Yes", "No"], "btn primary").unwrap();
        let dialog = ctx.dialogs().top().unwrap();
        assert!(dialog.is_visible());
        assert_eq!(dialog.buttons(), vec!["Yes", "No"]);
        assert_eq!(dialog.component().text("title").unwrap(), "Confirm");
        assert_eq!(dialog.component().text("message").unwrap(), "Delete?");
        assert_eq!(
            dialog.component().inner_html("buttons").unwrap(),
            concat!(
                r#"<button id="ez-dialog-button-0" class="btn primary">Yes</button>"#,
                r#"<button id="ez-dialog-button-1" class="btn primary">No</button>"#
            )
        );
    }

    #[test]
    fn clicking_emits_the_label_and_detaches() {
        let ctx = Context::default();
        let page = page(&ctx);
        let closed = Dialog::popup(&ctx, &page, "Sure?", "", &["Yes", "No"], "").unwrap();
        let got = Rc::new(RefCell::new(Vec::new()));
        let g = Rc::clone(&got);
        closed.subscribe(move |label: &String| g.borrow_mut().push(label.clone()));

        let dialog = ctx.dialogs().top().unwrap();
        assert!(ctx.dialogs().click_popup_button(1));
        assert_eq!(*got.borrow(), vec!["No"]);
        assert!(!dialog.component().is_mounted());
        assert!(dialog.component().is_disposed());
        assert!(ctx.dialogs().is_empty());
        assert_eq!(page.root_html(), "<main></main>");
    }

    #[test]
    fn nested_dialogs_close_top_first() {
        let ctx = Context::default();
        let page = page(&ctx);
        let outer = Dialog::popup(&ctx, &page, "outer", "", &["A"], "").unwrap();
        let inner = Dialog::popup(&ctx, &page, "inner", "", &["B"], "").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        for subject in [&outer, &inner] {
            let log = Rc::clone(&log);
            subject.subscribe(move |label: &String| log.borrow_mut().push(label.clone()));
        }
        assert_eq!(ctx.dialogs().len(), 2);
        assert!(ctx.dialogs().click_popup_button(0));
        assert!(ctx.dialogs().click_popup_button(0));
        assert_eq!(*log.borrow(), vec!["B", "A"]);
        assert!(!ctx.dialogs().click_popup_button(0));
    }

    #[test]
    fn out_of_range_button() {
        let ctx = Context::default();
        let page = page(&ctx);
        Dialog::popup(&ctx, &page, "m", "t", &["Ok"], "").unwrap();
        assert!(!ctx.dialogs().click_popup_button(3));
        assert_eq!(ctx.dialogs().len(), 1);
    }
}
