//! Binding a [`Property`] to an element of a component's tree.
//!
//! [`Component::bind`] resolves the element, paints the property's current
//! value once, then appends a sink that repaints on every write. Several
//! bindings may share one property; their sinks run in registration order.
//! Only one of them may be a [`BindingKind::Value`] binding, because that
//! kind also owns the reverse `input` channel from the element back into the
//! property.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use super::Component;
use crate::document::Document;
use crate::dom::{Dom, NodeData, NodeId};
use crate::error::{Error, Result};
use crate::event::{DomEvent, EventType};
use crate::markup::style;
use crate::reactive::{Pipe, Property};

// ---------------------------------------------------------------------------
// BindValue
// ---------------------------------------------------------------------------

/// Conversion between a property's value type and DOM strings.
pub trait BindValue: Clone + 'static {
    /// Text written into the DOM.
    fn to_dom(&self) -> String;

    /// Parse a value read back from a form element. `None` leaves the
    /// property unchanged.
    fn from_dom(raw: &str) -> Option<Self>;

    /// Checked state for checkbox/radio targets. `None` falls back to the
    /// value.
    fn to_checked(&self) -> Option<bool> {
        None
    }

    fn from_checked(_checked: bool) -> Option<Self> {
        None
    }

    /// Attribute text; `None` removes the attribute.
    fn to_attribute(&self) -> Option<String> {
        let text = self.to_dom();
        (!text.is_empty()).then_some(text)
    }
}

impl BindValue for String {
    fn to_dom(&self) -> String {
        self.clone()
    }

    fn from_dom(raw: &str) -> Option<Self> {
        Some(raw.to_owned())
    }
}

impl BindValue for bool {
    fn to_dom(&self) -> String {
        self.to_string()
    }

    fn from_dom(raw: &str) -> Option<Self> {
        match raw.trim() {
            "true" | "on" | "1" => Some(true),
            "false" | "off" | "0" | "" => Some(false),
            _ => None,
        }
    }

    fn to_checked(&self) -> Option<bool> {
        Some(*self)
    }

    fn from_checked(checked: bool) -> Option<Self> {
        Some(checked)
    }

    /// Boolean attributes are present (empty) or absent.
    fn to_attribute(&self) -> Option<String> {
        self.then(String::new)
    }
}

impl BindValue for char {
    fn to_dom(&self) -> String {
        self.to_string()
    }

    fn from_dom(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(ch),
            _ => None,
        }
    }
}

macro_rules! bind_value_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BindValue for $ty {
                fn to_dom(&self) -> String {
                    self.to_string()
                }

                fn from_dom(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }
        )*
    };
}

bind_value_via_parse!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: BindValue> BindValue for Option<T> {
    fn to_dom(&self) -> String {
        self.as_ref().map(BindValue::to_dom).unwrap_or_default()
    }

    fn from_dom(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            Some(None)
        } else {
            T::from_dom(raw).map(Some)
        }
    }

    fn to_attribute(&self) -> Option<String> {
        self.as_ref().and_then(BindValue::to_attribute)
    }
}

// ---------------------------------------------------------------------------
// Binding descriptor
// ---------------------------------------------------------------------------

/// How a value is applied to its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    /// One inline style property.
    Style(String),
    /// A whitespace-separated class token list.
    ClassList,
    /// The element's content, parsed as markup.
    InnerMarkup,
    /// Form value (two-way).
    Value,
    /// One attribute, removed when the value is empty or `false`.
    Attribute(String),
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Style(prop) => write!(f, "style({prop})"),
            Self::ClassList => f.write_str("class"),
            Self::InnerMarkup => f.write_str("html"),
            Self::Value => f.write_str("value"),
            Self::Attribute(name) => write!(f, "attr({name})"),
        }
    }
}

/// Which element a property is bound to, and how.
pub struct Binding<T> {
    id: String,
    kind: BindingKind,
    transform: Option<Pipe<T>>,
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl<T> Binding<T> {
    fn new(id: impl Into<String>, kind: BindingKind) -> Self {
        Self {
            id: id.into(),
            kind,
            transform: None,
        }
    }

    /// Bind to the inline style property `property` (`backgroundColor` and
    /// `background-color` are equivalent).
    pub fn style(id: impl Into<String>, property: &str) -> Self {
        Self::new(id, BindingKind::Style(style::normalize_property(property)))
    }

    pub fn class_list(id: impl Into<String>) -> Self {
        Self::new(id, BindingKind::ClassList)
    }

    pub fn inner_markup(id: impl Into<String>) -> Self {
        Self::new(id, BindingKind::InnerMarkup)
    }

    pub fn value(id: impl Into<String>) -> Self {
        Self::new(id, BindingKind::Value)
    }

    pub fn attribute(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, BindingKind::Attribute(name.into()))
    }

    /// Transform applied by this binding only, after the property's pipes.
    pub fn transform(mut self, f: impl Fn(T) -> T + 'static) -> Self {
        self.transform = Some(Rc::new(f));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

impl Component {
    /// Bind `property` to an element of this component.
    ///
    /// Fails with [`Error::ElementNotFound`] if the id is not in this
    /// component's tree. Value bindings also fail with
    /// [`Error::NotValueElement`] on elements without form semantics and with
    /// [`Error::DuplicateValueBinding`] if the property already has one.
    ///
    /// An attribute binding on `class` behaves as a class-list binding, so
    /// template classes survive. Binding the `id` attribute is refused with
    /// [`Error::ReservedAttribute`].
    pub fn bind<T: BindValue>(&self, property: &Property<T>, binding: Binding<T>) -> Result<&Self> {
        let Binding { id, kind, transform } = binding;
        let kind = match kind {
            BindingKind::Attribute(name) if name.eq_ignore_ascii_case("class") => {
                BindingKind::ClassList
            }
            BindingKind::Attribute(name) if name.eq_ignore_ascii_case("id") => {
                return Err(Error::ReservedAttribute { id, name });
            }
            kind => kind,
        };
        let node = self.element(&id)?;
        let document = self.document().clone();

        if kind == BindingKind::Value {
            let tag = document.with_dom(|dom| {
                dom.get(node)
                    .filter(|d| !d.has_value_semantics())
                    .map(|d| d.tag().unwrap_or("#node").to_owned())
            });
            if let Some(tag) = tag {
                return Err(Error::NotValueElement { id, tag });
            }
            property.claim_value_binding(&id)?;
        }

        let sink = dom_sink::<T>(document.clone(), node, &kind);
        let apply = move |value: &T| match &transform {
            Some(transform) => sink(&transform(value.clone())),
            None => sink(value),
        };
        apply(&property.piped());
        property.push_sink(format!("{kind}#{id}"), apply);

        if kind == BindingKind::Value {
            let weak = property.downgrade();
            document.add_event_listener(node, EventType::Input, move |event: &DomEvent| {
                let Some(property) = weak.upgrade() else {
                    return;
                };
                let parsed = event
                    .checked
                    .and_then(T::from_checked)
                    .or_else(|| event.value.as_deref().and_then(T::from_dom));
                match parsed {
                    Some(value) => property.set(value),
                    None => trace!(field = property.name(), "input value rejected"),
                }
            });
        }

        debug!(field = property.name(), %kind, id, "bound");
        Ok(self)
    }
}

fn dom_sink<T: BindValue>(document: Document, node: NodeId, kind: &BindingKind) -> Box<dyn Fn(&T)> {
    match kind.clone() {
        BindingKind::Style(property) => Box::new(move |value: &T| {
            let text = value.to_dom();
            document.with_dom_mut(|dom| set_style(dom, node, &property, &text));
        }),
        BindingKind::ClassList => {
            let previous: RefCell<Vec<String>> = RefCell::new(Vec::new());
            Box::new(move |value: &T| {
                let tokens: Vec<String> = value.to_dom().split_whitespace().map(str::to_owned).collect();
                document.with_dom_mut(|dom| {
                    if let Some(data) = dom.get_mut(node) {
                        for token in previous.borrow().iter() {
                            data.remove_class(token);
                        }
                        for token in &tokens {
                            data.add_class(token);
                        }
                    }
                });
                *previous.borrow_mut() = tokens;
            })
        }
        BindingKind::InnerMarkup => Box::new(move |value: &T| {
            document.set_inner_html(node, &value.to_dom());
        }),
        BindingKind::Value => Box::new(move |value: &T| {
            document.with_dom_mut(|dom| {
                let checkable = dom.get(node).is_some_and(NodeData::is_checkable);
                match value.to_checked() {
                    Some(checked) if checkable => {
                        dom.set_checked(node, checked);
                    }
                    _ => {
                        dom.set_form_value(node, &value.to_dom());
                    }
                }
            });
        }),
        BindingKind::Attribute(name) => Box::new(move |value: &T| {
            let text = value.to_attribute();
            document.with_dom_mut(|dom| {
                if let Some(data) = dom.get_mut(node) {
                    match text {
                        Some(text) => data.set_attribute(&name, text),
                        None => data.remove_attribute(&name),
                    }
                }
            });
        }),
    }
}

fn set_style(dom: &mut Dom, node: NodeId, property: &str, value: &str) {
    let Some(data) = dom.get_mut(node) else {
        return;
    };
    let current = data.attribute("style").unwrap_or_default();
    let updated = style::set_property(&current, property, value);
    if updated.is_empty() {
        data.remove_attribute("style");
    } else {
        data.set_attribute("style", updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use pretty_assertions::assert_eq;

    const FORM: &str = concat!(
        r#"<p id="label" class="item">x</p>"#,
        r#"<input id="name"><input id="done" type="checkbox">"#,
        r#"<select id="color"><option>red</option><option>green</option></select>"#,
        r#"<textarea id="notes"></textarea><button id="go">go</button>"#,
    );

    fn form() -> (Context, Component) {
        let ctx = Context::default();
        let c = Component::new(&ctx, FORM, "");
        (ctx, c)
    }

    fn attr(c: &Component, id: &str, name: &str) -> Option<String> {
        let node = c.element(id).unwrap();
        c.document().with_dom(|dom| dom.get(node).and_then(|d| d.attribute(name)))
    }

    #[test]
    fn initial_value_is_painted_at_bind_time() {
        let (_ctx, c) = form();
        let label = Property::new("label", "<b>hi</b>".to_string());
        c.bind(&label, Binding::inner_markup("label")).unwrap();
        assert_eq!(c.inner_html("label").unwrap(), "<b>hi</b>");
    }

    #[test]
    fn style_binding_sets_one_property() {
        let (_ctx, c) = form();
        let color = Property::new("color", "red".to_string());
        c.bind(&color, Binding::style("label", "backgroundColor")).unwrap();
        assert_eq!(attr(&c, "label", "style").as_deref(), Some("background-color: red;"));
        color.set(String::new());
        assert_eq!(attr(&c, "label", "style"), None);
    }

    #[test]
    fn class_binding_replaces_only_its_own_tokens() {
        let (_ctx, c) = form();
        let state = Property::new("state", "a b".to_string());
        c.bind(&state, Binding::class_list("label")).unwrap();
        state.set("c".into());
        state.set("d e".into());
        assert_eq!(attr(&c, "label", "class").as_deref(), Some("item d e"));
    }

    #[test]
    fn attribute_binding_removes_on_empty_and_false() {
        let (_ctx, c) = form();
        let title = Property::new("title", "tip".to_string());
        let disabled = Property::new("disabled", true);
        c.bind(&title, Binding::attribute("go", "title")).unwrap();
        c.bind(&disabled, Binding::attribute("go", "disabled")).unwrap();
        assert_eq!(attr(&c, "go", "disabled").as_deref(), Some(""));
        title.set(String::new());
        disabled.set(false);
        assert_eq!(attr(&c, "go", "title"), None);
        assert_eq!(attr(&c, "go", "disabled"), None);
    }

    #[test]
    fn class_attribute_binding_keeps_template_classes() {
        let (_ctx, c) = form();
        let state = Property::new("state", "open".to_string());
        c.bind(&state, Binding::attribute("label", "class")).unwrap();
        assert_eq!(state.sink_labels(), vec!["class#label"]);
        state.set("closed".into());
        assert_eq!(attr(&c, "label", "class").as_deref(), Some("item closed"));
    }

    #[test]
    fn id_attribute_binding_is_rejected() {
        let (_ctx, c) = form();
        let key = Property::new("key", "other".to_string());
        assert_eq!(
            c.bind(&key, Binding::attribute("label", "ID")).unwrap_err(),
            Error::ReservedAttribute {
                id: "label".into(),
                name: "ID".into()
            }
        );
        assert!(key.sink_labels().is_empty());
        assert!(c.element("label").is_ok());
    }

    #[test]
    fn style_write_keeps_neighbouring_values_with_semicolons() {
        let (_ctx, c) = form();
        let image = Property::new("image", r#"url("data:image/png;base64,AAAA")"#.to_string());
        let color = Property::new("color", "red".to_string());
        c.bind(&image, Binding::style("label", "backgroundImage")).unwrap();
        c.bind(&color, Binding::style("label", "color")).unwrap();
        color.set("blue".into());
        assert_eq!(
            attr(&c, "label", "style").as_deref(),
            Some(r#"background-image: url("data:image/png;base64,AAAA"); color: blue;"#)
        );
        image.set(r#"url('a;b.png')"#.into());
        assert_eq!(
            attr(&c, "label", "style").as_deref(),
            Some(r#"background-image: url('a;b.png'); color: blue;"#)
        );
    }

    #[test]
    fn style_value_with_semicolon_is_stored_whole() {
        let (_ctx, c) = form();
        let marker = Property::new("marker", r#"";""#.to_string());
        c.bind(&marker, Binding::style("label", "content")).unwrap();
        assert_eq!(attr(&c, "label", "style").as_deref(), Some(r#"content: ";";"#));
        marker.set(String::new());
        assert_eq!(attr(&c, "label", "style"), None);
    }

    #[test]
    fn option_value_binding_sets_value_and_text() {
        let ctx = Context::default();
        let c = Component::new(
            &ctx,
            r#"<select id="size"><option id="custom">m</option><option>l</option></select>"#,
            "",
        );
        let size = Property::new("size", "xl".to_string());
        c.bind(&size, Binding::value("custom")).unwrap();
        assert_eq!(attr(&c, "custom", "value").as_deref(), Some("xl"));
        assert_eq!(c.inner_html("custom").unwrap(), "xl");
        assert_eq!(c.get_value("custom").unwrap(), "xl");

        size.set("xxl".into());
        assert_eq!(c.get_value("custom").unwrap(), "xxl");
        assert_eq!(c.inner_html("custom").unwrap(), "xxl");
        assert_eq!(c.get_value("size").unwrap(), "xxl");
    }

    #[test]
    fn pipes_then_binding_transform() {
        let (_ctx, c) = form();
        let name = Property::new("name", "ada".to_string());
        name.pipe(|s| s.to_uppercase());
        c.bind(&name, Binding::inner_markup("label").transform(|s| format!("[{s}]")))
            .unwrap();
        assert_eq!(c.inner_html("label").unwrap(), "[ADA]");
        assert_eq!(name.get(), "ada");
    }

    #[test]
    fn stacked_sinks_run_in_registration_order() {
        let (_ctx, c) = form();
        let state = Property::new("state", "open".to_string());
        c.bind(&state, Binding::inner_markup("label"))
            .unwrap()
            .bind(&state, Binding::class_list("label"))
            .unwrap();
        assert_eq!(state.sink_labels(), vec!["html#label", "class#label"]);
        state.set("closed".into());
        assert_eq!(c.inner_html("label").unwrap(), "closed");
        assert_eq!(attr(&c, "label", "class").as_deref(), Some("item closed"));
    }

    #[test]
    fn two_way_value_binding() {
        let (ctx, c) = form();
        let name = Property::new("name", "ada".to_string());
        c.bind(&name, Binding::value("name")).unwrap();
        assert_eq!(c.get_value("name").unwrap(), "ada");

        let node = c.element("name").unwrap();
        ctx.document().set_value(node, "grace");
        ctx.document().dispatch_event(node, EventType::Input);
        assert_eq!(name.get(), "grace");
    }

    #[test]
    fn checkbox_binds_checked_state() {
        let (ctx, c) = form();
        let done = Property::new("done", false);
        c.bind(&done, Binding::value("done")).unwrap();
        let node = c.element("done").unwrap();
        done.set(true);
        assert!(ctx.document().with_dom(|dom| dom.checked(node)));

        ctx.document().set_checked(node, false);
        ctx.document().dispatch_event(node, EventType::Input);
        assert!(!done.get());
    }

    #[test]
    fn select_and_textarea_values() {
        let (_ctx, c) = form();
        let color = Property::new("color", "green".to_string());
        let notes = Property::new("notes", "hello".to_string());
        c.bind(&color, Binding::value("color")).unwrap();
        c.bind(&notes, Binding::value("notes")).unwrap();
        assert_eq!(c.get_value("color").unwrap(), "green");
        assert_eq!(c.get_value("notes").unwrap(), "hello");
    }

    #[test]
    fn numeric_input_ignores_unparsable_text() {
        let (ctx, c) = form();
        let count = Property::new("count", 3_i32);
        c.bind(&count, Binding::value("name")).unwrap();
        let node = c.element("name").unwrap();
        ctx.document().set_value(node, "abc");
        ctx.document().dispatch_event(node, EventType::Input);
        assert_eq!(count.get(), 3);
        ctx.document().set_value(node, " 42 ");
        ctx.document().dispatch_event(node, EventType::Input);
        assert_eq!(count.get(), 42);
    }

    #[test]
    fn second_value_binding_is_rejected() {
        let (_ctx, c) = form();
        let name = Property::new("name", String::new());
        c.bind(&name, Binding::value("name")).unwrap();
        let err = c.bind(&name, Binding::value("notes")).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateValueBinding {
                field: "name".into(),
                existing: "name".into(),
                id: "notes".into()
            }
        );
    }

    #[test]
    fn value_binding_requires_a_form_element() {
        let (_ctx, c) = form();
        let name = Property::new("name", String::new());
        assert_eq!(
            c.bind(&name, Binding::value("label")).unwrap_err(),
            Error::NotValueElement {
                id: "label".into(),
                tag: "p".into()
            }
        );
    }

    #[test]
    fn missing_id_fails() {
        let (_ctx, c) = form();
        let name = Property::new("name", String::new());
        assert_eq!(
            c.bind(&name, Binding::inner_markup("ghost")).unwrap_err(),
            Error::ElementNotFound { id: "ghost".into() }
        );
        assert!(name.sink_labels().is_empty());
    }

    #[test]
    fn bind_value_conversions() {
        assert_eq!(bool::from_dom("on"), Some(true));
        assert_eq!(char::from_dom("ab"), None);
        assert_eq!(<Option<u8>>::from_dom(""), Some(None));
        assert_eq!(Some(5_u8).to_dom(), "5");
        assert_eq!(f64::from_dom("2.5"), Some(2.5));
        assert_eq!(false.to_attribute(), None);
    }
}
