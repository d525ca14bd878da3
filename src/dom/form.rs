//! Form-control state: value, checkedness, selection.
//!
//! Each value-bearing element reads and writes its value slightly
//! differently:
//!
//! | element    | read                                   | write                          |
//! |------------|----------------------------------------|--------------------------------|
//! | `input`    | live value, else `value` attribute     | live value                     |
//! | `textarea` | live value, else text content          | live value                     |
//! | `select`   | value of the selected (or first) option| selects the matching option    |
//! | `option`   | `value` attribute, else text content   | `value` attribute and text     |

use super::node::{NodeData, NodeId};
use super::tree::Dom;

impl Dom {
    /// Read the form value of `id`. `None` when the node has no value semantics.
    pub fn form_value(&self, id: NodeId) -> Option<String> {
        let data = self.get(id)?;
        match data.tag()? {
            "input" => Some(
                data.value
                    .clone()
                    .or_else(|| data.attribute("value"))
                    .unwrap_or_else(|| {
                        if data.is_checkable() {
                            "on".to_owned()
                        } else {
                            String::new()
                        }
                    }),
            ),
            "textarea" => Some(data.value.clone().unwrap_or_else(|| self.text_content(id))),
            "option" => Some(self.option_value(id)),
            "select" => {
                let options = self.options(id);
                let chosen = options
                    .iter()
                    .copied()
                    .find(|&opt| self.get(opt).is_some_and(|d| d.selected))
                    .or_else(|| options.first().copied());
                Some(chosen.map(|opt| self.option_value(opt)).unwrap_or_default())
            }
            _ => None,
        }
    }

    /// Write the form value of `id`. Returns `false` when the node has no
    /// value semantics.
    pub fn set_form_value(&mut self, id: NodeId, value: &str) -> bool {
        let Some(tag) = self.get(id).and_then(NodeData::tag).map(str::to_owned) else {
            return false;
        };
        match tag.as_str() {
            "input" | "textarea" => {
                if let Some(data) = self.get_mut(id) {
                    data.value = Some(value.to_owned());
                }
                true
            }
            "select" => {
                for opt in self.options(id) {
                    let matches = self.option_value(opt) == value;
                    if let Some(data) = self.get_mut(opt) {
                        data.selected = matches;
                    }
                }
                true
            }
            "option" => {
                if let Some(data) = self.get_mut(id) {
                    data.set_attribute("value", value);
                }
                self.clear_children(id);
                self.insert_child(id, NodeData::text(value));
                true
            }
            _ => false,
        }
    }

    /// Checkedness of a checkbox/radio input.
    pub fn checked(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|d| d.checked)
    }

    /// Set checkedness. Checking a radio unchecks radios sharing its `name`
    /// within the same scope. Returns `false` for non-checkable nodes.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> bool {
        let Some(data) = self.get(id).filter(|d| d.is_checkable()) else {
            return false;
        };
        let radio_group = (checked && data.attribute("type").as_deref() == Some("radio"))
            .then(|| data.attribute("name"))
            .flatten();
        if let Some(name) = radio_group {
            let scope = self.scope_of(id);
            for other in self.walk_depth_first(scope) {
                let same_group = self.get(other).is_some_and(|d| {
                    d.attribute("type").as_deref() == Some("radio")
                        && d.attribute("name").as_deref() == Some(name.as_str())
                });
                if same_group {
                    if let Some(d) = self.get_mut(other) {
                        d.checked = false;
                    }
                }
            }
        }
        if let Some(d) = self.get_mut(id) {
            d.checked = checked;
        }
        true
    }

    fn option_value(&self, id: NodeId) -> String {
        self.get(id)
            .and_then(|d| d.attribute("value"))
            .unwrap_or_else(|| self.text_content(id))
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.walk_depth_first(select)
            .into_iter()
            .filter(|&node| self.get(node).is_some_and(|d| d.is_tag("option")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_fragment;

    fn form() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("form"));
        parse_fragment(
            &mut dom,
            root,
            r#"<input id="name" value="ada">
<textarea id="notes">hello</textarea>
<select id="pick"><option value="a">A</option><option id="b" value="b">B</option><option>C</option></select>
<input id="r1" type="radio" name="g" checked><input id="r2" type="radio" name="g">
<div id="plain"></div>"#,
        );
        (dom, root)
    }

    fn node(dom: &Dom, root: NodeId, id: &str) -> NodeId {
        dom.find_in_scope(root, id).unwrap()
    }

    #[test]
    fn input_value_falls_back_to_attribute() {
        let (mut dom, root) = form();
        let input = node(&dom, root, "name");
        assert_eq!(dom.form_value(input).as_deref(), Some("ada"));
        assert!(dom.set_form_value(input, "grace"));
        assert_eq!(dom.form_value(input).as_deref(), Some("grace"));
        // The attribute keeps the default, as in browsers.
        assert_eq!(dom.get(input).unwrap().attribute("value").as_deref(), Some("ada"));
    }

    #[test]
    fn textarea_value_falls_back_to_text() {
        let (mut dom, root) = form();
        let notes = node(&dom, root, "notes");
        assert_eq!(dom.form_value(notes).as_deref(), Some("hello"));
        dom.set_form_value(notes, "bye");
        assert_eq!(dom.form_value(notes).as_deref(), Some("bye"));
    }

    #[test]
    fn select_reads_first_option_until_selected() {
        let (mut dom, root) = form();
        let pick = node(&dom, root, "pick");
        assert_eq!(dom.form_value(pick).as_deref(), Some("a"));
        dom.set_form_value(pick, "C");
        assert_eq!(dom.form_value(pick).as_deref(), Some("C"));
        dom.set_form_value(pick, "b");
        assert_eq!(dom.form_value(pick).as_deref(), Some("b"));
        assert!(dom.get(node(&dom, root, "b")).unwrap().selected);
    }

    #[test]
    fn option_write_sets_value_and_text() {
        let (mut dom, root) = form();
        let b = node(&dom, root, "b");
        dom.set_form_value(b, "beta");
        assert_eq!(dom.form_value(b).as_deref(), Some("beta"));
        assert_eq!(dom.text_content(b), "beta");
    }

    #[test]
    fn radios_in_a_group_are_exclusive() {
        let (mut dom, root) = form();
        let r1 = node(&dom, root, "r1");
        let r2 = node(&dom, root, "r2");
        assert!(dom.checked(r1));
        assert!(dom.set_checked(r2, true));
        assert!(!dom.checked(r1));
        assert!(dom.checked(r2));
    }

    #[test]
    fn non_form_elements_have_no_value() {
        let (mut dom, root) = form();
        let plain = node(&dom, root, "plain");
        assert_eq!(dom.form_value(plain), None);
        assert!(!dom.set_form_value(plain, "x"));
        assert!(!dom.set_checked(plain, true));
    }
}
