//! Snapshot rendering helpers.
//!
//! Functions converting component trees and documents into HTML strings
//! suitable for `insta` snapshots and plain assertions.

use crate::component::Composable;
use crate::context::Context;

/// The template part of a component (no injected styles, no host wrapper).
pub fn component_html(target: &impl Composable) -> String {
    target.component().root_html()
}

/// The full component: host, shadow root, styles and template.
pub fn component_outer_html(target: &impl Composable) -> String {
    target.component().outer_html()
}

/// The document's `<body>`, shadow trees included.
pub fn document_html(ctx: &Context) -> String {
    let document = ctx.document();
    document.inner_html(document.body())
}

/// Indent serialized HTML one element per line, for readable multi-line
/// snapshots. Text and inline content stay on their element's line.
pub fn pretty(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + html.len() / 4);
    let mut depth: usize = 0;
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        let text = rest[..start].trim();
        if !text.is_empty() {
            push_line(&mut out, depth, text);
        }
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start..=start + len];
        if tag.starts_with("</") {
            depth = depth.saturating_sub(1);
            push_line(&mut out, depth, tag);
        } else {
            push_line(&mut out, depth, tag);
            if !is_void_tag(tag) {
                depth += 1;
            }
        }
        rest = &rest[start + len + 1..];
    }
    let tail = rest.trim();
    if !tail.is_empty() {
        push_line(&mut out, depth, tail);
    }
    out.truncate(out.trim_end().len());
    out
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(line);
    out.push('\n');
}

fn is_void_tag(tag: &str) -> bool {
    let name: String = tag
        .trim_start_matches('<')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    crate::markup::parser::is_void(&name.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    #[test]
    fn component_html_skips_styles() {
        let ctx = Context::default();
        let c = Component::new(&ctx, "<p>hi</p>", "p { color: red; }");
        assert_eq!(component_html(&c), "<p>hi</p>");
        assert!(component_outer_html(&c).contains("p { color: red; }"));
    }

    #[test]
    fn document_html_shows_mounted_components() {
        let ctx = Context::default();
        let c = Component::new(&ctx, "<p>hi</p>", "");
        assert_eq!(document_html(&ctx), "");
        c.append_to_dom_element(ctx.document().body());
        insta::assert_snapshot!(pretty(&document_html(&ctx)), @r###"
        <div class="ez-host">
          <template shadowrootmode="open">
            <style>
            </style>
            <div id="root">
              <p>
                hi
              </p>
            </div>
          </template>
        </div>
        "###);
    }

    #[test]
    fn pretty_keeps_void_elements_flat() {
        assert_eq!(pretty("<div><input id=\"a\"><br></div>"), "<div>\n  <input id=\"a\">\n  <br>\n</div>");
    }
}
