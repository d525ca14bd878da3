//! Inline `style` attribute helpers.
//!
//! Declarations keep their source order; setting an existing property
//! replaces it in place, setting a new one appends.

/// Parse `"color: red; width: 10px"` into ordered `(property, value)` pairs.
///
/// Property names are lowercased and trimmed; empty or malformed
/// declarations are dropped. A `;` or `:` inside quotes or parentheses
/// belongs to the value, so `url("data:image/png;base64,...")` survives.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    split_top_level(style, ';')
        .into_iter()
        .filter_map(|decl| {
            let (name, value) = split_once_top_level(decl, ':')?;
            let name = name.trim();
            let name = if name.starts_with("--") {
                name.to_owned()
            } else {
                name.to_ascii_lowercase()
            };
            let value = value.trim();
            (!name.is_empty() && !value.is_empty()).then(|| (name, value.to_owned()))
        })
        .collect()
}

/// Byte offsets of every `sep` outside quotes and parentheses.
fn top_level_positions(text: &str, sep: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut escaped = false;
    for (at, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (_, '\\') => escaped = true,
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => positions.push(at),
            _ => {}
        }
    }
    positions
}

fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for at in top_level_positions(text, sep) {
        parts.push(&text[start..at]);
        start = at + sep.len_utf8();
    }
    parts.push(&text[start..]);
    parts
}

fn split_once_top_level(text: &str, sep: char) -> Option<(&str, &str)> {
    let at = top_level_positions(text, sep).into_iter().next()?;
    Some((&text[..at], &text[at + sep.len_utf8()..]))
}

/// Serialize declarations back into attribute form.
pub fn serialize_declarations(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Return `style` with `property` set to `value`. An empty value removes the
/// property, mirroring `element.style[prop] = ""`.
pub fn set_property(style: &str, property: &str, value: &str) -> String {
    let property = normalize_property(property);
    let mut declarations = parse_declarations(style);
    let value = value.trim();
    if value.is_empty() {
        declarations.retain(|(name, _)| *name != property);
    } else if let Some(slot) = declarations.iter_mut().find(|(name, _)| *name == property) {
        slot.1 = value.to_owned();
    } else {
        declarations.push((property, value.to_owned()));
    }
    serialize_declarations(&declarations)
}

/// Read one property from a style attribute.
pub fn get_property(style: &str, property: &str) -> Option<String> {
    let property = normalize_property(property);
    parse_declarations(style)
        .into_iter()
        .find(|(name, _)| *name == property)
        .map(|(_, value)| value)
}

/// Accept both `backgroundColor` and `background-color`. Custom properties
/// (`--name`) are case-sensitive and kept as written.
pub fn normalize_property(property: &str) -> String {
    let property = property.trim();
    if property.starts_with("--") {
        return property.to_owned();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_skips_malformed() {
        assert_eq!(
            parse_declarations(" Color : red ;; nonsense; width:10px"),
            vec![
                ("color".to_string(), "red".to_string()),
                ("width".to_string(), "10px".to_string()),
            ]
        );
    }

    #[test]
    fn set_replaces_in_place() {
        let style = set_property("color: red; width: 1px;", "color", "blue");
        assert_eq!(style, "color: blue; width: 1px;");
    }

    #[test]
    fn set_appends_new_property() {
        assert_eq!(set_property("", "display", "none"), "display: none;");
    }

    #[test]
    fn empty_value_removes() {
        assert_eq!(set_property("color: red; top: 0", "color", ""), "top: 0;");
    }

    #[test]
    fn camel_case_properties() {
        let style = set_property("", "backgroundColor", "#fff");
        assert_eq!(style, "background-color: #fff;");
        assert_eq!(get_property(&style, "background-color").as_deref(), Some("#fff"));
    }

    #[test]
    fn separators_inside_quotes_and_parens_stay_in_the_value() {
        let style = r#"background-image: url("data:image/png;base64,AAAA"); content: ";"; color: red"#;
        assert_eq!(
            parse_declarations(style),
            vec![
                ("background-image".to_string(), r#"url("data:image/png;base64,AAAA")"#.to_string()),
                ("content".to_string(), r#"";""#.to_string()),
                ("color".to_string(), "red".to_string()),
            ]
        );
        assert_eq!(
            set_property(style, "color", "blue"),
            r#"background-image: url("data:image/png;base64,AAAA"); content: ";"; color: blue;"#
        );
    }

    #[test]
    fn unquoted_url_keeps_semicolon() {
        let style = set_property("background: url(data:x;y) no-repeat;", "top", "0");
        assert_eq!(style, "background: url(data:x;y) no-repeat; top: 0;");
    }

    #[test]
    fn custom_properties_keep_their_case() {
        assert_eq!(normalize_property("--mainColor"), "--mainColor");
        assert_eq!(normalize_property(" marginTop "), "margin-top");
        let style = set_property("", "--mainColor", "#123");
        assert_eq!(style, "--mainColor: #123;");
        assert_eq!(get_property(&style, "--mainColor").as_deref(), Some("#123"));
        assert_eq!(get_property(&style, "--maincolor"), None);
    }
}
