//! logos-based HTML fragment tokenizer.
//!
//! Two small lexers: [`Token`] splits a fragment into tags, text and comments;
//! [`AttrToken`] splits the inside of a start tag into attribute pieces.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `<div>` as StartTag beats `<` as Lt)
//! 2. For equal length matches, earlier-defined variants win

use logos::{Lexer, Logos};

/// Fragment-level token.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// `<!-- ... -->`. The callback consumes everything up to the terminator.
    #[token("<!--", lex_comment)]
    Comment,

    /// `<!DOCTYPE html>` and other markup declarations.
    #[regex(r"<![a-zA-Z][^>]*>")]
    Doctype,

    /// Start tag including attributes: `<input type="text" disabled>`, `<br/>`.
    #[regex(r#"<[a-zA-Z][a-zA-Z0-9-]*([^>"']|"[^"]*"|'[^']*')*>"#)]
    StartTag,

    /// End tag: `</div>`.
    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\n\r\f]*>")]
    EndTag,

    /// Run of character data.
    #[regex(r"[^<]+")]
    Text,

    /// A `<` that doesn't open a tag; treated as text.
    #[token("<")]
    Lt,
}

fn lex_comment(lex: &mut Lexer<Token>) -> bool {
    let rest = lex.remainder();
    let len = rest.find("-->").map_or(rest.len(), |end| end + 3);
    lex.bump(len);
    true
}

/// Attribute-level token (the inside of a start tag, after the tag name).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum AttrToken {
    /// Double-quoted value.
    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    /// Single-quoted value.
    #[regex(r"'[^']*'")]
    SingleQuoted,

    /// Attribute name or unquoted value.
    #[regex(r#"[^ \t\n\r\f"'>/=]+"#)]
    Name,

    /// `=`
    #[token("=")]
    Equals,

    /// `/` (self-closing marker or stray slash)
    #[token("/")]
    Slash,
}

/// Tokenize an HTML fragment into `(Token, text)` pairs.
///
/// Raw-text elements are not special-cased here; the parser handles them.
/// Error tokens are skipped.
pub fn tokenize(input: &str) -> Vec<(Token, String)> {
    Token::lexer(input)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, input[span].to_string())))
        .collect()
}

/// Split a start tag (`<tag attrs...>`) into its lowercase name, attributes
/// and self-closing flag. Attribute values are entity-decoded.
pub fn split_start_tag(raw: &str) -> (String, Vec<(String, String)>, bool) {
    let inner = raw.trim_start_matches('<').trim_end_matches('>');
    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    let rest = &inner[name_end..];
    let self_closing = rest.trim_end().ends_with('/');

    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut pending: Option<String> = None;
    let mut expecting_value = false;
    let mut lexer = AttrToken::lexer(rest);
    while let Some(result) = lexer.next() {
        let Ok(token) = result else {
            continue;
        };
        let text = lexer.slice();
        match token {
            AttrToken::Equals => expecting_value = pending.is_some(),
            AttrToken::DoubleQuoted | AttrToken::SingleQuoted | AttrToken::Name
                if expecting_value =>
            {
                let value = match token {
                    AttrToken::Name => text,
                    _ => &text[1..text.len() - 1],
                };
                if let Some(name) = pending.take() {
                    push_attribute(&mut attributes, name, decode_entities(value));
                }
                expecting_value = false;
            }
            AttrToken::Name => {
                if let Some(name) = pending.take() {
                    push_attribute(&mut attributes, name, String::new());
                }
                pending = Some(text.to_ascii_lowercase());
            }
            AttrToken::DoubleQuoted | AttrToken::SingleQuoted | AttrToken::Slash => {}
        }
    }
    if let Some(name) = pending {
        push_attribute(&mut attributes, name, String::new());
    }
    (name, attributes, self_closing)
}

// The first occurrence of a duplicated attribute wins, as in browsers.
fn push_attribute(attributes: &mut Vec<(String, String)>, name: String, value: String) {
    if !attributes.iter().any(|(n, _)| *n == name) {
        attributes.push((name, value));
    }
}

/// Decode the common named entities and numeric character references.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            ch.map(|ch| (ch, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
