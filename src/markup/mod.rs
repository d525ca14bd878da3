//! Template parsing: logos tokenizer, fragment parser, inline style helpers.

pub mod parser;
pub mod style;
pub mod tokenizer;

pub use parser::parse_fragment;
