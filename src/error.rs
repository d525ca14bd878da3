//! Error type shared by the whole crate.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong in ezui.
///
/// Construction errors (`ElementNotFound`, `DuplicateValueBinding`,
/// `NotValueElement`, `ReservedAttribute`) abort component construction.
/// `SlotNotFound` is only produced under [`SlotPolicy::Strict`](crate::app::SlotPolicy). Network
/// errors never surface synchronously; they travel on a subject's error
/// channel.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// A binding or event registration referenced an id that the component's
    /// shadow tree doesn't contain.
    #[error("no element with id `{id}` in component tree")]
    ElementNotFound { id: String },

    /// A second form-value binding was registered on one property.
    #[error("property `{field}` already has a value binding (to `{existing}`); cannot also bind `{id}`")]
    DuplicateValueBinding {
        field: String,
        existing: String,
        id: String,
    },

    /// A value was read from, or a value binding attached to, an element
    /// without form-value semantics.
    #[error("element `{id}` (<{tag}>) has no value; expected input, textarea, select or option")]
    NotValueElement { id: String, tag: String },

    /// An attribute binding targeted `id`, which keys element lookup.
    #[error("attribute `{name}` on `{id}` cannot be bound")]
    ReservedAttribute { id: String, name: String },

    /// `add_component` targeted a missing slot under the strict policy.
    #[error("no slot with id `{id}` to attach a component to")]
    SlotNotFound { id: String },

    /// A component handle outlived its document node.
    #[error("component root node is gone")]
    Detached,

    /// Transport-level failure (connect, TLS, timeout, missing runtime).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("request failed with status {status}")]
    HttpStatus { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("could not decode response body: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = Error::ElementNotFound { id: "title".into() };
        assert_eq!(err.to_string(), "no element with id `title` in component tree");

        let err = Error::DuplicateValueBinding {
            field: "name".into(),
            existing: "a".into(),
            id: "b".into(),
        };
        assert!(err.to_string().contains("`name`"));
        assert!(err.to_string().contains("`b`"));
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, Error::Decode(_)));
    }
}
