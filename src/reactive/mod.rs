//! Reactive state: observable properties and multicast subjects.
//!
//! - [`Property`]: observable field with a transform chain and DOM sinks.
//! - [`EventSubject`]: synchronous publish/subscribe with an error channel.

pub mod property;
pub mod subject;

pub use property::{Pipe, Property, WeakProperty};
pub use subject::{EventSubject, SubjectFuture, SubscriptionId};
