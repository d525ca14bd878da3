//! Property<T>: an observable field with a transform chain and DOM sinks.
//!
//! A property owns its value. Every write stores the raw value, runs the
//! transform chain ("pipes") in installation order, then hands the result to
//! each sink in registration order. Sinks are installed by
//! [`Component::bind`](crate::component::Component::bind); the sink list is
//! inspectable through [`Property::sink_labels`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};

/// A pure value transform applied before a value reaches the DOM.
pub type Pipe<T> = Rc<dyn Fn(T) -> T>;

type SinkFn<T> = Rc<dyn Fn(&T)>;

struct Sink<T> {
    label: String,
    apply: SinkFn<T>,
}

struct PropertyState<T> {
    name: String,
    value: RefCell<T>,
    pipes: RefCell<Vec<Pipe<T>>>,
    sinks: RefCell<Vec<Sink<T>>>,
    /// Element id owning the two-way value channel, if any.
    value_binding: RefCell<Option<String>>,
}

/// Observable field. Cloning yields another handle to the same field.
pub struct Property<T: 'static> {
    state: Rc<PropertyState<T>>,
}

/// Non-owning handle used by reverse (DOM to field) channels.
pub struct WeakProperty<T: 'static> {
    state: Weak<PropertyState<T>>,
}

impl<T: 'static> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.state.name)
            .field("value", &*self.state.value.borrow())
            .field("pipes", &self.state.pipes.borrow().len())
            .field(
                "sinks",
                &self
                    .state
                    .sinks
                    .borrow()
                    .iter()
                    .map(|sink| sink.label.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T: Clone + 'static> Property<T> {
    /// Create a property. `name` identifies it in errors and logs.
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        Self {
            state: Rc::new(PropertyState {
                name: name.into(),
                value: RefCell::new(initial),
                pipes: RefCell::new(Vec::new()),
                sinks: RefCell::new(Vec::new()),
                value_binding: RefCell::new(None),
            }),
        }
    }

    /// The property's name.
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Current raw value (before pipes).
    pub fn get(&self) -> T {
        self.state.value.borrow().clone()
    }

    /// Read the raw value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.value.borrow())
    }

    /// Current value after the transform chain.
    pub fn piped(&self) -> T {
        let pipes: Vec<Pipe<T>> = self.state.pipes.borrow().clone();
        pipes.iter().fold(self.get(), |value, pipe| pipe(value))
    }

    /// Store a new value and push it through every sink.
    pub fn set(&self, value: T) {
        *self.state.value.borrow_mut() = value;
        self.refresh();
    }

    /// Mutate the value in place, then push it through every sink.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.state.value.borrow_mut());
        self.refresh();
    }

    /// Re-run every sink with the current piped value.
    pub fn refresh(&self) {
        let value = self.piped();
        let sinks: Vec<SinkFn<T>> = self
            .state
            .sinks
            .borrow()
            .iter()
            .map(|sink| Rc::clone(&sink.apply))
            .collect();
        for sink in sinks {
            sink(&value);
        }
    }

    /// Append a transform to the chain and repaint.
    ///
    /// Transforms compose left to right: the first installed runs first.
    pub fn pipe(&self, transform: impl Fn(T) -> T + 'static) -> &Self {
        self.state.pipes.borrow_mut().push(Rc::new(transform));
        self.refresh();
        self
    }

    /// Number of installed transforms.
    pub fn pipe_count(&self) -> usize {
        self.state.pipes.borrow().len()
    }

    /// Labels of the installed sinks, in the order they run.
    pub fn sink_labels(&self) -> Vec<String> {
        self.state
            .sinks
            .borrow()
            .iter()
            .map(|sink| sink.label.clone())
            .collect()
    }

    /// Non-owning handle.
    pub fn downgrade(&self) -> WeakProperty<T> {
        WeakProperty {
            state: Rc::downgrade(&self.state),
        }
    }

    pub(crate) fn push_sink(&self, label: String, apply: impl Fn(&T) + 'static) {
        self.state.sinks.borrow_mut().push(Sink {
            label,
            apply: Rc::new(apply),
        });
    }

    /// Reserve the two-way value channel for element `id`.
    pub(crate) fn claim_value_binding(&self, id: &str) -> Result<()> {
        let mut owner = self.state.value_binding.borrow_mut();
        if let Some(existing) = owner.as_ref() {
            return Err(Error::DuplicateValueBinding {
                field: self.state.name.clone(),
                existing: existing.clone(),
                id: id.to_owned(),
            });
        }
        *owner = Some(id.to_owned());
        Ok(())
    }
}

impl<T: Clone + 'static> WeakProperty<T> {
    /// Upgrade to a strong handle if the property is still alive.
    pub fn upgrade(&self) -> Option<Property<T>> {
        self.state.upgrade().map(|state| Property { state })
    }
}
