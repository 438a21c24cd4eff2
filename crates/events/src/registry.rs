//! Name-keyed subscriber registry.

use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use herald_core::{EventData, HeraldError};
use serde_json::Value;

/// Outcome of one callback invocation.
pub type CallbackResult = Result<Value, CallbackFailure>;

/// Subscriber callback: receives the bare event name and its data.
pub type Callback = Arc<dyn Fn(&str, &EventData) -> CallbackResult + Send + Sync>;

/// A failed callback invocation, with the location it was raised at.
///
/// Constructors and the `From<anyhow::Error>` conversion are `#[track_caller]`,
/// so the recorded location is where the failure was created (or where `?`
/// converted it).
pub struct CallbackFailure {
    error: anyhow::Error,
    location: &'static Location<'static>,
}

impl CallbackFailure {
    #[track_caller]
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::new(anyhow::Error::msg(message))
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    /// The error followed by each of its causes, outermost first.
    pub fn chain(&self) -> Vec<String> {
        self.error.chain().map(ToString::to_string).collect()
    }
}

impl From<anyhow::Error> for CallbackFailure {
    #[track_caller]
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

/// Lets callbacks that publish on the bus propagate its errors with `?`.
impl From<HeraldError> for CallbackFailure {
    #[track_caller]
    fn from(error: HeraldError) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for CallbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackFailure")
            .field("error", &self.error)
            .field("location", &self.location)
            .finish()
    }
}

impl fmt::Display for CallbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.error, self.location)
    }
}

/// A registered callback plus where it was subscribed.
#[derive(Clone)]
pub struct Subscriber {
    callback: Callback,
    subscribed_at: &'static Location<'static>,
}

impl Subscriber {
    #[track_caller]
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&str, &EventData) -> CallbackResult + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            subscribed_at: Location::caller(),
        }
    }

    pub fn call(&self, name: &str, data: &EventData) -> CallbackResult {
        (self.callback)(name, data)
    }

    pub fn subscribed_at(&self) -> &'static Location<'static> {
        self.subscribed_at
    }

    /// Whether both handles point at the same callback allocation.
    pub fn same_callback(&self, other: &Subscriber) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("callback", &"<callback>")
            .field("subscribed_at", &self.subscribed_at)
            .finish()
    }
}

/// Event name (upper-cased) → subscribers in registration order.
///
/// There are no subscription ids; removal is per name.
#[derive(Debug, Default, Clone)]
pub struct SubscriberRegistry {
    subscribers: HashMap<String, Vec<Subscriber>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `subscriber` to `name`'s list. Duplicates are kept and fire once each.
    pub fn subscribe(&mut self, name: &str, subscriber: Subscriber) {
        self.subscribers
            .entry(name.to_uppercase())
            .or_default()
            .push(subscriber);
    }

    /// Clear `name`'s list, keeping the (now empty) entry. Returns how many were removed.
    pub fn unsubscribe(&mut self, name: &str) -> usize {
        self.subscribers
            .get_mut(&name.to_uppercase())
            .map(|subs| std::mem::take(subs).len())
            .unwrap_or(0)
    }

    /// Subscribers for `name`, in registration order.
    pub fn subscribers_for(&self, name: &str) -> &[Subscriber] {
        self.subscribers
            .get(&name.to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count(&self, name: &str) -> usize {
        self.subscribers_for(name).len()
    }

    /// Registered keys, including ones cleared by [`Self::unsubscribe`].
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.subscribers.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.subscribers.contains_key(&name.to_uppercase())
    }

    /// Drop every subscription.
    pub fn reset_all(&mut self) {
        self.subscribers.clear();
    }
}
