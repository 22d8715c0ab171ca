//! Handler Framework
//!
//! A handler is a rule that selects organisms by attribute and runs a
//! behavior against each selected organism every tick. Selection has two
//! stages: static filters are checked once, when an organism's attributes
//! are first assigned, and decide whether the handler is bound at all; the
//! dynamic filter is checked every tick before the handler runs.
//!
//! Handlers live in a [`HandlerSet`] that is built once before the run and
//! is read-only afterwards. Organisms refer to bound handlers by
//! [`HandlerId`], their position in the set.

pub mod builtin;

use std::collections::BTreeMap;
use std::fmt;

use crate::components::{AttributeValue, Organism};
use crate::ecosystem::Ecosystem;
use crate::error::SimError;

pub use builtin::{AnimalHandler, MetabolismHandler};

/// Position of a handler in its [`HandlerSet`]. Also its run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub usize);

/// Dotted attribute paths mapped to the values a handler accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticFilters {
    accepted: BTreeMap<String, Vec<AttributeValue>>,
}

impl StaticFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts organisms whose `path` equals one of `values`. Filtering the
    /// same path twice widens the accepted set.
    pub fn filter<V: Into<AttributeValue>>(
        mut self,
        path: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.accepted
            .entry(path.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Every path must resolve to an accepted value. A path that does not
    /// resolve is simply a non-match.
    pub fn matches(&self, organism: &Organism) -> bool {
        self.accepted.iter().all(|(path, values)| {
            organism
                .attribute(path)
                .map_or(false, |value| values.contains(value))
        })
    }

    pub fn accepted(&self, path: &str) -> Option<&[AttributeValue]> {
        self.accepted.get(path).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// A per-tick behavior bound to a filtered set of organisms.
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    fn static_filters(&self) -> &StaticFilters;

    /// Checked every tick before [`run`](Self::run).
    fn dynamic_filter(&self, _organism: &Organism) -> bool {
        true
    }

    /// Runs the behavior for organism `index`. The handler may kill the
    /// organism; later handlers then do not run for it this tick.
    fn run(&self, eco: &mut Ecosystem, index: u32) -> Result<(), SimError>;
}

/// The ordered set of registered handlers.
#[derive(Default)]
pub struct HandlerSet {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding the built-in handlers, metabolism first.
    pub fn with_builtin() -> Self {
        let mut set = Self::new();
        set.register(Box::new(MetabolismHandler::new()));
        set.register(Box::new(AnimalHandler::new()));
        set
    }

    /// Appends a handler. Registration order is run order.
    pub fn register(&mut self, handler: Box<dyn Handler>) -> HandlerId {
        let id = HandlerId(self.handlers.len());
        tracing::info!("Registering handler '{}'", handler.name());
        self.handlers.push(handler);
        id
    }

    pub fn get(&self, id: HandlerId) -> Option<&dyn Handler> {
        self.handlers.get(id.0).map(Box::as_ref)
    }

    /// Binds every handler whose static filters the organism matches.
    pub fn bind(&self, organism: &mut Organism) {
        for (i, handler) in self.handlers.iter().enumerate() {
            if handler.static_filters().matches(organism) {
                tracing::debug!(
                    "Binding handler '{}' to organism {}",
                    handler.name(),
                    organism.index()
                );
                organism.add_handler(HandlerId(i));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Drops every handler. Only for resetting between runs.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}
