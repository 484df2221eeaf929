//! Interfaces to the collaborators that own matching state.
//!
//! The pool owns the waiting clients and their tolerance growth; configuration
//! owns team size and, optionally, the attribute schema. The core only reads
//! through these traits and never keeps references across cycles.

use std::sync::Arc;

use crate::client::{Client, Schema};

/// The authoritative set of waiting clients.
///
/// `clients` must return an internally consistent snapshot. If other threads
/// register or remove clients, the implementation is responsible for making
/// snapshot reads atomic with respect to `expand_search_parameters`.
pub trait ClientPool {
    /// Snapshot of every waiting client.
    fn clients(&self) -> Vec<Client>;

    /// Widen the tolerances of all waiting clients. Called once per cycle.
    fn expand_search_parameters(&self);
}

impl<P: ClientPool + ?Sized> ClientPool for &P {
    fn clients(&self) -> Vec<Client> {
        (**self).clients()
    }

    fn expand_search_parameters(&self) {
        (**self).expand_search_parameters()
    }
}

impl<P: ClientPool + ?Sized> ClientPool for Arc<P> {
    fn clients(&self) -> Vec<Client> {
        (**self).clients()
    }

    fn expand_search_parameters(&self) {
        (**self).expand_search_parameters()
    }
}

/// Matching parameters.
pub trait MatchConfig {
    /// Target number of members per team. Zero is a configuration error.
    fn team_size(&self) -> usize;

    /// Fixed attribute schema. `None` derives it each cycle from the client
    /// with the lowest identifier.
    fn schema(&self) -> Option<Schema> {
        None
    }
}

impl<C: MatchConfig + ?Sized> MatchConfig for &C {
    fn team_size(&self) -> usize {
        (**self).team_size()
    }

    fn schema(&self) -> Option<Schema> {
        (**self).schema()
    }
}

impl<C: MatchConfig + ?Sized> MatchConfig for Arc<C> {
    fn team_size(&self) -> usize {
        (**self).team_size()
    }

    fn schema(&self) -> Option<Schema> {
        (**self).schema()
    }
}

/// Plain-value configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticConfig {
    /// Target team size.
    pub team_size: usize,
    /// Optional fixed schema.
    pub schema: Option<Schema>,
}

impl StaticConfig {
    /// Configuration with a team size and a derived schema.
    pub fn new(team_size: usize) -> Self {
        Self {
            team_size,
            schema: None,
        }
    }

    /// Pin the attribute schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self::new(2)
    }
}

impl MatchConfig for StaticConfig {
    fn team_size(&self) -> usize {
        self.team_size
    }

    fn schema(&self) -> Option<Schema> {
        self.schema.clone()
    }
}
