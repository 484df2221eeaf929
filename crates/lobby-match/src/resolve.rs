//! Index construction and candidate-set resolution.
//!
//! Both steps read the pool independently. Between the two reads the pool
//! only widens tolerances, so the second snapshot holds the same clients as
//! the first with larger search boxes.

use std::collections::HashMap;
use std::sync::Arc;

use lobby_index::{Bounds, KdTree};
use tracing::debug;

use crate::candidates::CandidateSet;
use crate::client::{Client, Schema};
use crate::cycle::Matcher;
use crate::error::{MatchError, Result};
use crate::pool::{ClientPool, MatchConfig};

impl<P: ClientPool, C: MatchConfig> Matcher<P, C> {
    /// Replace the index with one built from a fresh pool snapshot.
    ///
    /// Fixes the cycle's schema (configured, or taken from the client with the
    /// lowest identifier) and rejects any client whose self-data deviates
    /// from it. Returns the number of indexed clients.
    pub fn rebuild_index(&mut self) -> Result<usize> {
        self.index = None;
        self.schema = None;

        let snapshot = sorted_snapshot(&self.pool);
        let schema = self
            .config
            .schema()
            .or_else(|| snapshot.first().map(|c| Schema::of(c.self_data())))
            .unwrap_or_default();

        let entries = snapshot
            .into_iter()
            .map(|client| -> Result<_> { Ok((schema.position(&client)?, Arc::new(client))) })
            .collect::<Result<Vec<_>>>()?;

        let index = KdTree::bulk_load(schema.len(), entries)?;
        let indexed = index.len();
        debug!(clients = indexed, dimensions = schema.len(), "Search tree rebuilt");

        self.index = Some(index);
        self.schema = Some(schema);
        Ok(indexed)
    }

    /// Compute every waiting client's candidate set against the current index.
    ///
    /// Clears the map first. Each client's box is its self-data widened by its
    /// tolerance in every dimension; the client itself is removed from the
    /// query result by identifier. Clients with no match still get an empty
    /// entry. Returns the number of resolved clients.
    pub fn resolve_candidates(&mut self) -> Result<usize> {
        self.candidates.clear();
        self.roster.clear();

        let (index, schema) = match (&self.index, &self.schema) {
            (Some(index), Some(schema)) => (index, schema),
            _ => return Err(MatchError::IndexNotBuilt),
        };

        let snapshot = sorted_snapshot(&self.pool);
        let mut candidates = HashMap::with_capacity(snapshot.len());
        let mut roster = HashMap::with_capacity(snapshot.len());

        for client in snapshot {
            let set = candidates_of(index, schema, &client)?;
            debug!(client = %client.id(), candidates = set.len(), "Candidates resolved");
            candidates.insert(client.id(), set);
            roster.insert(client.id(), Arc::new(client));
        }

        self.candidates = candidates;
        self.roster = roster;
        Ok(self.candidates.len())
    }
}

fn candidates_of(
    index: &KdTree<Arc<Client>>,
    schema: &Schema,
    client: &Client,
) -> Result<CandidateSet> {
    let bounds = Bounds::around(&schema.position(client)?, &schema.tolerances(client)?)?;

    Ok(index
        .range(&bounds)?
        .into_iter()
        .filter(|other| other.id() != client.id())
        .cloned()
        .collect())
}

/// Pool snapshot in ascending identifier order.
fn sorted_snapshot<P: ClientPool>(pool: &P) -> Vec<Client> {
    let mut snapshot = pool.clients();
    snapshot.sort_by_key(Client::id);
    snapshot
}
