//! In-memory client pool with tolerance expansion.
//!
//! All access goes through one `RwLock`, so a snapshot never interleaves with
//! an expansion or a removal.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lobby_match::{Client, ClientId, ClientPool};
use tracing::debug;

/// How tolerances widen each cycle: `min(old * factor + step, ceiling)`.
///
/// The result never drops below the old tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpansionPolicy {
    /// Multiplicative growth, at least 1.0.
    pub factor: f64,
    /// Additive growth per cycle, at least 0.0.
    pub step: f64,
    /// Optional upper limit for any tolerance.
    pub ceiling: Option<f64>,
}

impl Default for ExpansionPolicy {
    fn default() -> Self {
        Self {
            factor: 1.0,
            step: 1.0,
            ceiling: None,
        }
    }
}

impl ExpansionPolicy {
    /// The tolerance after one expansion.
    ///
    /// Growth stops at `f64::MAX`, so a tolerance stays finite however long
    /// its client waits.
    pub fn widen(&self, tolerance: f64) -> f64 {
        let grown = (tolerance * self.factor + self.step).min(f64::MAX);
        let capped = match self.ceiling {
            Some(ceiling) => grown.min(ceiling),
            None => grown,
        };
        capped.max(tolerance)
    }
}

/// Waiting clients keyed by identifier.
#[derive(Debug, Default)]
pub struct InMemoryPool {
    clients: RwLock<BTreeMap<ClientId, Client>>,
    policy: ExpansionPolicy,
}

impl InMemoryPool {
    /// Create an empty pool.
    pub fn new(policy: ExpansionPolicy) -> Self {
        Self {
            clients: RwLock::new(BTreeMap::new()),
            policy,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<ClientId, Client>> {
        self.clients.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<ClientId, Client>> {
        self.clients.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a client. Returns false, leaving the pool unchanged, if the
    /// identifier is already waiting.
    pub fn register(&self, client: Client) -> bool {
        let mut clients = self.write();
        if clients.contains_key(&client.id()) {
            return false;
        }
        debug!(client = %client.id(), "Client registered");
        clients.insert(client.id(), client);
        true
    }

    /// Remove a client (disconnect or match).
    pub fn remove(&self, id: ClientId) -> Option<Client> {
        self.write().remove(&id)
    }

    /// Remove every listed client only if all are still waiting.
    ///
    /// Returns false, removing nothing, when any of them is gone.
    pub fn remove_team<I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = ClientId>,
    {
        let ids: Vec<ClientId> = ids.into_iter().collect();
        let mut clients = self.write();
        if !ids.iter().all(|id| clients.contains_key(id)) {
            return false;
        }
        for id in &ids {
            clients.remove(id);
        }
        true
    }

    /// Whether `id` is waiting.
    pub fn contains(&self, id: ClientId) -> bool {
        self.read().contains_key(&id)
    }

    /// A copy of a waiting client.
    pub fn get(&self, id: ClientId) -> Option<Client> {
        self.read().get(&id).cloned()
    }

    /// Number of waiting clients.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl ClientPool for InMemoryPool {
    fn clients(&self) -> Vec<Client> {
        self.read().values().cloned().collect()
    }

    fn expand_search_parameters(&self) {
        let mut clients = self.write();
        for client in clients.values_mut() {
            for tolerance in client.searching_data_mut().values_mut() {
                *tolerance = self.policy.widen(*tolerance);
            }
        }
        debug!(clients = clients.len(), "Search parameters expanded");
    }
}
