//! Candidate sets and teams.
//!
//! Both are sets of clients keyed by [`ClientId`]. Iteration is always in
//! ascending identifier order, which is the tie-break greedy team assembly
//! relies on for reproducible results.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::client::{Client, ClientId};

/// Clients judged compatible with one client this cycle (self excluded).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    clients: BTreeMap<ClientId, Arc<Client>>,
}

impl CandidateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client. Returns false if its identifier was already present.
    pub fn insert(&mut self, client: Arc<Client>) -> bool {
        self.clients.insert(client.id(), client).is_none()
    }

    /// Remove a client by identifier.
    pub fn remove(&mut self, id: ClientId) -> Option<Arc<Client>> {
        self.clients.remove(&id)
    }

    /// Keep only clients for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Client) -> bool,
    {
        self.clients.retain(|_, client| keep(client));
    }

    /// Whether `id` is in the set.
    #[inline]
    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Client with identifier `id`.
    pub fn get(&self, id: ClientId) -> Option<&Arc<Client>> {
        self.clients.get(&id)
    }

    /// Clients in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Client>> {
        self.clients.values()
    }

    /// Identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.clients.keys().copied()
    }

    /// Number of clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl FromIterator<Arc<Client>> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Arc<Client>>>(iter: I) -> Self {
        let mut set = Self::new();
        for client in iter {
            set.insert(client);
        }
        set
    }
}

/// A group of mutually compatible clients built around one initiator.
///
/// A team may hold fewer members than the configured size; whether a partial
/// team is acceptable is the caller's decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    initiator: ClientId,
    members: BTreeMap<ClientId, Arc<Client>>,
}

impl Team {
    /// A team holding only its initiator.
    pub fn new(initiator: Arc<Client>) -> Self {
        let id = initiator.id();
        let mut members = BTreeMap::new();
        members.insert(id, initiator);
        Self {
            initiator: id,
            members,
        }
    }

    /// The client the team was grown from.
    pub fn initiator(&self) -> ClientId {
        self.initiator
    }

    pub(crate) fn admit(&mut self, client: Arc<Client>) {
        self.members.insert(client.id(), client);
    }

    /// Whether `id` is a member.
    #[inline]
    pub fn contains(&self, id: ClientId) -> bool {
        self.members.contains_key(&id)
    }

    /// Member identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.members.keys().copied()
    }

    /// Members in ascending identifier order.
    pub fn members(&self) -> impl Iterator<Item = &Arc<Client>> {
        self.members.values()
    }

    /// Number of members, initiator included.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false: a team holds at least its initiator.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the team reached `team_size` members.
    pub fn is_complete(&self, team_size: usize) -> bool {
        self.members.len() >= team_size
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, id) in self.ids().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, "]")
    }
}
