//! Greedy team assembly over resolved candidate sets.
//!
//! The candidate-set map is the compatibility oracle: `a` accepts `b` exactly
//! when `b` is in `a`'s candidate set. A team grows one candidate at a time,
//! in ascending identifier order, and a candidate joins only if it and every
//! current member accept each other. The result is a clique in the mutual
//! acceptance graph, not necessarily the largest one.

use std::sync::Arc;

use tracing::debug;

use crate::candidates::{CandidateSet, Team};
use crate::client::{Client, ClientId};
use crate::cycle::Matcher;
use crate::error::{MatchError, Result};
use crate::pool::{ClientPool, MatchConfig};

impl<P: ClientPool, C: MatchConfig> Matcher<P, C> {
    /// The candidate set resolved for `client` this cycle.
    ///
    /// Empty when the client was not resolved or matched nobody.
    pub fn find_matching_set_for(&self, client: ClientId) -> CandidateSet {
        self.candidates.get(&client).cloned().unwrap_or_default()
    }

    /// Grow a team around `client` from `candidates`.
    ///
    /// Stops at the configured team size. Returns whatever was accepted when
    /// the candidates run out, so the team may be partial. Neither the pool
    /// nor the candidate map is modified.
    pub fn try_creating_a_match_from(
        &self,
        client: &Arc<Client>,
        candidates: &CandidateSet,
    ) -> Result<Team> {
        let team_size = self.team_size()?;
        let mut team = Team::new(Arc::clone(client));

        for candidate in candidates.iter() {
            if team.len() >= team_size {
                break;
            }
            if team.contains(candidate.id()) {
                continue;
            }
            if self.is_mutual_with(&team, candidate.id()) {
                team.admit(Arc::clone(candidate));
            }
        }

        debug!(
            initiator = %client.id(),
            members = team.len(),
            team_size,
            "Team assembled"
        );
        Ok(team)
    }

    /// Look up and assemble in one step for a client resolved this cycle.
    ///
    /// `Ok(None)` when the client is not part of the current cycle.
    pub fn assemble_team_for(&self, client: ClientId) -> Result<Option<Team>> {
        let Some(initiator) = self.roster.get(&client) else {
            return Ok(None);
        };
        let candidates = self.find_matching_set_for(client);
        self.try_creating_a_match_from(initiator, &candidates).map(Some)
    }

    /// Configured team size, validated.
    pub fn team_size(&self) -> Result<usize> {
        match self.config.team_size() {
            0 => Err(MatchError::InvalidTeamSize(0)),
            size => Ok(size),
        }
    }

    /// Whether `candidate` and every team member accept each other.
    ///
    /// The initiator's side is the caller-supplied candidate list, so only
    /// the candidate's view is checked for it. A candidate without a resolved
    /// set is stale and never accepted.
    fn is_mutual_with(&self, team: &Team, candidate: ClientId) -> bool {
        let Some(accepted_by_candidate) = self.candidates.get(&candidate) else {
            return false;
        };

        team.ids().all(|member| {
            accepted_by_candidate.contains(member)
                && (member == team.initiator() || self.accepts(member, candidate))
        })
    }

    fn accepts(&self, client: ClientId, other: ClientId) -> bool {
        self.candidates
            .get(&client)
            .map_or(false, |set| set.contains(other))
    }
}
