//! The commit pass: turn resolved candidate sets into removed teams.
//!
//! Runs after a successful cycle. Clients are visited in ascending identifier
//! order; each still-waiting, still-unmatched client tries to grow a team from
//! its candidates that are also still waiting and unmatched. Only complete
//! teams are committed, and a team is removed from the pool atomically or not
//! at all.

use std::collections::HashSet;
use std::sync::Arc;

use lobby_match::{ClientId, ClientPool, MatchConfig, Matcher, Team};
use tracing::{debug, info};

use crate::error::Result;
use crate::pool::InMemoryPool;

/// Commit every complete team the current cycle allows.
///
/// Returns the committed teams in the order they were formed.
pub fn commit_pass<P, C>(matcher: &Matcher<P, C>, pool: &InMemoryPool) -> Result<Vec<Team>>
where
    P: ClientPool,
    C: MatchConfig,
{
    let team_size = matcher.team_size()?;
    let mut matched: HashSet<ClientId> = HashSet::new();
    let mut teams = Vec::new();

    for client in pool.clients() {
        if matched.contains(&client.id()) {
            continue;
        }

        let mut candidates = matcher.find_matching_set_for(client.id());
        candidates.retain(|c| !matched.contains(&c.id()) && pool.contains(c.id()));
        if candidates.len() + 1 < team_size {
            continue;
        }

        let team = matcher.try_creating_a_match_from(&Arc::new(client), &candidates)?;
        if !team.is_complete(team_size) {
            debug!(initiator = %team.initiator(), members = team.len(), "Partial team discarded");
            continue;
        }

        if pool.remove_team(team.ids()) {
            info!(team = %team, "Team committed");
            matched.extend(team.ids());
            teams.push(team);
        }
    }

    Ok(teams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ExpansionPolicy;
    use lobby_match::{Attributes, Client, StaticConfig};

    fn player(id: u64, skill: f64, tolerance: f64) -> Client {
        Client::new(
            ClientId(id),
            Attributes::new().with("skill", skill),
            Attributes::new().with("skill", tolerance),
        )
    }

    fn pool_of(players: &[(u64, f64, f64)]) -> Arc<InMemoryPool> {
        let pool = Arc::new(InMemoryPool::new(ExpansionPolicy {
            factor: 1.0,
            step: 0.0,
            ceiling: None,
        }));
        for &(id, skill, tolerance) in players {
            pool.register(player(id, skill, tolerance));
        }
        pool
    }

    fn team_ids(teams: &[Team]) -> Vec<Vec<u64>> {
        teams.iter().map(|t| t.ids().map(|id| id.0).collect()).collect()
    }

    #[test]
    fn commits_complete_teams_only() {
        let pool = pool_of(&[(1, 100.0, 10.0), (2, 105.0, 10.0), (3, 500.0, 10.0)]);
        let mut matcher = Matcher::new(Arc::clone(&pool), StaticConfig::new(2));
        matcher.match_iteration().unwrap();

        let teams = commit_pass(&matcher, &pool).unwrap();

        assert_eq!(team_ids(&teams), vec![vec![1, 2]]);
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(ClientId(3)));
    }

    #[test]
    fn client_joins_at_most_one_team() {
        // Everyone accepts everyone; four clients make two pairs
        let pool = pool_of(&[(1, 0.0, 50.0), (2, 1.0, 50.0), (3, 2.0, 50.0), (4, 3.0, 50.0)]);
        let mut matcher = Matcher::new(Arc::clone(&pool), StaticConfig::new(2));
        matcher.match_iteration().unwrap();

        let teams = commit_pass(&matcher, &pool).unwrap();

        assert_eq!(team_ids(&teams), vec![vec![1, 2], vec![3, 4]]);
        assert!(pool.is_empty());
    }

    #[test]
    fn departed_clients_are_not_committed() {
        let pool = pool_of(&[(1, 0.0, 5.0), (2, 1.0, 5.0), (3, 2.0, 5.0)]);
        let mut matcher = Matcher::new(Arc::clone(&pool), StaticConfig::new(2));
        matcher.match_iteration().unwrap();

        // 2 disconnects after candidates were resolved
        pool.remove(ClientId(2));
        let teams = commit_pass(&matcher, &pool).unwrap();

        assert_eq!(team_ids(&teams), vec![vec![1, 3]]);
        assert!(pool.is_empty());
    }

    #[test]
    fn nothing_to_commit_in_empty_pool() {
        let pool = pool_of(&[]);
        let mut matcher = Matcher::new(Arc::clone(&pool), StaticConfig::new(3));
        matcher.match_iteration().unwrap();

        assert!(commit_pass(&matcher, &pool).unwrap().is_empty());
    }

    #[test]
    fn invalid_team_size_surfaces() {
        let pool = pool_of(&[(1, 0.0, 5.0)]);
        let matcher = Matcher::new(Arc::clone(&pool), StaticConfig::new(0));

        assert!(commit_pass(&matcher, &pool).is_err());
    }
}
