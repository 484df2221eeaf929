//! The matchmaker node: a periodic cycle loop around the matching core.

use std::sync::Arc;

use lobby_match::{Client, ClientPool, Matcher, StaticConfig, Team};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::commit::commit_pass;
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::pool::InMemoryPool;
use crate::seed::{load_seed_file, synthetic_clients};

/// Running totals for one service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ServiceStats {
    /// Cycles attempted
    pub cycles: u64,
    /// Cycles that aborted with an error
    pub failed_cycles: u64,
    /// Teams committed
    pub teams: u64,
    /// Clients removed from the pool as team members
    pub matched_clients: u64,
}

/// Matchmaker node.
pub struct MatchmakerService {
    config: ServiceConfig,
    pool: Arc<InMemoryPool>,
    matcher: Matcher<Arc<InMemoryPool>, StaticConfig>,
    stats: ServiceStats,
}

impl MatchmakerService {
    /// Create a service and populate its pool from the configured sources.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let pool = Arc::new(InMemoryPool::new(config.expansion));

        if let Some(path) = &config.seed_file {
            let clients = load_seed_file(path)?;
            let total = clients.len();
            let registered = clients
                .into_iter()
                .map(|client| register(&pool, client))
                .filter(|&added| added)
                .count();
            info!(path = %path.display(), registered, total, "Seed file loaded");
        }

        if config.synthetic_clients > 0 {
            let first_id = pool.clients().last().map_or(1, |c| c.id().0 + 1);
            let clients = synthetic_clients(
                config.synthetic_clients,
                first_id,
                &config.synthetic_attributes(),
                config.synthetic_seed,
            );
            for client in clients {
                register(&pool, client);
            }
            info!(count = config.synthetic_clients, first_id, "Synthetic clients registered");
        }

        let matcher = Matcher::new(Arc::clone(&pool), config.match_config());
        Ok(Self {
            config,
            pool,
            matcher,
            stats: ServiceStats::default(),
        })
    }

    /// The shared client pool. Register and remove clients through this.
    pub fn pool(&self) -> &Arc<InMemoryPool> {
        &self.pool
    }

    /// The service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Totals so far.
    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    /// Run one cycle and commit the teams it allows.
    pub fn tick(&mut self) -> Result<Vec<Team>> {
        self.stats.cycles += 1;

        let outcome = self
            .matcher
            .match_iteration()
            .map_err(Into::into)
            .and_then(|_| commit_pass(&self.matcher, &self.pool));

        match outcome {
            Ok(teams) => {
                self.stats.teams += teams.len() as u64;
                self.stats.matched_clients += teams.iter().map(|t| t.len() as u64).sum::<u64>();
                debug!(
                    cycle = self.stats.cycles,
                    teams = teams.len(),
                    waiting = self.pool.len(),
                    "Tick complete"
                );
                Ok(teams)
            }
            Err(e) => {
                self.stats.failed_cycles += 1;
                Err(e)
            }
        }
    }

    /// Tick on the configured interval until `max_cycles` or Ctrl-C.
    ///
    /// A failed cycle is logged and the loop carries on.
    pub async fn run(&mut self) -> Result<ServiceStats> {
        info!("Lobby node starting");
        info!("  Team size: {}", self.config.team_size);
        info!("  Interval: {:?}", self.config.cycle_interval);
        info!("  Waiting: {}", self.pool.len());

        let mut interval = tokio::time::interval(self.config.cycle_interval);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            if self.config.max_cycles.is_some_and(|max| self.stats.cycles >= max) {
                info!(cycles = self.stats.cycles, "Cycle limit reached");
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick() {
                        match &e {
                            ServiceError::Match(m) if m.is_configuration_error() => {
                                warn!("Cycle {} skipped: {}", self.stats.cycles, e);
                            }
                            _ => error!("Cycle {} failed: {}", self.stats.cycles, e),
                        }
                    }
                }
                result = &mut shutdown => {
                    if let Err(e) = result {
                        error!("Failed to listen for shutdown signal: {}", e);
                    }
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        Ok(self.stats)
    }
}

fn register(pool: &InMemoryPool, client: Client) -> bool {
    let id = client.id();
    let added = pool.register(client);
    if !added {
        warn!(client = %id, "Duplicate client ignored");
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ExpansionPolicy;
    use lobby_match::{Attributes, ClientId};
    use std::io::Write;
    use std::time::Duration;

    fn player(id: u64, skill: f64, tolerance: f64) -> Client {
        Client::new(
            ClientId(id),
            Attributes::new().with("skill", skill),
            Attributes::new().with("skill", tolerance),
        )
    }

    fn quick_config() -> ServiceConfig {
        ServiceConfig {
            cycle_interval: Duration::from_millis(1),
            expansion: ExpansionPolicy {
                factor: 1.0,
                step: 10.0,
                ceiling: None,
            },
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn tick_commits_pairs() {
        let mut service = MatchmakerService::new(quick_config()).unwrap();
        service.pool().register(player(1, 100.0, 0.0));
        service.pool().register(player(2, 105.0, 0.0));
        service.pool().register(player(3, 900.0, 0.0));

        // First expansion brings 1 and 2 within 10 of each other
        let teams = service.tick().unwrap();

        assert_eq!(teams.len(), 1);
        assert_eq!(service.pool().len(), 1);
        assert_eq!(
            service.stats(),
            ServiceStats {
                cycles: 1,
                failed_cycles: 0,
                teams: 1,
                matched_clients: 2,
            }
        );
    }

    #[test]
    fn long_wait_does_not_poison_later_cycles() {
        let mut service = MatchmakerService::new(ServiceConfig {
            expansion: ExpansionPolicy {
                factor: 2.0,
                step: 0.0,
                ceiling: None,
            },
            ..quick_config()
        })
        .unwrap();
        service.pool().register(player(1, 0.0, 1.0));

        // Doubling overflows any finite tolerance well before 1100 cycles
        for _ in 0..1100 {
            assert!(service.tick().unwrap().is_empty());
        }
        let tolerance = service.pool().get(ClientId(1)).unwrap().searching_data().get("skill");
        assert_eq!(tolerance, Some(f64::MAX));

        service.pool().register(player(2, 5000.0, 10.0));
        service.pool().register(player(3, 5001.0, 10.0));
        let teams = service.tick().unwrap();

        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].ids().collect::<Vec<_>>(), vec![ClientId(2), ClientId(3)]);
        assert!(service.pool().contains(ClientId(1)));
        assert_eq!(service.stats().failed_cycles, 0);
    }

    #[test]
    fn failed_tick_is_counted() {
        let mut service = MatchmakerService::new(quick_config()).unwrap();
        service.pool().register(player(1, 100.0, 0.0));
        service.pool().register(Client::new(
            ClientId(2),
            Attributes::new().with("latency", 20.0),
            Attributes::new().with("latency", 5.0),
        ));

        assert!(service.tick().is_err());
        assert_eq!(service.stats().failed_cycles, 1);
        assert_eq!(service.pool().len(), 2);
    }

    #[test]
    fn seeds_from_file_then_synthetic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"clients": [
                {
                    "id": 7,
                    "self_data": [["skill", 10.0], ["latency", 5.0]],
                    "searching_data": [["skill", 1.0], ["latency", 1.0]]
                }
            ]}"#,
        )
        .unwrap();

        let service = MatchmakerService::new(ServiceConfig {
            seed_file: Some(file.path().to_path_buf()),
            synthetic_clients: 3,
            ..quick_config()
        })
        .unwrap();

        let ids: Vec<u64> = service.pool().clients().iter().map(|c| c.id().0).collect();
        assert_eq!(ids, vec![7, 8, 9, 10]);
    }

    #[tokio::test]
    async fn run_stops_after_max_cycles() {
        let mut service = MatchmakerService::new(ServiceConfig {
            max_cycles: Some(3),
            ..quick_config()
        })
        .unwrap();
        service.pool().register(player(1, 0.0, 0.0));
        service.pool().register(player(2, 25.0, 0.0));

        let stats = service.run().await.unwrap();

        // Tolerances reach 30 on the third expansion
        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.teams, 1);
        assert!(service.pool().is_empty());
    }

    #[tokio::test]
    async fn run_survives_failed_cycles() {
        let mut service = MatchmakerService::new(ServiceConfig {
            max_cycles: Some(2),
            team_size: 0,
            ..quick_config()
        })
        .unwrap();
        service.pool().register(player(1, 0.0, 0.0));

        let stats = service.run().await.unwrap();

        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.failed_cycles, 2);
    }
}
