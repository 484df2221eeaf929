//! The matching cycle controller.
//!
//! One cycle walks a fixed sequence of phases:
//!
//! ```text
//! Idle → IndexCleared → IndexBuilt → TolerancesExpanded → CandidatesResolved → Idle
//! ```
//!
//! Nothing is retried. A failing step aborts the cycle, drops whatever the
//! cycle had built so far and hands the error back; the next cycle starts from
//! a clean slate. The only state carried from one cycle to the next is the
//! cycle counter.

use std::collections::HashMap;
use std::sync::Arc;

use lobby_index::KdTree;
use tracing::{debug, info, warn};

use crate::candidates::CandidateSet;
use crate::client::{Client, ClientId, Schema};
use crate::error::Result;
use crate::pool::{ClientPool, MatchConfig};

/// Where the controller is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CyclePhase {
    /// No cycle running.
    #[default]
    Idle,
    /// Previous candidates and index dropped.
    IndexCleared,
    /// Fresh index built from the pool snapshot.
    IndexBuilt,
    /// Pool widened every tolerance once.
    TolerancesExpanded,
    /// Every waiting client has a candidate set.
    CandidatesResolved,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CyclePhase::Idle => "idle",
            CyclePhase::IndexCleared => "index-cleared",
            CyclePhase::IndexBuilt => "index-built",
            CyclePhase::TolerancesExpanded => "tolerances-expanded",
            CyclePhase::CandidatesResolved => "candidates-resolved",
        };
        f.write_str(name)
    }
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Cycle number, starting at 1.
    pub cycle: u64,
    /// Clients inserted into the index.
    pub indexed: usize,
    /// Clients that received a candidate set.
    pub resolved: usize,
    /// Resolved clients whose candidate set is empty.
    pub unmatched: usize,
}

/// Matching engine over a client pool.
///
/// Owns the per-cycle spatial index and candidate-set map. Steps that change
/// that state take `&mut self`, so cycles cannot overlap.
pub struct Matcher<P, C> {
    pub(crate) pool: P,
    pub(crate) config: C,
    pub(crate) index: Option<KdTree<Arc<Client>>>,
    pub(crate) schema: Option<Schema>,
    pub(crate) candidates: HashMap<ClientId, CandidateSet>,
    pub(crate) roster: HashMap<ClientId, Arc<Client>>,
    pub(crate) phase: CyclePhase,
    pub(crate) cycle: u64,
}

impl<P: ClientPool, C: MatchConfig> Matcher<P, C> {
    /// Create a matcher with no cycle run yet.
    pub fn new(pool: P, config: C) -> Self {
        Self::with_candidates(pool, config, HashMap::new())
    }

    /// Create a matcher around candidate sets resolved elsewhere.
    pub fn with_candidates(
        pool: P,
        config: C,
        candidates: HashMap<ClientId, CandidateSet>,
    ) -> Self {
        Self {
            pool,
            config,
            index: None,
            schema: None,
            candidates,
            roster: HashMap::new(),
            phase: CyclePhase::Idle,
            cycle: 0,
        }
    }

    /// The pool this matcher reads.
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Current phase.
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Number of cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// The index built this cycle, if any.
    pub fn index(&self) -> Option<&KdTree<Arc<Client>>> {
        self.index.as_ref()
    }

    /// The schema fixed this cycle, if any.
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Candidate sets resolved this cycle.
    pub fn candidates(&self) -> &HashMap<ClientId, CandidateSet> {
        &self.candidates
    }

    /// Drop the candidate-set map and the index. Idempotent.
    pub fn clear_search_tree(&mut self) {
        self.candidates.clear();
        self.roster.clear();
        self.index = None;
        self.schema = None;
    }

    /// Run one full cycle: clear, rebuild the index, expand tolerances once,
    /// resolve candidate sets.
    ///
    /// On error the cycle's partial state is discarded and the controller is
    /// back in [`CyclePhase::Idle`].
    pub fn match_iteration(&mut self) -> Result<CycleReport> {
        self.cycle += 1;
        let cycle = self.cycle;

        match self.run_cycle(cycle) {
            Ok(report) => {
                self.phase = CyclePhase::Idle;
                info!(
                    cycle,
                    indexed = report.indexed,
                    resolved = report.resolved,
                    unmatched = report.unmatched,
                    "Matching cycle complete"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(cycle, phase = %self.phase, error = %e, "Matching cycle aborted");
                self.clear_search_tree();
                self.phase = CyclePhase::Idle;
                Err(e)
            }
        }
    }

    fn run_cycle(&mut self, cycle: u64) -> Result<CycleReport> {
        self.clear_search_tree();
        self.advance(CyclePhase::IndexCleared);

        let indexed = self.rebuild_index()?;
        self.advance(CyclePhase::IndexBuilt);

        self.pool.expand_search_parameters();
        self.advance(CyclePhase::TolerancesExpanded);

        let resolved = self.resolve_candidates()?;
        self.advance(CyclePhase::CandidatesResolved);

        let unmatched = self.candidates.values().filter(|set| set.is_empty()).count();

        Ok(CycleReport {
            cycle,
            indexed,
            resolved,
            unmatched,
        })
    }

    fn advance(&mut self, next: CyclePhase) {
        debug!(from = %self.phase, to = %next, "Cycle phase");
        self.phase = next;
    }
}

impl<P, C> std::fmt::Debug for Matcher<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("phase", &self.phase)
            .field("cycle", &self.cycle)
            .field("indexed", &self.index.as_ref().map(KdTree::len))
            .field("candidates", &self.candidates.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Attributes;
    use crate::pool::StaticConfig;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct CountingPool {
        clients: RefCell<Vec<Client>>,
        reads: Cell<usize>,
        expansions: Cell<usize>,
    }

    impl ClientPool for CountingPool {
        fn clients(&self) -> Vec<Client> {
            self.reads.set(self.reads.get() + 1);
            self.clients.borrow().clone()
        }

        fn expand_search_parameters(&self) {
            self.expansions.set(self.expansions.get() + 1);
            for client in self.clients.borrow_mut().iter_mut() {
                for tolerance in client.searching_data_mut().values_mut() {
                    *tolerance += 1.0;
                }
            }
        }
    }

    fn client(id: u64, skill: f64, tolerance: f64) -> Client {
        Client::new(
            ClientId(id),
            Attributes::new().with("skill", skill),
            Attributes::new().with("skill", tolerance),
        )
    }

    #[test]
    fn empty_pool_cycle() {
        let pool = CountingPool::default();
        let mut matcher = Matcher::new(&pool, StaticConfig::new(2));

        let report = matcher.match_iteration().unwrap();

        assert!(matcher.candidates().is_empty());
        assert_eq!(pool.reads.get(), 2);
        assert_eq!(pool.expansions.get(), 1);
        assert_eq!(report.cycle, 1);
        assert_eq!(report.indexed, 0);
        assert_eq!(report.resolved, 0);
        assert_eq!(matcher.phase(), CyclePhase::Idle);
    }

    #[test]
    fn clear_is_idempotent() {
        let pool = CountingPool::default();
        let mut stale = HashMap::new();
        stale.insert(ClientId(5), CandidateSet::new());
        let mut matcher = Matcher::with_candidates(&pool, StaticConfig::new(2), stale);

        matcher.clear_search_tree();
        assert!(matcher.candidates().is_empty());
        matcher.clear_search_tree();
        assert!(matcher.candidates().is_empty());
        assert!(matcher.index().is_none());
    }

    #[test]
    fn expansion_happens_between_reads() {
        let pool = CountingPool::default();
        // 10 and 12 are two apart; tolerance 1 only reaches after one expansion
        pool.clients.borrow_mut().extend([client(1, 10.0, 1.0), client(2, 12.0, 1.0)]);
        let mut matcher = Matcher::new(&pool, StaticConfig::new(2));

        let report = matcher.match_iteration().unwrap();

        assert_eq!(report.unmatched, 0);
        assert!(matcher.find_matching_set_for(ClientId(1)).contains(ClientId(2)));
        assert!(matcher.find_matching_set_for(ClientId(2)).contains(ClientId(1)));
    }

    #[test]
    fn failed_cycle_leaves_clean_state() {
        let pool = CountingPool::default();
        pool.clients.borrow_mut().extend([
            client(1, 10.0, 1.0),
            Client::new(
                ClientId(2),
                Attributes::new().with("latency", 3.0),
                Attributes::new().with("latency", 1.0),
            ),
        ]);
        let mut matcher = Matcher::new(&pool, StaticConfig::new(2));

        let err = matcher.match_iteration().unwrap_err();

        assert!(err.is_configuration_error());
        assert!(matcher.candidates().is_empty());
        assert!(matcher.index().is_none());
        assert_eq!(matcher.phase(), CyclePhase::Idle);
        // Aborted during the index build: no expansion, a single read
        assert_eq!(pool.expansions.get(), 0);
        assert_eq!(pool.reads.get(), 1);
    }

    #[test]
    fn cycle_counter_advances_across_failures() {
        let pool = CountingPool::default();
        let mut matcher = Matcher::new(&pool, StaticConfig::new(2));

        matcher.match_iteration().unwrap();
        pool.clients.borrow_mut().push(client(1, 1.0, -5.0));
        assert!(matcher.match_iteration().is_err());
        pool.clients.borrow_mut().clear();
        let report = matcher.match_iteration().unwrap();

        assert_eq!(report.cycle, 3);
        assert_eq!(matcher.cycles(), 3);
    }

    #[test]
    fn phase_display() {
        assert_eq!(CyclePhase::TolerancesExpanded.to_string(), "tolerances-expanded");
    }
}
