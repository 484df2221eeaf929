//! Lobby Matchmaking Core
//!
//! Assigns waiting clients to fixed-size teams by multi-dimensional
//! compatibility. Each client has a position (self-data) and a per-attribute
//! tolerance (searching-data) that its pool widens every cycle until it is
//! matched.
//!
//! # Cycle
//!
//! [`Matcher::match_iteration`] runs one cycle:
//!
//! 1. Drop the previous candidate sets and spatial index
//! 2. Snapshot the pool and bulk-load every client into a kd-tree keyed by
//!    its self-data
//! 3. Ask the pool to widen tolerances (exactly once)
//! 4. Snapshot the pool again and range-query each client's tolerance box;
//!    the hits minus the client itself become its candidate set
//!
//! # Teams
//!
//! The cycle commits nothing. A caller then walks the waiting clients, calls
//! [`Matcher::find_matching_set_for`] and
//! [`Matcher::try_creating_a_match_from`], and removes complete teams from
//! its pool. A team is a clique: every member is in every other member's
//! candidate set.
//!
//! # Example
//!
//! ```
//! use lobby_match::{Attributes, Client, ClientId, ClientPool, Matcher, StaticConfig};
//!
//! struct Pool(Vec<Client>);
//!
//! impl ClientPool for Pool {
//!     fn clients(&self) -> Vec<Client> {
//!         self.0.clone()
//!     }
//!     fn expand_search_parameters(&self) {}
//! }
//!
//! let player = |id, skill| {
//!     Client::new(
//!         ClientId(id),
//!         Attributes::new().with("skill", skill),
//!         Attributes::new().with("skill", 50.0),
//!     )
//! };
//! let pool = Pool(vec![player(1, 1200.0), player(2, 1230.0), player(3, 2000.0)]);
//!
//! let mut matcher = Matcher::new(pool, StaticConfig::new(2));
//! matcher.match_iteration()?;
//!
//! let team = matcher.assemble_team_for(ClientId(1))?.expect("client 1 is waiting");
//! assert_eq!(team.ids().collect::<Vec<_>>(), vec![ClientId(1), ClientId(2)]);
//! # Ok::<(), lobby_match::MatchError>(())
//! ```

mod assembly;
mod candidates;
mod client;
mod cycle;
mod error;
mod pool;
mod resolve;

pub use candidates::{CandidateSet, Team};
pub use client::{Attributes, Client, ClientId, Schema};
pub use cycle::{CyclePhase, CycleReport, Matcher};
pub use error::{MatchError, Result};
pub use pool::{ClientPool, MatchConfig, StaticConfig};

pub use lobby_index::{Bounds, IndexError, KdTree, Point};
