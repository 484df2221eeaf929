//! Lobby Service
//!
//! A single-process matchmaker built on `lobby-match`:
//!
//! - [`InMemoryPool`]: waiting clients behind one lock, with a configurable
//!   [`ExpansionPolicy`] for per-cycle tolerance growth
//! - [`commit_pass`]: turns a cycle's candidate sets into committed teams
//! - [`MatchmakerService`]: ticks the cycle on an interval
//!
//! Configuration comes from `LOBBY_*` environment variables, see
//! [`ServiceConfig::from_env`].

pub mod commit;
pub mod config;
pub mod error;
pub mod pool;
pub mod seed;
pub mod service;

pub use commit::commit_pass;
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use pool::{ExpansionPolicy, InMemoryPool};
pub use service::{MatchmakerService, ServiceStats};
