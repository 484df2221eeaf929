//! Startup population: clients from a JSON file or a seeded generator.

use std::path::Path;

use lobby_match::{Attributes, Client, ClientId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::error::Result;

/// Accepted seed file layouts: a bare array or `{"clients": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SeedFile {
    List(Vec<Client>),
    Wrapped { clients: Vec<Client> },
}

/// Parse clients from a JSON seed file.
pub fn load_seed_file(path: &Path) -> Result<Vec<Client>> {
    let raw = std::fs::read_to_string(path)?;
    parse_seed(&raw)
}

/// Parse clients from JSON text.
pub fn parse_seed(raw: &str) -> Result<Vec<Client>> {
    let clients = match serde_json::from_str(raw)? {
        SeedFile::List(clients) => clients,
        SeedFile::Wrapped { clients } => clients,
    };
    Ok(clients)
}

/// Generate `count` clients with identifiers starting at `first_id`.
///
/// Positions fall in `[0, 1000)` and initial tolerances in `[0, 50)` for
/// every attribute. The same seed yields the same clients.
pub fn synthetic_clients(
    count: usize,
    first_id: u64,
    attributes: &[String],
    seed: u64,
) -> Vec<Client> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count as u64)
        .map(|offset| {
            let self_data: Attributes = attributes
                .iter()
                .map(|name| (name.as_str(), rng.gen_range(0.0..1000.0)))
                .collect();
            let searching_data: Attributes = attributes
                .iter()
                .map(|name| (name.as_str(), rng.gen_range(0.0..50.0)))
                .collect();
            Client::new(ClientId(first_id + offset), self_data, searching_data)
        })
        .collect()
}
