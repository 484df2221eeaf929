//! Service configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use lobby_match::{Schema, StaticConfig};

use crate::error::{Result, ServiceError};
use crate::pool::ExpansionPolicy;

/// Attributes used for synthetic clients when no schema is configured.
pub const DEFAULT_ATTRIBUTES: [&str; 2] = ["skill", "latency"];

/// Configuration for a Lobby node.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Members per team
    pub team_size: usize,

    /// Fixed attribute schema (derived per cycle when absent)
    pub attributes: Option<Vec<String>>,

    /// Pause between matching cycles
    pub cycle_interval: Duration,

    /// Stop after this many cycles (run forever when absent)
    pub max_cycles: Option<u64>,

    /// Per-cycle tolerance widening
    pub expansion: ExpansionPolicy,

    /// JSON file of clients to register at startup
    pub seed_file: Option<PathBuf>,

    /// Number of random clients to register at startup
    pub synthetic_clients: usize,

    /// RNG seed for synthetic clients
    pub synthetic_seed: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            team_size: 2,
            attributes: None,
            cycle_interval: Duration::from_millis(1000),
            max_cycles: None,
            expansion: ExpansionPolicy::default(),
            seed_file: None,
            synthetic_clients: 0,
            synthetic_seed: 42,
        }
    }
}

impl ServiceConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from any name → value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let team_size = parse(&lookup, "LOBBY_TEAM_SIZE")?.unwrap_or(defaults.team_size);
        if team_size == 0 {
            return Err(ServiceError::Config("LOBBY_TEAM_SIZE must be at least 1".into()));
        }

        let attributes = lookup("LOBBY_ATTRIBUTES")
            .map(|s| {
                s.split(',')
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|a| !a.is_empty());

        let cycle_interval = parse(&lookup, "LOBBY_CYCLE_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.cycle_interval);
        if cycle_interval.is_zero() {
            return Err(ServiceError::Config("LOBBY_CYCLE_INTERVAL_MS must be positive".into()));
        }

        let expansion = ExpansionPolicy {
            factor: parse(&lookup, "LOBBY_EXPANSION_FACTOR")?.unwrap_or(defaults.expansion.factor),
            step: parse(&lookup, "LOBBY_EXPANSION_STEP")?.unwrap_or(defaults.expansion.step),
            ceiling: parse(&lookup, "LOBBY_TOLERANCE_CEILING")?,
        };
        validate_expansion(&expansion)?;

        Ok(Self {
            team_size,
            attributes,
            cycle_interval,
            max_cycles: parse(&lookup, "LOBBY_MAX_CYCLES")?,
            expansion,
            seed_file: lookup("LOBBY_SEED_FILE").map(PathBuf::from),
            synthetic_clients: parse(&lookup, "LOBBY_SYNTHETIC_CLIENTS")?
                .unwrap_or(defaults.synthetic_clients),
            synthetic_seed: parse(&lookup, "LOBBY_SYNTHETIC_SEED")?
                .unwrap_or(defaults.synthetic_seed),
        })
    }

    /// The matching configuration this service hands the core.
    pub fn match_config(&self) -> StaticConfig {
        let config = StaticConfig::new(self.team_size);
        match &self.attributes {
            Some(names) => config.with_schema(Schema::new(names.iter().cloned())),
            None => config,
        }
    }

    /// Attribute names for synthetic clients.
    pub fn synthetic_attributes(&self) -> Vec<String> {
        match &self.attributes {
            Some(names) => names.clone(),
            None => DEFAULT_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn parse<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ServiceError::Config(format!("Invalid {}={:?}: {}", name, raw, e))),
    }
}

fn validate_expansion(policy: &ExpansionPolicy) -> Result<()> {
    if !policy.factor.is_finite() || policy.factor < 1.0 {
        return Err(ServiceError::Config(format!(
            "LOBBY_EXPANSION_FACTOR must be >= 1, got {}",
            policy.factor
        )));
    }
    if !policy.step.is_finite() || policy.step < 0.0 {
        return Err(ServiceError::Config(format!(
            "LOBBY_EXPANSION_STEP must be >= 0, got {}",
            policy.step
        )));
    }
    if let Some(ceiling) = policy.ceiling {
        if !ceiling.is_finite() || ceiling < 0.0 {
            return Err(ServiceError::Config(format!(
                "LOBBY_TOLERANCE_CEILING must be >= 0, got {}",
                ceiling
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobby_match::MatchConfig;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(config(&[]).unwrap(), ServiceConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            ("LOBBY_TEAM_SIZE", "5"),
            ("LOBBY_ATTRIBUTES", "skill, region ,latency"),
            ("LOBBY_CYCLE_INTERVAL_MS", "250"),
            ("LOBBY_MAX_CYCLES", "12"),
            ("LOBBY_EXPANSION_STEP", "2.5"),
            ("LOBBY_EXPANSION_FACTOR", "1.1"),
            ("LOBBY_TOLERANCE_CEILING", "400"),
            ("LOBBY_SEED_FILE", "/tmp/clients.json"),
            ("LOBBY_SYNTHETIC_CLIENTS", "100"),
            ("LOBBY_SYNTHETIC_SEED", "7"),
        ])
        .unwrap();

        assert_eq!(cfg.team_size, 5);
        assert_eq!(
            cfg.attributes,
            Some(vec!["skill".to_string(), "region".to_string(), "latency".to_string()])
        );
        assert_eq!(cfg.cycle_interval, Duration::from_millis(250));
        assert_eq!(cfg.max_cycles, Some(12));
        assert_eq!(cfg.expansion.step, 2.5);
        assert_eq!(cfg.expansion.factor, 1.1);
        assert_eq!(cfg.expansion.ceiling, Some(400.0));
        assert_eq!(cfg.seed_file, Some(PathBuf::from("/tmp/clients.json")));
        assert_eq!(cfg.synthetic_clients, 100);
        assert_eq!(cfg.synthetic_seed, 7);
        assert_eq!(
            cfg.match_config().schema(),
            Some(Schema::new(["skill", "region", "latency"]))
        );
    }

    #[test]
    fn unparsable_value_is_config_error() {
        let err = config(&[("LOBBY_TEAM_SIZE", "three")]).unwrap_err();
        assert!(matches!(err, ServiceError::Config(msg) if msg.contains("LOBBY_TEAM_SIZE")));
    }

    #[test]
    fn zero_team_size_rejected() {
        assert!(config(&[("LOBBY_TEAM_SIZE", "0")]).is_err());
    }

    #[test]
    fn shrinking_expansion_rejected() {
        assert!(config(&[("LOBBY_EXPANSION_FACTOR", "0.5")]).is_err());
        assert!(config(&[("LOBBY_EXPANSION_STEP", "-1")]).is_err());
    }

    #[test]
    fn blank_attribute_list_means_derived_schema() {
        let cfg = config(&[("LOBBY_ATTRIBUTES", " , ")]).unwrap();
        assert!(cfg.attributes.is_none());
        assert_eq!(cfg.synthetic_attributes(), vec!["skill", "latency"]);
    }
}
