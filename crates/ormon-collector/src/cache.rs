//! Persisted snapshot of the countries aggregation.
//!
//! The aggregation is the one expensive computation in the agent: one
//! network-status enumeration plus one geo lookup per address. The
//! `config` path always recomputes and overwrites the cache file (when one
//! is configured); the `fetch` path reads the file and falls back to a
//! fresh computation on any read failure. A torn or corrupt file is a
//! cache miss, never an error.

use crate::geo::{normalize_country, CountryResolver};
use anyhow::{Context, Result};
use ormon_common::config::AgentConfig;
use ormon_control::ControlClient;
use std::collections::HashMap;
use std::fs;

/// Ordered `(countryName, count)` pairs: count descending, name ascending
/// on ties, truncated to the configured maximum.
pub type CountrySnapshot = Vec<(String, u64)>;

/// Addresses that resolve to no known country are tallied under this name,
/// so the aggregated total always equals the number of enumerated
/// addresses.
pub const UNRESOLVED_COUNTRY: &str = "Unknown";

/// Aggregates the current network status into a snapshot. Country names
/// are normalized before aggregation.
pub fn compute(
    ctl: &mut dyn ControlClient,
    resolver: &dyn CountryResolver,
    config: &AgentConfig,
) -> Result<CountrySnapshot> {
    let listing = ctl.get_info("ns/all")?;
    let mut counts: HashMap<String, u64> = HashMap::new();
    for address in router_addresses(&listing) {
        let name = resolver
            .country(address)
            .map(|raw| normalize_country(&raw))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNRESOLVED_COUNTRY.to_string());
        *counts.entry(name).or_insert(0) += 1;
    }
    let mut snapshot: CountrySnapshot = counts.into_iter().collect();
    snapshot.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    snapshot.truncate(config.max_countries);
    Ok(snapshot)
}

/// Recomputes the snapshot and overwrites the cache file when a cache
/// directory is configured. Only this path writes.
pub fn refresh(
    ctl: &mut dyn ControlClient,
    resolver: &dyn CountryResolver,
    config: &AgentConfig,
) -> Result<CountrySnapshot> {
    let snapshot = compute(ctl, resolver, config)?;
    if let Some(path) = config.cache_path() {
        let body = serde_json::to_string(&snapshot)?;
        fs::write(&path, body)
            .with_context(|| format!("writing country cache {}", path.display()))?;
    }
    Ok(snapshot)
}

/// Reads the cached snapshot. Any failure (cache disabled, file absent,
/// unreadable or malformed) yields `None`; the caller recomputes.
pub fn load(config: &AgentConfig) -> Option<CountrySnapshot> {
    let path = config.cache_path()?;
    let body = match fs::read_to_string(&path) {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "country cache unreadable, recomputing");
            return None;
        }
    };
    match serde_json::from_str(&body) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "country cache malformed, recomputing");
            None
        }
    }
}

/// Yields the address column of every router (`r`) entry in a
/// network-status listing.
pub(crate) fn router_addresses(listing: &str) -> impl Iterator<Item = &str> {
    listing.lines().filter_map(|line| {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("r") => fields.nth(5),
            _ => None,
        }
    })
}
