use anyhow::{Context, Result};
use maxminddb::geoip2;
use std::net::IpAddr;
use std::path::Path;

/// Maps a peer address to a country name. The production implementation
/// reads a MaxMind database; tests substitute fixed tables.
pub trait CountryResolver {
    /// English country name for `address`, or `None` when the address does
    /// not parse or maps to no known country.
    fn country(&self, address: &str) -> Option<String>;
}

/// MaxMind country database, loaded from the configured path.
pub struct GeoDb {
    reader: maxminddb::Reader<Vec<u8>>,
}

impl GeoDb {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = maxminddb::Reader::open_readfile(path)
            .with_context(|| format!("opening geo database {}", path.display()))?;
        Ok(Self { reader })
    }
}

impl CountryResolver for GeoDb {
    fn country(&self, address: &str) -> Option<String> {
        let ip: IpAddr = address.parse().ok()?;
        let entry: geoip2::Country<'_> = self.reader.lookup(ip).ok()?;
        let names = entry.country?.names?;
        names.get("en").map(|name| (*name).to_string())
    }
}

/// Collapses a country name into a single aggregation token: the name is
/// truncated at the first comma or parenthesized qualifier and the
/// remaining words are joined, so "Korea, Republic of" and "Korea" land on
/// the same key. Idempotent.
pub fn normalize_country(name: &str) -> String {
    let head = name.split([',', '(']).next().unwrap_or(name);
    head.split_whitespace().collect()
}
