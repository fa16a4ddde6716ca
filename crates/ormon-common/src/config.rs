use crate::error::UsageError;
use crate::types::Variant;
use std::path::PathBuf;

const DEFAULT_CONTROL_PORT: u16 = 9051;
const DEFAULT_CONTROL_SOCKET: &str = "/var/run/tor/control";
const DEFAULT_CACHE_FILE: &str = "countries.json";
const DEFAULT_MAX_COUNTRIES: usize = 15;
const DEFAULT_GEOIP_DB: &str = "/usr/share/GeoIP/GeoLite2-Country.mmdb";

/// How to reach the daemon's control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMethod {
    Port,
    Socket,
}

/// Immutable per-invocation configuration, resolved from the environment
/// once at startup and threaded explicitly into the connection, the
/// authentication flow and the providers.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Active metric variant; `config`/`fetch` fail without one.
    pub variant: Option<Variant>,
    pub method: ConnectMethod,
    pub port: u16,
    pub socket_path: PathBuf,
    /// Control credential; its absence only matters if the daemon's
    /// handshake demands one.
    pub password: Option<String>,
    /// Country cache directory; the cache is disabled when unset.
    pub cache_dir: Option<PathBuf>,
    pub cache_file: String,
    pub max_countries: usize,
    pub geoip_db: PathBuf,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, UsageError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Tests
    /// feed this a map instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, UsageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let variant = match lookup("ORMON_VARIANT") {
            Some(name) => Some(Variant::parse(&name)?),
            None => None,
        };

        let method = match lookup("ORMON_CONNECT_METHOD").as_deref() {
            None | Some("port") => ConnectMethod::Port,
            Some("socket") => ConnectMethod::Socket,
            Some(other) => return Err(UsageError::UnsupportedTransport(other.to_string())),
        };

        let port = match lookup("ORMON_CONTROL_PORT") {
            Some(value) => value
                .parse()
                .map_err(|e: std::num::ParseIntError| UsageError::InvalidEnvValue {
                    var: "ORMON_CONTROL_PORT",
                    value,
                    reason: e.to_string(),
                })?,
            None => DEFAULT_CONTROL_PORT,
        };

        let max_countries = match lookup("ORMON_MAX_COUNTRIES") {
            Some(value) => value
                .parse()
                .map_err(|e: std::num::ParseIntError| UsageError::InvalidEnvValue {
                    var: "ORMON_MAX_COUNTRIES",
                    value,
                    reason: e.to_string(),
                })?,
            None => DEFAULT_MAX_COUNTRIES,
        };

        Ok(Self {
            variant,
            method,
            port,
            socket_path: lookup("ORMON_CONTROL_SOCKET")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTROL_SOCKET)),
            password: lookup("ORMON_PASSWORD"),
            cache_dir: lookup("ORMON_CACHE_DIR").map(PathBuf::from),
            cache_file: lookup("ORMON_CACHE_FILE").unwrap_or_else(|| DEFAULT_CACHE_FILE.to_string()),
            max_countries,
            geoip_db: lookup("ORMON_GEOIP_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GEOIP_DB)),
        })
    }

    /// Full path of the country cache file, if caching is configured.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(&self.cache_file))
    }
}
