//! Metric providers for the ormon agent.
//!
//! Each [`Provider`] implementation answers one metric variant: it declares
//! its graph metadata and label set (`describe`) and produces current
//! values (`collect`) over an authenticated control session. The label set
//! declared by `describe` is binding: `collect` emits a value for exactly
//! those labels on every invocation, including zero-count cases.

pub mod bandwidth;
pub mod cache;
pub mod connections;
pub mod countries;
pub mod dormant;
pub mod flags;
pub mod geo;
pub mod routers;
pub mod traffic;

use anyhow::Result;
use ormon_common::config::AgentConfig;
use ormon_common::types::{Description, MetricSample, Variant};
use ormon_control::ControlClient;

/// A metric variant served by the agent.
pub trait Provider {
    /// Returns the variant name (e.g., `"connections"`), used for logging.
    fn name(&self) -> &'static str;

    /// Declares the graph metadata and the label set `collect` will emit.
    ///
    /// # Errors
    ///
    /// Returns an error if a daemon query or the geo lookup setup fails.
    fn describe(&self, ctl: &mut dyn ControlClient, config: &AgentConfig) -> Result<Description>;

    /// Produces one value per declared label.
    ///
    /// # Errors
    ///
    /// Returns an error if a daemon query fails or a reply is unusable.
    fn collect(
        &self,
        ctl: &mut dyn ControlClient,
        config: &AgentConfig,
    ) -> Result<Vec<MetricSample>>;
}

/// Resolves the provider serving a variant.
pub fn provider_for(variant: Variant) -> Box<dyn Provider> {
    match variant {
        Variant::Bandwidth => Box::new(bandwidth::BandwidthProvider),
        Variant::Connections => Box::new(connections::ConnectionsProvider),
        Variant::Countries => Box::new(countries::CountriesProvider),
        Variant::Dormant => Box::new(dormant::DormantProvider),
        Variant::Flags => Box::new(flags::FlagsProvider),
        Variant::Routers => Box::new(routers::RoutersProvider),
        Variant::Traffic => Box::new(traffic::TrafficProvider),
    }
}

/// Fetches the daemon's network-status entry for its own identity.
pub(crate) fn self_network_status(ctl: &mut dyn ControlClient) -> Result<String> {
    let fingerprint = ctl.get_info("fingerprint")?;
    Ok(ctl.get_info(&format!("ns/id/{fingerprint}"))?)
}
