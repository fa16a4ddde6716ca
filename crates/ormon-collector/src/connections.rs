use crate::Provider;
use anyhow::Result;
use ormon_common::config::AgentConfig;
use ormon_common::types::{Description, GraphDescriptor, LabelSpec, MetricSample};
use ormon_control::ControlClient;
use std::collections::BTreeMap;

/// OR connection states, the fixed label enumeration of this variant.
/// Every state is emitted on every fetch, zero or not.
const STATES: [&str; 5] = ["new", "launched", "connected", "failed", "closed"];

const GRAPH: GraphDescriptor = GraphDescriptor {
    title: "OR connections",
    args: "-l 0",
    vlabel: "connections",
    category: "tor",
    info: "Onion-routing connections of this relay, by state.",
};

pub struct ConnectionsProvider;

impl Provider for ConnectionsProvider {
    fn name(&self) -> &'static str {
        "connections"
    }

    fn describe(&self, _ctl: &mut dyn ControlClient, _config: &AgentConfig) -> Result<Description> {
        Ok(Description {
            graph: GRAPH,
            labels: STATES.iter().map(|state| LabelSpec::gauge(*state)).collect(),
        })
    }

    fn collect(
        &self,
        ctl: &mut dyn ControlClient,
        _config: &AgentConfig,
    ) -> Result<Vec<MetricSample>> {
        let listing = ctl.get_info("orconn-status")?;
        let counts = tally(&listing);
        Ok(STATES
            .iter()
            .map(|state| MetricSample::count(*state, counts.get(state).copied().unwrap_or(0)))
            .collect())
    }
}

fn tally(listing: &str) -> BTreeMap<&'static str, u64> {
    // Seed every state with 0 so none disappears from the tally.
    let mut counts: BTreeMap<&'static str, u64> = STATES.iter().map(|state| (*state, 0)).collect();
    for line in listing.lines().filter(|line| !line.trim().is_empty()) {
        let Some(state) = line.split_whitespace().nth(1) else {
            tracing::warn!(%line, "connection entry without a state column");
            continue;
        };
        match STATES.iter().find(|known| state.eq_ignore_ascii_case(known)) {
            Some(known) => *counts.entry(*known).or_insert(0) += 1,
            None => tracing::warn!(%state, "ignoring unknown connection state"),
        }
    }
    counts
}
