use crate::{self_network_status, Provider};
use anyhow::Result;
use ormon_common::config::AgentConfig;
use ormon_common::types::{Description, GraphDescriptor, LabelSpec, MetricSample};
use ormon_control::ControlClient;
use std::collections::HashSet;

/// Relay flags the network-status consensus can assign, the fixed label
/// enumeration of this variant. Every flag is emitted on every fetch,
/// present or not.
pub const RELAY_FLAGS: [&str; 12] = [
    "Authority",
    "BadExit",
    "Exit",
    "Fast",
    "Guard",
    "HSDir",
    "NoEdConsensus",
    "Running",
    "Stable",
    "StaleDesc",
    "V2Dir",
    "Valid",
];

const GRAPH: GraphDescriptor = GraphDescriptor {
    title: "Relay flags",
    args: "-l 0 --upper-limit 1",
    vlabel: "assigned",
    category: "tor",
    info: "Consensus flags currently assigned to this relay.",
};

pub struct FlagsProvider;

impl Provider for FlagsProvider {
    fn name(&self) -> &'static str {
        "flags"
    }

    fn describe(&self, _ctl: &mut dyn ControlClient, _config: &AgentConfig) -> Result<Description> {
        Ok(Description {
            graph: GRAPH,
            labels: RELAY_FLAGS
                .iter()
                .map(|flag| LabelSpec::gauge(*flag).with_max(1))
                .collect(),
        })
    }

    fn collect(
        &self,
        ctl: &mut dyn ControlClient,
        _config: &AgentConfig,
    ) -> Result<Vec<MetricSample>> {
        let status = self_network_status(ctl)?;
        let assigned = flag_set(&status);
        Ok(RELAY_FLAGS
            .iter()
            .map(|flag| MetricSample::count(*flag, u64::from(assigned.contains(flag))))
            .collect())
    }
}

fn flag_set(status: &str) -> HashSet<&str> {
    match status.lines().find_map(|line| line.strip_prefix("s ")) {
        Some(rest) => rest.split_whitespace().collect(),
        None => {
            tracing::warn!("network-status entry carries no flag line");
            HashSet::new()
        }
    }
}
