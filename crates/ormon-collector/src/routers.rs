use crate::Provider;
use anyhow::Result;
use ormon_common::config::AgentConfig;
use ormon_common::types::{Description, GraphDescriptor, LabelSpec, MetricSample};
use ormon_control::ControlClient;

const GRAPH: GraphDescriptor = GraphDescriptor {
    title: "Known routers",
    args: "-l 0",
    vlabel: "routers",
    category: "tor",
    info: "Router entries in the full network-status listing.",
};

pub struct RoutersProvider;

impl Provider for RoutersProvider {
    fn name(&self) -> &'static str {
        "routers"
    }

    fn describe(&self, _ctl: &mut dyn ControlClient, _config: &AgentConfig) -> Result<Description> {
        Ok(Description {
            graph: GRAPH,
            labels: vec![LabelSpec::gauge("routers")],
        })
    }

    fn collect(
        &self,
        ctl: &mut dyn ControlClient,
        _config: &AgentConfig,
    ) -> Result<Vec<MetricSample>> {
        let listing = ctl.get_info("ns/all")?;
        Ok(vec![MetricSample::count("routers", count_routers(&listing))])
    }
}

/// Counts listing lines whose entry type marks a router record.
fn count_routers(listing: &str) -> u64 {
    listing
        .lines()
        .filter(|line| line.split_whitespace().next() == Some("r"))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ns_listing, test_config, ScriptedClient};
    use ormon_common::types::Variant;

    #[test]
    fn only_router_entries_are_counted() {
        let listing = ns_listing(&["1.1.1.1", "2.2.2.2", "3.3.3.3"]);
        assert_eq!(count_routers(&listing), 3);
    }

    #[test]
    fn collect_reports_the_router_count() {
        let mut ctl = ScriptedClient::new().reply("ns/all", &ns_listing(&["1.1.1.1"]));
        let samples = RoutersProvider
            .collect(&mut ctl, &test_config(Variant::Routers))
            .unwrap();
        assert_eq!(samples, vec![MetricSample::count("routers", 1)]);
    }
}
