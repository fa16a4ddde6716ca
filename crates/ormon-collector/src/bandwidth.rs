use crate::{self_network_status, Provider};
use anyhow::{bail, Context, Result};
use ormon_common::config::AgentConfig;
use ormon_common::types::{Description, GraphDescriptor, LabelSpec, MetricSample};
use ormon_control::ControlClient;

const GRAPH: GraphDescriptor = GraphDescriptor {
    title: "Relay bandwidth",
    args: "--base 1000 -l 0",
    vlabel: "KB/s",
    category: "tor",
    info: "Bandwidth weight from this relay's own network-status entry.",
};

pub struct BandwidthProvider;

impl Provider for BandwidthProvider {
    fn name(&self) -> &'static str {
        "bandwidth"
    }

    fn describe(&self, _ctl: &mut dyn ControlClient, _config: &AgentConfig) -> Result<Description> {
        Ok(Description {
            graph: GRAPH,
            labels: vec![LabelSpec::gauge("bandwidth")],
        })
    }

    fn collect(
        &self,
        ctl: &mut dyn ControlClient,
        _config: &AgentConfig,
    ) -> Result<Vec<MetricSample>> {
        let status = self_network_status(ctl)?;
        let capacity = parse_bandwidth(&status)?;
        Ok(vec![MetricSample::count("bandwidth", capacity)])
    }
}

fn parse_bandwidth(status: &str) -> Result<u64> {
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("w ") {
            for field in rest.split_whitespace() {
                if let Some(value) = field.strip_prefix("Bandwidth=") {
                    return value
                        .parse()
                        .with_context(|| format!("unparsable bandwidth weight '{value}'"));
                }
            }
        }
    }
    bail!("network-status entry carries no bandwidth weight")
}
