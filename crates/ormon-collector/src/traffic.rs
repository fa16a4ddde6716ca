use crate::Provider;
use anyhow::{bail, Result};
use ormon_common::config::AgentConfig;
use ormon_common::types::{Description, GraphDescriptor, LabelSpec, MetricSample};
use ormon_control::ControlClient;

const GRAPH: GraphDescriptor = GraphDescriptor {
    title: "Traffic",
    args: "--base 1000",
    vlabel: "bytes/s",
    category: "tor",
    info: "Cumulative bytes read and written by the daemon.",
};

pub struct TrafficProvider;

impl Provider for TrafficProvider {
    fn name(&self) -> &'static str {
        "traffic"
    }

    fn describe(&self, _ctl: &mut dyn ControlClient, _config: &AgentConfig) -> Result<Description> {
        Ok(Description {
            graph: GRAPH,
            labels: vec![LabelSpec::derive("read"), LabelSpec::derive("written")],
        })
    }

    fn collect(
        &self,
        ctl: &mut dyn ControlClient,
        _config: &AgentConfig,
    ) -> Result<Vec<MetricSample>> {
        // Counter values pass through exactly as the daemon reports them.
        let read = counter(ctl, "traffic/read")?;
        let written = counter(ctl, "traffic/written")?;
        Ok(vec![
            MetricSample::new("read", read),
            MetricSample::new("written", written),
        ])
    }
}

fn counter(ctl: &mut dyn ControlClient, key: &str) -> Result<String> {
    let value = ctl.get_info(key)?;
    let value = value.trim();
    if value.is_empty() {
        bail!("daemon returned an empty value for {key}");
    }
    Ok(value.to_string())
}
