use crate::Provider;
use anyhow::{bail, Result};
use ormon_common::config::AgentConfig;
use ormon_common::types::{Description, GraphDescriptor, LabelSpec, MetricSample};
use ormon_control::ControlClient;

const GRAPH: GraphDescriptor = GraphDescriptor {
    title: "Dormant state",
    args: "-l 0 --upper-limit 1",
    vlabel: "state",
    category: "tor",
    info: "1 while the relay is dormant, 0 while it is active.",
};

pub struct DormantProvider;

impl Provider for DormantProvider {
    fn name(&self) -> &'static str {
        "dormant"
    }

    fn describe(&self, _ctl: &mut dyn ControlClient, _config: &AgentConfig) -> Result<Description> {
        Ok(Description {
            graph: GRAPH,
            labels: vec![LabelSpec::gauge("dormant").with_max(1)],
        })
    }

    fn collect(
        &self,
        ctl: &mut dyn ControlClient,
        _config: &AgentConfig,
    ) -> Result<Vec<MetricSample>> {
        let reply = ctl.get_info("dormant")?;
        let state = match reply.trim() {
            "0" => 0u64,
            "1" => 1,
            other => bail!("unexpected dormant reply '{other}'"),
        };
        Ok(vec![MetricSample::count("dormant", state)])
    }
}
