use crate::geo::GeoDb;
use crate::{cache, Provider};
use anyhow::Result;
use ormon_common::config::AgentConfig;
use ormon_common::types::{Description, GraphDescriptor, LabelSpec, MetricSample};
use ormon_control::ControlClient;

const GRAPH: GraphDescriptor = GraphDescriptor {
    title: "Relays per country",
    args: "-l 0",
    vlabel: "relays",
    category: "tor",
    info: "Known relay addresses aggregated by country.",
};

/// The one provider with a dynamic label set: the countries come from the
/// snapshot, so `config` and `fetch` agree within one cache lifetime.
pub struct CountriesProvider;

impl Provider for CountriesProvider {
    fn name(&self) -> &'static str {
        "countries"
    }

    fn describe(&self, ctl: &mut dyn ControlClient, config: &AgentConfig) -> Result<Description> {
        let geo = GeoDb::open(&config.geoip_db)?;
        let snapshot = cache::refresh(ctl, &geo, config)?;
        Ok(Description {
            graph: GRAPH,
            labels: snapshot
                .iter()
                .map(|(name, _)| LabelSpec::gauge(name.clone()))
                .collect(),
        })
    }

    fn collect(
        &self,
        ctl: &mut dyn ControlClient,
        config: &AgentConfig,
    ) -> Result<Vec<MetricSample>> {
        let snapshot = match cache::load(config) {
            Some(snapshot) => snapshot,
            None => {
                let geo = GeoDb::open(&config.geoip_db)?;
                cache::compute(ctl, &geo, config)?
            }
        };
        Ok(snapshot
            .into_iter()
            .map(|(name, count)| MetricSample::count(name, count))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, ScriptedClient};
    use ormon_common::types::Variant;

    #[test]
    fn collect_serves_from_the_cache_without_touching_geo_or_daemon() {
        // A pre-written cache file means neither the geo database nor the
        // daemon is consulted on the fetch path.
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(Variant::Countries);
        config.cache_dir = Some(dir.path().to_path_buf());
        std::fs::write(
            config.cache_path().unwrap(),
            r#"[["Germany",3],["Unknown",1]]"#,
        )
        .unwrap();

        let mut ctl = ScriptedClient::new();
        let samples = CountriesProvider.collect(&mut ctl, &config).unwrap();
        assert_eq!(
            samples,
            vec![
                MetricSample::count("Germany", 3),
                MetricSample::count("Unknown", 1),
            ]
        );
    }

    #[test]
    fn describe_fails_without_a_geo_database() {
        let mut ctl = ScriptedClient::new();
        let config = test_config(Variant::Countries);
        assert!(CountriesProvider.describe(&mut ctl, &config).is_err());
    }
}
