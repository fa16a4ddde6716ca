use anyhow::Result;
use ormon_collector::geo::GeoDb;
use ormon_collector::provider_for;
use ormon_common::config::AgentConfig;
use ormon_common::error::UsageError;
use ormon_common::types::{Description, MetricSample, Mode, Variant};
use ormon_control::{authenticate, ControlConnection, ControlError};

/// Runs one invocation and returns the lines to print on stdout.
pub fn run(mode: Mode, config: &AgentConfig) -> Result<Vec<String>> {
    match mode {
        Mode::Describe => describe(config),
        Mode::Collect => collect(config),
        Mode::Probe => Ok(vec![probe(config)]),
        Mode::ListVariants => Ok(list_variants()),
    }
}

fn active_variant(config: &AgentConfig, mode_name: &'static str) -> Result<Variant, UsageError> {
    config.variant.ok_or(UsageError::VariantNotSet(mode_name))
}

fn describe(config: &AgentConfig) -> Result<Vec<String>> {
    let variant = active_variant(config, "config")?;
    let provider = provider_for(variant);
    let mut conn = ControlConnection::open(config)?;
    authenticate(&mut conn, config)?;
    let description = provider.describe(&mut conn, config)?;
    Ok(render_describe(&description))
}

fn collect(config: &AgentConfig) -> Result<Vec<String>> {
    let variant = active_variant(config, "fetch")?;
    let provider = provider_for(variant);
    let mut conn = ControlConnection::open(config)?;
    authenticate(&mut conn, config)?;
    let samples = provider.collect(&mut conn, config)?;
    Ok(render_collect(&samples))
}

/// Availability probe. Every failure becomes a structured `no (<reason>)`
/// line and the process still exits 0.
fn probe(config: &AgentConfig) -> String {
    match probe_steps(config) {
        Ok(()) => "yes".to_string(),
        Err(reason) => format!("no ({reason})"),
    }
}

fn probe_steps(config: &AgentConfig) -> Result<(), String> {
    if let Err(e) = GeoDb::open(&config.geoip_db) {
        return Err(format!("geo database unavailable: {e:#}"));
    }
    let mut conn = match ControlConnection::open(config) {
        Ok(conn) => conn,
        Err(_) => return Err("Connection failed".to_string()),
    };
    match authenticate(&mut conn, config) {
        Ok(()) => Ok(()),
        Err(ControlError::Auth { reason }) => Err(format!("Authentication failed: {reason}")),
        Err(other) => Err(other.to_string()),
    }
}

/// The fixed variant list, for operator tooling that discovers which
/// entry points to configure.
pub fn list_variants() -> Vec<String> {
    Variant::ALL
        .iter()
        .map(|variant| variant.name().to_string())
        .collect()
}

fn render_describe(description: &Description) -> Vec<String> {
    let mut lines = vec![
        format!("graph_title {}", description.graph.title),
        format!("graph_args {}", description.graph.args),
        format!("graph_vlabel {}", description.graph.vlabel),
        format!("graph_category {}", description.graph.category),
        format!("graph_info {}", description.graph.info),
    ];
    for label in &description.labels {
        lines.push(format!("{}.label {}", label.name, label.name));
        lines.push(format!("{}.min {}", label.name, label.min));
        if let Some(max) = label.max {
            lines.push(format!("{}.max {max}", label.name));
        }
        lines.push(format!("{}.type {}", label.name, label.kind));
    }
    lines
}

fn render_collect(samples: &[MetricSample]) -> Vec<String> {
    samples
        .iter()
        .map(|sample| format!("{}.value {}", sample.label, sample.value))
        .collect()
}
