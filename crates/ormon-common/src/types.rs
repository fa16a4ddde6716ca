use crate::error::UsageError;
use std::fmt;

/// Static graph metadata emitted once per `config` invocation. Identical
/// across repeated calls for the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphDescriptor {
    pub title: &'static str,
    pub args: &'static str,
    pub vlabel: &'static str,
    pub category: &'static str,
    pub info: &'static str,
}

/// How the supervisor graphs a label: raw instantaneous values, or the
/// per-interval rate of change of a monotonic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Gauge,
    Derive,
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelKind::Gauge => write!(f, "GAUGE"),
            LabelKind::Derive => write!(f, "DERIVE"),
        }
    }
}

/// One declared label. The set of names declared by `config` is a contract:
/// `fetch` must emit a value for exactly these names on every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    pub min: u64,
    pub max: Option<u64>,
    pub kind: LabelKind,
}

impl LabelSpec {
    pub fn gauge(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: 0,
            max: None,
            kind: LabelKind::Gauge,
        }
    }

    pub fn derive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: 0,
            max: None,
            kind: LabelKind::Derive,
        }
    }

    pub fn with_max(mut self, max: u64) -> Self {
        self.max = Some(max);
        self
    }
}

/// A single `<label>.value` record. Daemon-reported values pass through
/// verbatim; computed tallies are formatted from integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricSample {
    pub label: String,
    pub value: String,
}

impl MetricSample {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn count(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
        }
    }
}

/// Everything a `config` invocation emits for one variant.
#[derive(Debug, Clone)]
pub struct Description {
    pub graph: GraphDescriptor,
    pub labels: Vec<LabelSpec>,
}

/// The metric variant this invocation serves, resolved once at startup from
/// the `ORMON_VARIANT` selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Bandwidth,
    Connections,
    Countries,
    Dormant,
    Flags,
    Routers,
    Traffic,
}

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::Bandwidth,
        Variant::Connections,
        Variant::Countries,
        Variant::Dormant,
        Variant::Flags,
        Variant::Routers,
        Variant::Traffic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variant::Bandwidth => "bandwidth",
            Variant::Connections => "connections",
            Variant::Countries => "countries",
            Variant::Dormant => "dormant",
            Variant::Flags => "flags",
            Variant::Routers => "routers",
            Variant::Traffic => "traffic",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UsageError> {
        match value {
            "bandwidth" => Ok(Variant::Bandwidth),
            "connections" => Ok(Variant::Connections),
            "countries" => Ok(Variant::Countries),
            "dormant" => Ok(Variant::Dormant),
            "flags" => Ok(Variant::Flags),
            "routers" => Ok(Variant::Routers),
            "traffic" => Ok(Variant::Traffic),
            other => Err(UsageError::UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the supervisor asked for in this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Describe,
    Collect,
    Probe,
    ListVariants,
}

impl Mode {
    /// Maps the optional positional argument to a mode. No argument means
    /// `fetch`.
    pub fn from_arg(arg: Option<&str>) -> Result<Self, UsageError> {
        match arg {
            None | Some("fetch") => Ok(Mode::Collect),
            Some("config") => Ok(Mode::Describe),
            Some("autoconf") => Ok(Mode::Probe),
            Some("suggest") => Ok(Mode::ListVariants),
            Some(other) => Err(UsageError::UnknownMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults_to_fetch() {
        assert_eq!(Mode::from_arg(None).unwrap(), Mode::Collect);
        assert_eq!(Mode::from_arg(Some("fetch")).unwrap(), Mode::Collect);
    }

    #[test]
    fn mode_maps_every_argument() {
        assert_eq!(Mode::from_arg(Some("config")).unwrap(), Mode::Describe);
        assert_eq!(Mode::from_arg(Some("autoconf")).unwrap(), Mode::Probe);
        assert_eq!(Mode::from_arg(Some("suggest")).unwrap(), Mode::ListVariants);
    }

    #[test]
    fn mode_rejects_unknown_argument() {
        let err = Mode::from_arg(Some("status")).unwrap_err();
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn variant_names_round_trip() {
        for variant in Variant::ALL {
            assert_eq!(Variant::parse(variant.name()).unwrap(), variant);
        }
    }

    #[test]
    fn variant_rejects_unknown_name() {
        assert!(Variant::parse("uptime").is_err());
    }

    #[test]
    fn label_kind_wire_names() {
        assert_eq!(LabelKind::Gauge.to_string(), "GAUGE");
        assert_eq!(LabelKind::Derive.to_string(), "DERIVE");
    }
}
