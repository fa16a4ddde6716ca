/// Errors caused by how the agent was invoked or configured, as opposed to
/// failures talking to the daemon. The binary maps these to exit code 2 and
/// prints the usage text.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// The positional mode argument is not one of the supported modes.
    #[error("unknown mode '{0}' (expected config, fetch, autoconf or suggest)")]
    UnknownMode(String),

    /// The variant selector names no known metric variant.
    #[error("unknown variant '{0}' (run 'suggest' for the list of variants)")]
    UnknownVariant(String),

    /// A mode that needs a variant was invoked without one.
    #[error("ORMON_VARIANT is not set (required for '{0}')")]
    VariantNotSet(&'static str),

    /// The connect-method selector is not a supported transport.
    #[error("unsupported connect method '{0}' (expected 'port' or 'socket')")]
    UnsupportedTransport(String),

    /// An environment variable holds a value that does not parse.
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidEnvValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}
