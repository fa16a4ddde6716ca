use std::fmt;

/// Why the daemon's authentication handshake failed. Each reason is
/// separately observable so the availability probe can report it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthReason {
    /// The daemon requires a credential this agent cannot supply.
    Missing,
    /// The daemon wants a password but none is configured in the
    /// environment.
    NotConfigured,
    /// The daemon rejected the configured password.
    Rejected,
}

impl fmt::Display for AuthReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthReason::Missing => write!(f, "credential required but unavailable"),
            AuthReason::NotConfigured => write!(f, "password not configured"),
            AuthReason::Rejected => write!(f, "credential rejected"),
        }
    }
}

/// Errors raised by the control channel.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The transport could not be established.
    #[error("Control: connection failed: {0}")]
    Connect(#[source] std::io::Error),

    /// The daemon refused the authentication handshake.
    #[error("Control: authentication failed: {reason}")]
    Auth { reason: AuthReason },

    /// The daemon answered with an error reply, a missing value, or ended
    /// the stream mid-reply. Never retried; the daemon is local and a bad
    /// reply is worth surfacing immediately.
    #[error("Control: protocol error: {0}")]
    Protocol(String),

    /// I/O failure on an established session.
    #[error("Control: i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias for control-channel operations.
pub type Result<T> = std::result::Result<T, ControlError>;
