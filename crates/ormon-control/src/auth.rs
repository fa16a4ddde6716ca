use crate::connection::{AuthOutcome, ControlConnection};
use crate::error::{AuthReason, ControlError, Result};
use ormon_common::config::AgentConfig;

/// Runs the daemon's authentication handshake on an open connection.
///
/// Credential-less authentication is attempted first. If the daemon's
/// refusal names a password, the configured credential is offered; its
/// absence and its rejection are distinct [`AuthReason`]s, as is a refusal
/// no password could satisfy.
pub fn authenticate(conn: &mut ControlConnection, config: &AgentConfig) -> Result<()> {
    match conn.authenticate_raw(None)? {
        AuthOutcome::Accepted => Ok(()),
        AuthOutcome::Refused(refusal) if wants_password(&refusal) => {
            let Some(password) = config.password.as_deref() else {
                return Err(ControlError::Auth {
                    reason: AuthReason::NotConfigured,
                });
            };
            match conn.authenticate_raw(Some(password))? {
                AuthOutcome::Accepted => Ok(()),
                AuthOutcome::Refused(refusal) => {
                    tracing::debug!(%refusal, "daemon rejected the configured password");
                    Err(ControlError::Auth {
                        reason: AuthReason::Rejected,
                    })
                }
            }
        }
        AuthOutcome::Refused(refusal) => {
            tracing::debug!(%refusal, "daemon refused credential-less authentication");
            Err(ControlError::Auth {
                reason: AuthReason::Missing,
            })
        }
    }
}

/// The daemon's missing-credential condition: the refusal names a password.
fn wants_password(refusal: &str) -> bool {
    refusal.to_ascii_lowercase().contains("password")
}
