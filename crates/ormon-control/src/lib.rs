//! Client for the relay daemon's administrative control channel.
//!
//! [`ControlConnection`] owns the transport (TCP port or local socket) and
//! speaks the line-oriented request/response protocol; [`authenticate`]
//! runs the handshake on top of it. Providers consume the [`ControlClient`]
//! trait so tests can substitute scripted sessions.

pub mod auth;
pub mod connection;
pub mod error;

pub use auth::authenticate;
pub use connection::{ControlClient, ControlConnection};
pub use error::{AuthReason, ControlError};
