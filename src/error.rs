//! Error types for the OSC codec and UDP transport
//!
//! None of these are fatal: every failure degrades to "that one message had
//! no effect" and is reported through logs only.

use std::io;
use thiserror::Error;

/// Errors raised while converting between OSC messages and datagrams
#[derive(Debug, Error)]
pub enum CodecError {
    /// Outbound message could not be serialized
    #[error("OSC encode error for '{path}': {reason}")]
    Encode { path: String, reason: String },

    /// Inbound datagram is not a well-formed OSC packet
    #[error("OSC decode error: {0}")]
    Decode(String),
}

/// Errors raised by the UDP sockets
#[derive(Debug, Error)]
pub enum TransportError {
    /// The telemetry port is held by another process
    #[error(
        "Port {port} is already in use. Choose a different listen_port in the config, \
         or close the other app using that port."
    )]
    PortInUse { port: u16 },

    /// Any other failure binding the telemetry socket
    #[error("Failed to bind OSC listen socket on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Failure creating or using a socket
    #[error("OSC socket error: {0}")]
    Socket(#[from] io::Error),

    /// Failure writing a datagram to the device
    #[error("OSC send error to {target}: {source}")]
    Send {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl TransportError {
    /// Classify a bind failure, singling out the port-in-use case
    pub fn from_bind(port: u16, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::AddrInUse {
            TransportError::PortInUse { port }
        } else {
            TransportError::Bind { port, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_classification() {
        let in_use = io::Error::new(io::ErrorKind::AddrInUse, "busy");
        assert!(matches!(
            TransportError::from_bind(1234, in_use),
            TransportError::PortInUse { port: 1234 }
        ));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            TransportError::from_bind(80, denied),
            TransportError::Bind { port: 80, .. }
        ));
    }

    #[test]
    fn test_port_in_use_message_is_actionable() {
        let msg = TransportError::PortInUse { port: 1234 }.to_string();
        assert!(msg.contains("1234"));
        assert!(msg.contains("listen_port"));
    }
}
