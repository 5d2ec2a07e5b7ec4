//! Client error types.

use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] pcf7931_protocol::ProtocolError),

    #[error("failed to open serial port {port}: {reason}")]
    SerialOpen { port: String, reason: String },

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out waiting for the peripheral")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ClientError::SerialOpen {
            port: "/dev/ttyACM0".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("/dev/ttyACM0"));
        assert!(err.to_string().contains("permission denied"));
    }
}
