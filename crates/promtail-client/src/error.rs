// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors surfaced to code that owns a [`crate::Client`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Client is shut down")]
    Closed,

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Failure to turn a batch into a request body.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to serialize JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to compress payload: {0}")]
    Compression(#[from] snap::Error),
}

/// Failure reported by a [`crate::transport::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Why a flushed batch was dropped. Logged by the worker, never returned to
/// producers.
#[derive(Debug, thiserror::Error)]
pub enum FlushError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected HTTP status code {status}: {body}")]
    Status { status: u16, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ClientError::InvalidConfig("batch_entries must be greater than 0".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid configuration: batch_entries must be greater than 0"
        );
        assert_eq!(ClientError::Closed.to_string(), "Client is shut down");
    }

    #[test]
    fn test_flush_error_status_display() {
        let error = FlushError::Status {
            status: 500,
            body: "Internal Server Error".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unexpected HTTP status code 500: Internal Server Error"
        );
    }

    #[test]
    fn test_flush_error_wraps_transport() {
        let error = FlushError::from(TransportError::Other("connection reset".to_string()));
        assert_eq!(error.to_string(), "connection reset");
    }
}
