use thiserror::Error;

/// Errors returned by the postcode lookup client.
#[derive(Debug, Error)]
pub enum PostcodesError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success envelope status with a message.
    #[error("postcode API error: {0}")]
    ApiError(String),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
