use thiserror::Error;

/// Failures of a single `get_weather` invocation.
///
/// The `Display` text of each variant is the exact string surfaced to the
/// caller inside the `{"error": ...}` payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("city name is required.")]
    InvalidInput,

    #[error("Server configuration error: Missing API key.")]
    MissingCredentials,

    #[error("Translation unavailable for '{city}': {reason}")]
    TranslationUnavailable { city: String, reason: String },

    #[error("Could not find the city: {city}")]
    ProviderNotFound { city: String },

    #[error("Invalid API key or unauthorized request.")]
    ProviderUnauthorized,

    #[error("{message}")]
    ProviderError { message: String },
}

impl WeatherError {
    pub(crate) fn translation(city: &str, reason: impl Into<String>) -> Self {
        WeatherError::TranslationUnavailable {
            city: city.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn provider(message: impl Into<String>) -> Self {
        WeatherError::ProviderError {
            message: message.into(),
        }
    }
}

/// Low-level failure talking to a remote endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failures raised by transports other than reqwest, such as test fakes.
    #[cfg(test)]
    #[error("{0}")]
    Other(String),
}
