use serde::{Deserialize, Serialize};
use serde_json::{Number, json};

use crate::error::WeatherError;

/// Validated user input: a non-blank city name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    city: String,
}

impl WeatherQuery {
    pub fn new(city: impl Into<String>) -> Result<Self, WeatherError> {
        let city = city.into();
        if city.trim().is_empty() {
            return Err(WeatherError::InvalidInput);
        }
        Ok(Self { city })
    }

    pub fn city(&self) -> &str {
        &self.city
    }
}

/// Output of the name resolver. `query_term` is what the weather provider
/// gets asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub original_city: String,
    pub query_term: String,
}

impl ResolvedQuery {
    /// A query that skipped translation.
    pub fn untranslated(city: &str) -> Self {
        Self {
            original_city: city.to_string(),
            query_term: city.to_string(),
        }
    }

    pub fn was_translated(&self) -> bool {
        self.original_city != self.query_term
    }

    /// City label used in failure messages, e.g. `Tokyo (original: 東京)`.
    pub fn label(&self) -> String {
        if self.was_translated() {
            format!("{} (original: {})", self.query_term, self.original_city)
        } else {
            self.query_term.clone()
        }
    }
}

/// Normalized current weather, in metric units.
///
/// Numeric readings are passed through exactly as the provider sent them,
/// so `28` stays `28` and `28.5` stays `28.5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: Number,
    pub condition: String,
    pub humidity: Number,
    pub wind_speed: Number,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(WeatherReport),
    Failure(String),
}

impl ToolOutcome {
    /// Render the outcome as the JSON text handed back to the host.
    pub fn to_payload(&self) -> String {
        let payload = match self {
            ToolOutcome::Success(report) => Payload::Report(report),
            ToolOutcome::Failure(message) => Payload::Error { error: message },
        };
        // Field order of the report is kept by serializing the struct directly.
        serde_json::to_string(&payload)
            .unwrap_or_else(|err| json!({ "error": err.to_string() }).to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Payload<'a> {
    Report(&'a WeatherReport),
    Error { error: &'a str },
}

impl From<WeatherError> for ToolOutcome {
    fn from(err: WeatherError) -> Self {
        ToolOutcome::Failure(err.to_string())
    }
}
