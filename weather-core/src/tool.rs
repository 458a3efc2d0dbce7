use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::WeatherError, service::WeatherService};

pub const GET_WEATHER_TOOL: &str = "get_weather";
pub const GET_WEATHER_DESCRIPTION: &str = "Get real-time weather info for a given city.";

/// Arguments of a `get_weather` call.
#[derive(Debug, Clone, Deserialize)]
pub struct GetWeatherArgs {
    /// The name of the city.
    pub city: String,
}

/// A single text content block handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl TextContent {
    pub fn new(text: String) -> Self {
        Self { kind: "text", text }
    }
}

/// Invoke `get_weather` with raw JSON arguments.
///
/// Missing, mistyped, or blank `city` is raised as [`WeatherError::InvalidInput`];
/// every other outcome, success or failure, comes back as one text block.
pub async fn invoke(service: &WeatherService, arguments: Value) -> Result<TextContent, WeatherError> {
    let args: GetWeatherArgs =
        serde_json::from_value(arguments).map_err(|_| WeatherError::InvalidInput)?;

    let outcome = service.get_weather(&args.city).await?;
    Ok(TextContent::new(outcome.to_payload()))
}
