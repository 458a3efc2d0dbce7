use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::sync::Arc;

use crate::{
    config::Config,
    error::WeatherError,
    model::{ResolvedQuery, WeatherReport},
    transport::{HttpTransport, status_code},
};

use super::WeatherProvider;

const UNITS: &str = "metric";

/// Current-weather client for OpenWeather. Never retries, never caches.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    url: String,
    language: Option<String>,
    transport: Arc<dyn HttpTransport>,
}

impl OpenWeatherProvider {
    pub fn new(config: &Config, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            api_key: config.api_key.clone(),
            url: config.weather_url.clone(),
            language: config.language.clone(),
            transport,
        }
    }
}

/// How a provider response was classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply {
    /// Non-2xx HTTP status.
    TransportFailure { status: u16, message: Option<String> },
    /// HTTP 2xx, but the body's own `cod` says something went wrong.
    SoftFailure { code: u16, message: Option<String> },
    /// HTTP 2xx with `cod` 200 and a well-formed body.
    Success(WeatherReport),
    /// HTTP 2xx but the body does not have the expected shape, or its `cod`
    /// cannot be read.
    Malformed { reason: String },
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    cod: Option<Value>,
    message: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Number,
    humidity: Number,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Number,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

impl From<OwCurrentResponse> for WeatherReport {
    fn from(parsed: OwCurrentResponse) -> Self {
        let condition = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .unwrap_or_else(|| "N/A".to_string());

        WeatherReport {
            city: parsed.name,
            temperature: parsed.main.temp,
            condition,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            country: parsed.sys.country,
        }
    }
}

/// Sort a raw provider response into one of the [`ProviderReply`] cases.
pub fn classify(status: u16, body: &str) -> ProviderReply {
    let envelope: Option<OwEnvelope> = serde_json::from_str(body).ok();
    let message = envelope
        .as_ref()
        .and_then(|e| e.message.as_ref())
        .and_then(message_text);

    if !(200..300).contains(&status) {
        return ProviderReply::TransportFailure { status, message };
    }

    // Only a missing `cod` counts as success; an unreadable one does not.
    let code = match envelope.as_ref().and_then(|e| e.cod.as_ref()) {
        None => 200,
        Some(cod) => match status_code(cod) {
            Some(code) => code,
            None => {
                return ProviderReply::Malformed {
                    reason: format!("unrecognized cod {cod}"),
                };
            }
        },
    };

    if code != 200 {
        return ProviderReply::SoftFailure { code, message };
    }

    match serde_json::from_str::<OwCurrentResponse>(body) {
        Ok(parsed) => ProviderReply::Success(parsed.into()),
        Err(err) => ProviderReply::Malformed {
            reason: err.to_string(),
        },
    }
}

/// Turn a classified reply into the normalized result for `resolved`.
pub fn into_result(
    reply: ProviderReply,
    resolved: &ResolvedQuery,
) -> Result<WeatherReport, WeatherError> {
    let label = resolved.label();

    match reply {
        ProviderReply::Success(report) => Ok(report),
        ProviderReply::TransportFailure { status: 404, .. }
        | ProviderReply::SoftFailure { code: 404, .. } => {
            Err(WeatherError::ProviderNotFound { city: label })
        }
        ProviderReply::TransportFailure { status: 401, .. }
        | ProviderReply::SoftFailure { code: 401, .. } => Err(WeatherError::ProviderUnauthorized),
        ProviderReply::TransportFailure { status, message } => {
            let detail = message
                .or_else(|| {
                    StatusCode::from_u16(status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "Unknown API error".to_string());
            Err(WeatherError::provider(format!(
                "Error from weather service: {detail} (city: {label})"
            )))
        }
        ProviderReply::SoftFailure { code, message } => Err(WeatherError::provider(match message {
            Some(detail) => format!("Error from weather service: {detail} (city: {label})"),
            None => format!("Could not find weather data for {label}. Status: {code}"),
        })),
        ProviderReply::Malformed { reason } => Err(WeatherError::provider(format!(
            "Unexpected response from weather service for {label}: {reason}"
        ))),
    }
}

fn message_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, resolved: &ResolvedQuery) -> Result<WeatherReport, WeatherError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(WeatherError::MissingCredentials)?;

        let mut query = vec![
            ("q", resolved.query_term.as_str()),
            ("appid", api_key),
            ("units", UNITS),
        ];
        if let Some(lang) = self.language.as_deref() {
            query.push(("lang", lang));
        }

        let res = self.transport.get(&self.url, &query).await.map_err(|err| {
            tracing::warn!(city = %resolved.query_term, error = %err, "weather request failed");
            WeatherError::provider(format!(
                "Failed to fetch weather data for {}: {err}",
                resolved.label()
            ))
        })?;

        let reply = classify(res.status, &res.body);
        if !matches!(reply, ProviderReply::Success(_)) {
            tracing::warn!(
                city = %resolved.query_term,
                status = res.status,
                body = %truncate_body(&res.body),
                "OpenWeather returned an error"
            );
        }

        into_result(reply, resolved)
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolOutcome;
    use crate::transport::fake::FakeTransport;
    use serde_json::json;

    fn taipei_body() -> String {
        json!({
            "cod": 200,
            "name": "Taipei",
            "main": { "temp": 28.5, "humidity": 70 },
            "weather": [{ "description": "clear sky" }],
            "wind": { "speed": 3.1 },
            "sys": { "country": "TW" }
        })
        .to_string()
    }

    fn provider(fake: &Arc<FakeTransport>, api_key: Option<&str>) -> OpenWeatherProvider {
        let mut cfg = Config::default();
        cfg.api_key = api_key.map(str::to_string);
        OpenWeatherProvider::new(&cfg, fake.clone())
    }

    #[test]
    fn classify_success() {
        let reply = classify(200, &taipei_body());

        assert_eq!(
            reply,
            ProviderReply::Success(WeatherReport {
                city: "Taipei".into(),
                temperature: Number::from_f64(28.5).unwrap(),
                condition: "clear sky".into(),
                humidity: Number::from(70),
                wind_speed: Number::from_f64(3.1).unwrap(),
                country: "TW".into(),
            })
        );
    }

    #[test]
    fn classify_empty_weather_list_defaults_condition() {
        let body = json!({
            "cod": 200,
            "name": "Taipei",
            "main": { "temp": 20.0, "humidity": 50 },
            "weather": [],
            "wind": { "speed": 1.0 },
            "sys": { "country": "TW" }
        })
        .to_string();

        match classify(200, &body) {
            ProviderReply::Success(report) => assert_eq!(report.condition, "N/A"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn classify_passes_numbers_through_unchanged() {
        let body = json!({
            "cod": 200,
            "name": "Taipei",
            "main": { "temp": 28, "humidity": 70.5 },
            "weather": [{ "description": "few clouds" }],
            "wind": { "speed": 3 },
            "sys": { "country": "TW" }
        })
        .to_string();

        let ProviderReply::Success(report) = classify(200, &body) else {
            panic!("expected a successful reply");
        };
        assert_eq!(report.temperature, Number::from(28));
        assert_eq!(report.humidity, Number::from_f64(70.5).unwrap());
        assert_eq!(report.wind_speed, Number::from(3));

        let payload = ToolOutcome::Success(report).to_payload();
        assert!(payload.contains(r#""temperature":28,"#));
        assert!(payload.contains(r#""humidity":70.5,"#));
        assert!(payload.contains(r#""wind_speed":3,"#));
    }

    #[test]
    fn classify_unreadable_code_is_not_success() {
        let mut body = serde_json::from_str::<Value>(&taipei_body()).unwrap();
        body["cod"] = json!("abc");

        let reply = classify(200, &body.to_string());

        assert!(matches!(reply, ProviderReply::Malformed { .. }));
    }

    #[test]
    fn classify_missing_code_is_success() {
        let mut body = serde_json::from_str::<Value>(&taipei_body()).unwrap();
        body.as_object_mut().unwrap().remove("cod");

        assert!(matches!(classify(200, &body.to_string()), ProviderReply::Success(_)));
    }

    #[test]
    fn classify_soft_failure_with_string_code() {
        let reply = classify(200, r#"{"cod":"404","message":"city not found"}"#);

        assert_eq!(
            reply,
            ProviderReply::SoftFailure {
                code: 404,
                message: Some("city not found".into()),
            }
        );
    }

    #[test]
    fn classify_transport_failure_without_json() {
        let reply = classify(502, "Bad Gateway");

        assert_eq!(
            reply,
            ProviderReply::TransportFailure {
                status: 502,
                message: None,
            }
        );
    }

    #[test]
    fn classify_malformed_success_body() {
        let reply = classify(200, r#"{"cod":200,"name":"Taipei"}"#);
        assert!(matches!(reply, ProviderReply::Malformed { .. }));
    }

    #[test]
    fn not_found_message_uses_resolved_and_original_names() {
        let plain = ResolvedQuery::untranslated("Nonexistentville");
        let err = into_result(
            ProviderReply::TransportFailure { status: 404, message: None },
            &plain,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Could not find the city: Nonexistentville");

        let translated = ResolvedQuery {
            original_city: "不存在村".into(),
            query_term: "Nonexistentville".into(),
        };
        let err = into_result(
            ProviderReply::SoftFailure { code: 404, message: Some("city not found".into()) },
            &translated,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find the city: Nonexistentville (original: 不存在村)"
        );
    }

    #[test]
    fn unauthorized_message() {
        let err = into_result(
            ProviderReply::TransportFailure { status: 401, message: Some("Invalid API key".into()) },
            &ResolvedQuery::untranslated("Taipei"),
        )
        .unwrap_err();

        assert_eq!(err, WeatherError::ProviderUnauthorized);
        assert_eq!(err.to_string(), "Invalid API key or unauthorized request.");
    }

    #[test]
    fn other_failures_prefer_provider_message() {
        let resolved = ResolvedQuery::untranslated("Taipei");

        let err = into_result(
            ProviderReply::TransportFailure { status: 429, message: Some("rate limited".into()) },
            &resolved,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error from weather service: rate limited (city: Taipei)"
        );

        let err = into_result(
            ProviderReply::TransportFailure { status: 500, message: None },
            &resolved,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error from weather service: Internal Server Error (city: Taipei)"
        );

        let err = into_result(ProviderReply::SoftFailure { code: 500, message: None }, &resolved)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find weather data for Taipei. Status: 500"
        );
    }

    #[tokio::test]
    async fn missing_api_key_makes_no_request() {
        let fake = Arc::new(FakeTransport::new());

        let err = provider(&fake, None)
            .get_weather(&ResolvedQuery::untranslated("Taipei"))
            .await
            .unwrap_err();

        assert_eq!(err, WeatherError::MissingCredentials);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn sends_metric_query_with_key_and_language() {
        let fake = Arc::new(FakeTransport::new().reply(200, taipei_body()));

        let report = provider(&fake, Some("KEY"))
            .get_weather(&ResolvedQuery::untranslated("Taipei"))
            .await
            .unwrap();
        assert_eq!(report.city, "Taipei");

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, crate::config::DEFAULT_WEATHER_URL);
        assert_eq!(calls[0].param("q"), Some("Taipei"));
        assert_eq!(calls[0].param("appid"), Some("KEY"));
        assert_eq!(calls[0].param("units"), Some("metric"));
        assert_eq!(calls[0].param("lang"), Some("zh_tw"));
    }

    #[tokio::test]
    async fn connection_error_becomes_provider_error() {
        let fake = Arc::new(FakeTransport::new().fail("dns failure"));

        let err = provider(&fake, Some("KEY"))
            .get_weather(&ResolvedQuery::untranslated("Taipei"))
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.starts_with("Failed to fetch weather data for Taipei"));
        assert!(msg.contains("dns failure"));
        assert_eq!(fake.calls().len(), 1);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "台".repeat(300);
        assert_eq!(truncate_body(&long).chars().count(), 200);
        assert_eq!(truncate_body("short"), "short");
    }
}
