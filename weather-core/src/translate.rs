//! Best-effort translation of city names into the provider's language.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    config::Config,
    error::WeatherError,
    model::ResolvedQuery,
    transport::{HttpTransport, status_code},
};

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "responseData")]
    response_data: Option<TranslateData>,
    #[serde(rename = "responseStatus")]
    response_status: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// Translates city names over a fixed language pair.
///
/// Every call hits the translation endpoint; results are never cached.
#[derive(Debug, Clone)]
pub struct NameResolver {
    transport: Arc<dyn HttpTransport>,
    url: String,
    lang_pair: String,
}

impl NameResolver {
    pub fn new(config: &Config, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            url: config.translate_url.clone(),
            lang_pair: format!("{}|{}", config.source_lang, config.target_lang),
        }
    }

    pub async fn resolve(&self, city: &str) -> Result<ResolvedQuery, WeatherError> {
        let res = self
            .transport
            .get(&self.url, &[("q", city), ("langpair", self.lang_pair.as_str())])
            .await
            .map_err(|err| {
                tracing::warn!(city, error = %err, "translation request failed");
                WeatherError::translation(city, err.to_string())
            })?;

        if !res.is_success() {
            tracing::warn!(city, status = res.status, "translation endpoint returned an error");
            return Err(WeatherError::translation(
                city,
                format!("translation service returned status {}", res.status),
            ));
        }

        let translated = parse_translation(&res.body).map_err(|reason| {
            tracing::warn!(city, reason = %reason, "translation rejected");
            WeatherError::translation(city, reason)
        })?;

        Ok(pick_query_term(city, &translated))
    }
}

/// Pull the translated text out of a response body. The service answers
/// quota and language-pair problems with HTTP 200 and a non-200
/// `responseStatus`, putting the warning where the translation would be.
fn parse_translation(body: &str) -> Result<String, String> {
    const MALFORMED: &str = "malformed translation response";

    let parsed: TranslateResponse =
        serde_json::from_str(body).map_err(|_| MALFORMED.to_string())?;

    if let Some(status) = parsed.response_status.as_ref() {
        match status_code(status) {
            Some(200) => {}
            Some(code) => return Err(format!("translation service reported status {code}")),
            None => return Err(format!("translation service reported status {status}")),
        }
    }

    parsed
        .response_data
        .and_then(|data| data.translated_text)
        .ok_or_else(|| MALFORMED.to_string())
}

/// Keep the original name when the provider echoed it back or returned nothing.
fn pick_query_term(city: &str, translated: &str) -> ResolvedQuery {
    let translated = translated.trim();

    if translated.is_empty() || translated.to_lowercase() == city.to_lowercase() {
        tracing::debug!(city, "translation was a no-op, keeping original name");
        return ResolvedQuery::untranslated(city);
    }

    tracing::debug!(city, query_term = translated, "translated city name");
    ResolvedQuery {
        original_city: city.to_string(),
        query_term: translated.to_string(),
    }
}
