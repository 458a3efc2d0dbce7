//! The `get_weather` request pipeline:
//! validate → credential check → resolve name → fetch → normalize.

use std::sync::Arc;

use crate::{
    config::Config,
    error::WeatherError,
    model::{ResolvedQuery, ToolOutcome, WeatherQuery, WeatherReport},
    provider::{WeatherProvider, provider_from_config},
    transport::HttpTransport,
    translate::NameResolver,
};

/// Handles `get_weather` invocations. Holds no mutable state, so one
/// instance can serve any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct WeatherService {
    config: Arc<Config>,
    resolver: Option<NameResolver>,
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(config: Arc<Config>, transport: Arc<dyn HttpTransport>) -> Self {
        let resolver = config
            .translation_enabled
            .then(|| NameResolver::new(&config, transport.clone()));
        let provider = provider_from_config(&config, transport);

        Self {
            config,
            resolver,
            provider,
        }
    }

    /// Run one invocation.
    ///
    /// Only blank input is returned as `Err`; every later failure is folded
    /// into [`ToolOutcome::Failure`].
    pub async fn get_weather(&self, city: &str) -> Result<ToolOutcome, WeatherError> {
        let query = WeatherQuery::new(city)?;

        Ok(match self.run(&query).await {
            Ok(report) => ToolOutcome::Success(report),
            Err(err) => ToolOutcome::from(err),
        })
    }

    async fn run(&self, query: &WeatherQuery) -> Result<WeatherReport, WeatherError> {
        if !self.config.has_api_key() {
            tracing::error!("OpenWeather API key is missing, set OPENWEATHERMAP_API_KEY");
            return Err(WeatherError::MissingCredentials);
        }

        let resolved = match &self.resolver {
            Some(resolver) => resolver.resolve(query.city()).await?,
            None => ResolvedQuery::untranslated(query.city()),
        };

        self.provider.get_weather(&resolved).await
    }
}
