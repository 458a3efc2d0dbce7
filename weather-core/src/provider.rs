use crate::{
    Config, ResolvedQuery, WeatherReport, error::WeatherError,
    provider::openweather::OpenWeatherProvider, transport::HttpTransport,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, resolved: &ResolvedQuery) -> Result<WeatherReport, WeatherError>;
}

/// Construct the weather provider from config.
pub fn provider_from_config(
    config: &Config,
    transport: Arc<dyn HttpTransport>,
) -> Arc<dyn WeatherProvider> {
    Arc::new(OpenWeatherProvider::new(config, transport))
}
