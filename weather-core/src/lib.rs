//! Core library for the `get_weather` tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Best-effort translation of city names
//! - The OpenWeather client and its response classification
//! - The request pipeline that turns a city name into one JSON payload
//!
//! It is used by `weather-server`, but can also be embedded in other hosts.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;
pub mod tool;
pub mod translate;
pub mod transport;

pub use config::Config;
pub use error::{TransportError, WeatherError};
pub use model::{ResolvedQuery, ToolOutcome, WeatherQuery, WeatherReport};
pub use provider::WeatherProvider;
pub use service::WeatherService;
pub use tool::{GET_WEATHER_TOOL, TextContent};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
