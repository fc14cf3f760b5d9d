//! US weather from the National Weather Service API.
//!
//! One HTTP session is built at startup and shared by every tool through an
//! `Arc<WeatherService>`.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::debug;

use super::Unavailable;
use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
use crate::registry::{Arguments, RegistryError, ToolRegistry};

pub const NWS_API_BASE: &str = "https://api.weather.gov";
const USER_AGENT: &str = "weather-app/1.0";
const FORECAST_PERIODS: usize = 5;

const HELP: &str = "🌤️ WEATHER ASSISTANT HELP GUIDE

🇺🇸 US WEATHER:
• \"Are there any weather alerts in CA?\"
• \"What's the forecast for New York?\"
• \"Forecast for latitude 47.6, longitude -122.3\"

🌍 COORDINATES:
• \"What are the coordinates of Singapore?\"
• \"Where is Tokyo?\"

⚠️ LIMITATIONS:
• Alerts and forecasts come from the US National Weather Service and only cover US locations
• For other cities I can give coordinates, but not a forecast

💡 TIP: Use two-letter state codes for alerts (CA, NY, TX).";

/// (name, latitude, longitude, country)
const CITIES: &[(&str, f64, f64, &str)] = &[
    ("new york", 40.7128, -74.0060, "US"),
    ("los angeles", 34.0522, -118.2437, "US"),
    ("chicago", 41.8781, -87.6298, "US"),
    ("houston", 29.7604, -95.3698, "US"),
    ("phoenix", 33.4484, -112.0740, "US"),
    ("philadelphia", 39.9526, -75.1652, "US"),
    ("san francisco", 37.7749, -122.4194, "US"),
    ("seattle", 47.6062, -122.3321, "US"),
    ("denver", 39.7392, -104.9903, "US"),
    ("boston", 42.3601, -71.0589, "US"),
    ("miami", 25.7617, -80.1918, "US"),
    ("atlanta", 33.7490, -84.3880, "US"),
    ("washington", 38.9072, -77.0369, "US"),
    ("sacramento", 38.5816, -121.4944, "US"),
    ("singapore", 1.3521, 103.8198, "SG"),
    ("london", 51.5074, -0.1278, "GB"),
    ("tokyo", 35.6762, 139.6503, "JP"),
    ("paris", 48.8566, 2.3522, "FR"),
    ("berlin", 52.5200, 13.4050, "DE"),
    ("rome", 41.9028, 12.4964, "IT"),
    ("madrid", 40.4168, -3.7038, "ES"),
    ("sydney", -33.8688, 151.2093, "AU"),
    ("melbourne", -37.8136, 144.9631, "AU"),
    ("toronto", 43.6532, -79.3832, "CA"),
    ("vancouver", 49.2827, -123.1207, "CA"),
    ("beijing", 39.9042, 116.4074, "CN"),
    ("shanghai", 31.2304, 121.4737, "CN"),
    ("hong kong", 22.3193, 114.1694, "HK"),
    ("seoul", 37.5665, 126.9780, "KR"),
    ("mumbai", 19.0760, 72.8777, "IN"),
    ("delhi", 28.7041, 77.1025, "IN"),
    ("bangkok", 13.7563, 100.5018, "TH"),
    ("kuala lumpur", 3.1390, 101.6869, "MY"),
    ("jakarta", -6.2088, 106.8456, "ID"),
    ("manila", 14.5995, 120.9842, "PH"),
    ("amsterdam", 52.3676, 4.9041, "NL"),
    ("zurich", 47.3769, 8.5417, "CH"),
    ("vienna", 48.2082, 16.3738, "AT"),
    ("stockholm", 59.3293, 18.0686, "SE"),
    ("copenhagen", 55.6761, 12.5683, "DK"),
    ("mexico city", 19.4326, -99.1332, "MX"),
    ("sao paulo", -23.5505, -46.6333, "BR"),
    ("rio de janeiro", -22.9068, -43.1729, "BR"),
    ("buenos aires", -34.6037, -58.3816, "AR"),
    ("cairo", 30.0444, 31.2357, "EG"),
    ("lagos", 6.5244, 3.3792, "NG"),
    ("johannesburg", -26.2041, 28.0473, "ZA"),
    ("dubai", 25.2048, 55.2708, "AE"),
    ("tel aviv", 32.0853, 34.7818, "IL"),
    ("riyadh", 24.7136, 46.6753, "SA"),
];

pub struct WeatherSession {
    http: reqwest::Client,
    base_url: String,
}

pub struct WeatherService {
    session: Result<WeatherSession, Unavailable>,
}

impl WeatherService {
    /// Builds the shared HTTP session. A failure here does not stop the
    /// server; the weather tools report it when called.
    pub fn new(base_url: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));
        let session = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map(|http| WeatherSession {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
            })
            .map_err(|e| Unavailable::new("National Weather Service", e.to_string()));
        Self { session }
    }

    pub fn session(&self) -> Result<&WeatherSession, Unavailable> {
        self.session.as_ref().map_err(Clone::clone)
    }
}

impl WeatherSession {
    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!(%url, "NWS request");
        let res = self.http.get(url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            bail!("NWS request failed: {status} - {body}");
        }
        Ok(res.json().await?)
    }

    pub async fn alerts(&self, state: &str) -> Result<String> {
        let url = format!("{}/alerts/active/area/{state}", self.base_url);
        let data = self
            .get_json(&url)
            .await
            .context("Unable to fetch alerts or no alerts found.")?;
        let features = data
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("Unable to fetch alerts or no alerts found."))?;
        if features.is_empty() {
            return Ok("No active alerts for this state.".into());
        }
        Ok(features
            .iter()
            .map(format_alert)
            .collect::<Vec<_>>()
            .join("\n---\n"))
    }

    pub async fn forecast(&self, latitude: f64, longitude: f64) -> Result<String> {
        let points_url = format!("{}/points/{latitude:.4},{longitude:.4}", self.base_url);
        let points = self
            .get_json(&points_url)
            .await
            .context("Unable to fetch forecast data for this location.")?;
        let forecast_url = points
            .pointer("/properties/forecast")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Unable to fetch forecast data for this location."))?;
        let forecast = self
            .get_json(forecast_url)
            .await
            .context("Unable to fetch detailed forecast.")?;
        let periods = forecast
            .pointer("/properties/periods")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("Unable to fetch detailed forecast."))?;
        Ok(periods
            .iter()
            .take(FORECAST_PERIODS)
            .map(format_period)
            .collect::<Vec<_>>()
            .join("\n---\n"))
    }
}

fn field<'a>(v: &'a Value, key: &str, fallback: &'a str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or(fallback)
}

pub fn format_alert(feature: &Value) -> String {
    let empty = Value::Null;
    let p = feature.get("properties").unwrap_or(&empty);
    format!(
        "Event: {}\nArea: {}\nSeverity: {}\nDescription: {}\nInstructions: {}",
        field(p, "event", "Unknown"),
        field(p, "areaDesc", "Unknown"),
        field(p, "severity", "Unknown"),
        field(p, "description", "No description available"),
        field(p, "instruction", "No specific instructions provided"),
    )
}

pub fn format_period(period: &Value) -> String {
    let temperature = period
        .get("temperature")
        .map(|t| match t {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "?".into());
    format!(
        "{}:\nTemperature: {}°{}\nWind: {} {}\nForecast: {}",
        field(period, "name", "Unknown"),
        temperature,
        field(period, "temperatureUnit", "F"),
        field(period, "windSpeed", ""),
        field(period, "windDirection", ""),
        field(period, "detailedForecast", ""),
    )
}

pub fn lookup_city(city: &str) -> Option<Value> {
    let wanted = city.trim().to_lowercase();
    let wanted = wanted.split(',').next().unwrap_or("").trim();
    CITIES
        .iter()
        .find(|(name, ..)| *name == wanted)
        .map(|&(name, latitude, longitude, country)| {
            let us = country == "US";
            json!({
                "city": title_case(name),
                "latitude": latitude,
                "longitude": longitude,
                "country": country,
                "us_location": us,
                "note": if us {
                    "Use get_forecast with these coordinates for the forecast."
                } else {
                    "Forecasts are only available for US locations."
                },
            })
        })
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                Some(first) => first.to_uppercase().chain(c).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn state_code(state: &str) -> Result<String> {
    let code = state.trim().to_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        bail!("state must be a two-letter US state code (e.g. CA, NY), got '{state}'");
    }
    Ok(code)
}

pub fn register(registry: &mut ToolRegistry, service: Arc<WeatherService>) -> Result<(), RegistryError> {
    let svc = service.clone();
    registry.register(
        ToolDescriptor::new("get_alerts", "Get weather alerts for a US state")
            .param(ParamSpec::required("state", ParamType::String).describe("Two-letter US state code (e.g. CA, NY)")),
        move |args: Arguments| {
            let svc = svc.clone();
            async move {
                let session = svc.session()?;
                let state = state_code(args.string("state")?)?;
                anyhow::Ok(json!(session.alerts(&state).await?))
            }
        },
    )?;
    let svc = service;
    registry.register(
        ToolDescriptor::new("get_forecast", "Get weather forecast for a US location")
            .param(ParamSpec::required("latitude", ParamType::Number))
            .param(ParamSpec::required("longitude", ParamType::Number)),
        move |args: Arguments| {
            let svc = svc.clone();
            async move {
                let session = svc.session()?;
                let latitude = args.number("latitude")?;
                let longitude = args.number("longitude")?;
                if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                    bail!("coordinates out of range: {latitude}, {longitude}");
                }
                anyhow::Ok(json!(session.forecast(latitude, longitude).await?))
            }
        },
    )?;
    registry.register(
        ToolDescriptor::new("get_coordinates", "Get latitude and longitude for a major city")
            .param(ParamSpec::required("city", ParamType::String)),
        |args: Arguments| async move {
            let city = args.string("city")?;
            lookup_city(city).ok_or_else(|| anyhow!("Coordinates for '{city}' are not in the city table."))
        },
    )?;
    registry.register(
        ToolDescriptor::new("get_help", "Get help and example queries for the weather tools"),
        |_args: Arguments| async move { anyhow::Ok(json!(HELP)) },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::ToolResult;
    use mockito::Matcher;
    use serde_json::Map;

    fn registry(base: &str) -> ToolRegistry {
        let mut r = ToolRegistry::new();
        register(&mut r, Arc::new(WeatherService::new(base))).unwrap();
        r
    }

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn alerts_are_formatted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/alerts/active/area/CA")
            .match_header("user-agent", USER_AGENT)
            .match_header("accept", "application/geo+json")
            .with_status(200)
            .with_body(
                json!({ "features": [
                    { "properties": { "event": "Heat Advisory", "areaDesc": "Fresno", "severity": "Moderate",
                                      "description": "Hot.", "instruction": "Drink water." } },
                    { "properties": { "event": "Wind Advisory" } }
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let result = registry(&server.url()).invoke("get_alerts", args(json!({ "state": "ca" }))).await;
        let ToolResult::Success { payload } = result else {
            panic!("alerts failed: {result:?}");
        };
        let text = payload.as_str().unwrap();
        assert!(text.starts_with("Event: Heat Advisory\nArea: Fresno"));
        assert!(text.contains("\n---\nEvent: Wind Advisory"));
        assert!(text.contains("Severity: Unknown"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn no_alerts_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/alerts/active/area/NY")
            .with_body(r#"{"features": []}"#)
            .create_async()
            .await;
        let result = registry(&server.url()).invoke("get_alerts", args(json!({ "state": "NY" }))).await;
        assert_eq!(result, ToolResult::success(json!("No active alerts for this state.")));
    }

    #[tokio::test]
    async fn forecast_follows_the_points_link() {
        let mut server = mockito::Server::new_async().await;
        let forecast_url = format!("{}/gridpoints/OKX/33,35/forecast", server.url());
        let _points = server
            .mock("GET", "/points/40.7128,-74.0060")
            .with_body(json!({ "properties": { "forecast": forecast_url } }).to_string())
            .create_async()
            .await;
        let periods: Vec<Value> = (0..7)
            .map(|i| {
                json!({ "name": format!("Period {i}"), "temperature": 70 + i, "temperatureUnit": "F",
                        "windSpeed": "5 mph", "windDirection": "NW", "detailedForecast": "Sunny." })
            })
            .collect();
        let _forecast = server
            .mock("GET", "/gridpoints/OKX/33,35/forecast")
            .with_body(json!({ "properties": { "periods": periods } }).to_string())
            .create_async()
            .await;

        let result = registry(&server.url())
            .invoke("get_forecast", args(json!({ "latitude": 40.7128, "longitude": -74.006 })))
            .await;
        let text = result.text();
        assert!(text.starts_with("Period 0:\nTemperature: 70°F\nWind: 5 mph NW\nForecast: Sunny."), "{text}");
        assert!(text.contains("Period 4"));
        assert!(!text.contains("Period 5"));
    }

    #[tokio::test]
    async fn upstream_errors_become_failures() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", Matcher::Regex("^/points/.*".into()))
            .with_status(500)
            .create_async()
            .await;
        let result = registry(&server.url())
            .invoke("get_forecast", args(json!({ "latitude": 1.0, "longitude": 2.0 })))
            .await;
        match result {
            ToolResult::Failure { message } => {
                assert!(message.starts_with("Unable to fetch forecast data"), "{message}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_state_codes_are_rejected_before_any_request() {
        let result = registry("http://127.0.0.1:9").invoke("get_alerts", args(json!({ "state": "California" }))).await;
        assert!(result.is_failure());
    }

    #[test]
    fn city_lookup_is_case_insensitive() {
        let c = lookup_city("  Kuala Lumpur, Malaysia").unwrap();
        assert_eq!(c["city"], "Kuala Lumpur");
        assert_eq!(c["us_location"], false);
        assert_eq!(lookup_city("new york").unwrap()["us_location"], true);
        assert!(lookup_city("Atlantis").is_none());
    }

    #[test]
    fn unavailable_sessions_surface_as_errors() {
        let svc = WeatherService {
            session: Err(Unavailable::new("National Weather Service", "no TLS backend")),
        };
        let err = svc.session().err().unwrap();
        assert_eq!(err.to_string(), "National Weather Service is unavailable: no TLS backend");
    }
}
