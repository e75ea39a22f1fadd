//! Weather lookup against the public wttr.in endpoint
//!
//! A leaf I/O wrapper: one unauthenticated GET per invocation, no retry. Any
//! failure is reported as a descriptive text result rather than an error, so
//! a broken lookup flows back to the model as tool output it can react to.

use crate::errors::ChatError;
use crate::llm::ToolMetadata;
use crate::tools::Tool;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://wttr.in";

pub struct WeatherTool {
    client: Client,
    base_url: String,
}

impl WeatherTool {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn fetch_weather(&self, city: &str) -> Result<String, reqwest::Error> {
        // format=3 yields a one-line "City: <conditions> <temp>" summary
        let url = format!("{}/{}?format=3", self.base_url, city);
        let response = self.client.get(&url).send().await?;
        let text = response.text().await?;
        Ok(text.trim().to_string())
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "get_weather".to_string(),
            description: "Get the current weather for a city".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "Name of the city"
                    }
                },
                "required": ["city"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String, ChatError> {
        let city = arguments
            .get("city")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown");

        log::info!("Weather lookup for '{}'", city);

        match self.fetch_weather(city).await {
            Ok(report) => Ok(report),
            Err(e) => Ok(format!("Error fetching weather: {}", e)),
        }
    }
}
