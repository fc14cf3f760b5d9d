use serde_json::json;

use super::{Example, Toolset};

pub const WEATHER_HELP_KEYWORDS: &[&str] = &[
    "help",
    "example",
    "examples",
    "what can",
    "how to",
    "what to ask",
    "commands",
    "options",
];

pub struct Weather;

impl Toolset for Weather {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn intro(&self) -> &'static str {
        "You are an advanced weather assistant with access to these weather tools:"
    }

    fn examples(&self) -> Vec<Example> {
        vec![
            Example::new("Weather alerts", "get_alerts", json!({ "state": "CA" })),
            Example::new(
                "US Forecast",
                "get_forecast",
                json!({ "latitude": 40.7128, "longitude": -74.0060 }),
            ),
            Example::new(
                "City coordinates",
                "get_coordinates",
                json!({ "city": "Singapore" }),
            ),
            Example::new("Help/Examples", "get_help", json!({})),
        ]
    }

    fn rules(&self) -> &'static str {
        "🌍 IMPORTANT RULES:
- Weather forecasts and alerts only work for US locations
- For a forecast by city name, look up its coordinates with get_coordinates first
- Always explain limitations for international requests

💬 If the user asks about what they can query, examples, or help, use the get_help tool.
🎯 Always prioritize accuracy and clarity in your responses."
    }

    fn query_label(&self) -> &'static str {
        "🌤️ User query"
    }

    fn repl_prompt(&self) -> &'static str {
        "🌍 Weather Query: "
    }

    fn banner(&self) -> &'static str {
        "🌤️ MCP Weather Client Started!"
    }

    fn tips(&self) -> Vec<&'static str> {
        vec![
            "Type 'help' to see what queries you can ask",
            "Try 'alerts for CA' or 'coordinates for Tokyo'",
            "Type 'quit' to exit",
        ]
    }

    fn help_tool(&self) -> Option<&'static str> {
        Some("get_help")
    }

    fn help_keywords(&self) -> &'static [&'static str] {
        WEATHER_HELP_KEYWORDS
    }

    fn help_fallback(&self) -> &'static str {
        "I can help you with weather queries! Try asking about weather alerts for US states or forecasts for US coordinates. For international locations, I can provide coordinates and guidance."
    }

    fn result_heading(&self) -> &'static str {
        "📍 Weather Information:"
    }

    fn tool_noun(&self) -> &'static str {
        "a weather tool"
    }

    fn narration_labels(&self) -> (&'static str, &'static str, &'static str) {
        (
            "🌤️ WEATHER ANALYSIS REQUEST",
            "Tool Used",
            "📊 WEATHER DATA RECEIVED:",
        )
    }

    fn narration_instructions(&self) -> &'static str {
        "Analyze the weather data and provide a comprehensive, well-formatted response that:
1. Directly answers the user's question
2. Highlights important weather information
3. Uses clear, engaging language
4. Formats data in an easy-to-read structure
5. Includes relevant warnings or recommendations if applicable

Please provide your analysis now:"
    }
}
