pub mod host;
pub mod jsonrpc;
pub mod server;
pub mod service;
pub mod transport;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub use host::ToolHost;
pub use server::{McpServer, ServerSpec};
pub use service::McpService;

/// MCP protocol revision spoken by both ends.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Declared type of a tool parameter, named after JSON Schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Any,
}

impl ParamType {
    pub fn schema_name(&self) -> Option<&'static str> {
        match self {
            ParamType::String => Some("string"),
            ParamType::Number => Some("number"),
            ParamType::Integer => Some("integer"),
            ParamType::Boolean => Some("boolean"),
            ParamType::Array => Some("array"),
            ParamType::Object => Some("object"),
            ParamType::Any => None,
        }
    }

    pub fn from_schema_name(name: &str) -> Self {
        match name {
            "string" => ParamType::String,
            "number" => ParamType::Number,
            "integer" => ParamType::Integer,
            "boolean" => ParamType::Boolean,
            "array" => ParamType::Array,
            "object" => ParamType::Object,
            _ => ParamType::Any,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_name().unwrap_or("any"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            default: None,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, ty: ParamType, default: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            default: if default.is_null() { None } else { Some(default) },
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Name, description and parameter schema of one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: vec![],
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = vec![];
        for p in &self.params {
            let mut prop = Map::new();
            if let Some(t) = p.ty.schema_name() {
                prop.insert("type".into(), json!(t));
            }
            if let Some(d) = &p.default {
                prop.insert("default".into(), d.clone());
            }
            if let Some(d) = &p.description {
                prop.insert("description".into(), json!(d));
            }
            properties.insert(p.name.clone(), Value::Object(prop));
            if p.required {
                required.push(json!(p.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn to_wire(&self) -> McpTool {
        McpTool {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.input_schema(),
        }
    }

    /// Rebuilds a descriptor from a `tools/list` entry. Property order follows
    /// the server's JSON object order.
    pub fn from_wire(tool: &McpTool) -> Self {
        let required: Vec<&str> = tool
            .input_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        let params = tool
            .input_schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| ParamSpec {
                        name: name.clone(),
                        ty: prop
                            .get("type")
                            .and_then(|t| t.as_str())
                            .map(ParamType::from_schema_name)
                            .unwrap_or(ParamType::Any),
                        required: required.contains(&name.as_str()),
                        default: prop.get("default").cloned(),
                        description: prop
                            .get("description")
                            .and_then(|d| d.as_str())
                            .map(String::from),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: tool.name.clone(),
            description: tool.description.clone().unwrap_or_default(),
            params,
        }
    }
}

/// An MCP tool as it appears in a `tools/list` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
}

/// One tool invocation as requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success { payload: Value },
    Failure { message: String },
}

impl ToolResult {
    pub fn success(payload: impl Into<Value>) -> Self {
        ToolResult::Success {
            payload: payload.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ToolResult::Failure {
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ToolResult::Failure { .. })
    }

    /// Text form of the outcome: string payloads verbatim, other payloads as
    /// JSON, failures as their message.
    pub fn text(&self) -> String {
        match self {
            ToolResult::Success {
                payload: Value::String(s),
            } => s.clone(),
            ToolResult::Success { payload } if payload.is_object() || payload.is_array() => {
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
            }
            ToolResult::Success { payload } => payload.to_string(),
            ToolResult::Failure { message } => message.clone(),
        }
    }

    /// Non-string payloads also travel as `structuredContent`, so the text
    /// part never has to be re-parsed.
    pub fn to_wire(&self) -> CallToolResult {
        let structured_content = match self {
            ToolResult::Success { payload } if !payload.is_string() => Some(payload.clone()),
            _ => None,
        };
        CallToolResult {
            content: vec![ToolResultContent::text(self.text())],
            is_error: Some(self.is_failure()),
            structured_content,
        }
    }

    /// Converts a `tools/call` result back into a tagged outcome. The payload
    /// is `structuredContent` when present, otherwise the text verbatim.
    pub fn from_wire(result: CallToolResult) -> Self {
        let text = result
            .content
            .into_iter()
            .filter(|c| c.r#type == "text")
            .map(|c| c.text.unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n");
        if result.is_error.unwrap_or(false) {
            return ToolResult::Failure { message: text };
        }
        let payload = result.structured_content.unwrap_or(Value::String(text));
        ToolResult::Success { payload }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<ToolResultContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultContent {
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
}

impl ToolResultContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            r#type: "text".into(),
            text: Some(text.into()),
            mime_type: None,
            data: None,
            resource: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divide() -> ToolDescriptor {
        ToolDescriptor::new("divide", "Divide two numbers")
            .param(ParamSpec::required("a", ParamType::Number))
            .param(ParamSpec::required("b", ParamType::Number))
    }

    #[test]
    fn schema_survives_the_wire() {
        let d = ToolDescriptor::new("view_file", "View a file")
            .param(ParamSpec::required("path", ParamType::String))
            .param(ParamSpec::optional("lines", ParamType::Integer, json!(20)));
        let wire = serde_json::to_value(d.to_wire()).unwrap();
        assert_eq!(wire["inputSchema"]["required"], json!(["path"]));
        assert_eq!(wire["inputSchema"]["properties"]["lines"]["default"], json!(20));

        let back = ToolDescriptor::from_wire(&serde_json::from_value(wire).unwrap());
        assert_eq!(back.name, "view_file");
        let lines = back.params.iter().find(|p| p.name == "lines").unwrap();
        assert_eq!(lines.ty, ParamType::Integer);
        assert!(!lines.required);
        assert_eq!(lines.default, Some(json!(20)));
    }

    #[test]
    fn float_payload_keeps_its_decimal_point() {
        assert_eq!(ToolResult::success(42.0).text(), "42.0");
        let wire = ToolResult::success(42.0).to_wire();
        assert_eq!(wire.content[0].text.as_deref(), Some("42.0"));
        assert_eq!(ToolResult::from_wire(wire), ToolResult::success(42.0));
    }

    #[test]
    fn failures_come_back_as_failures() {
        let wire = ToolResult::failure("Cannot divide by zero").to_wire();
        assert_eq!(wire.is_error, Some(true));
        assert_eq!(
            ToolResult::from_wire(wire),
            ToolResult::failure("Cannot divide by zero")
        );
    }

    #[test]
    fn plain_text_payloads_stay_strings() {
        let wire = ToolResult::success("HELP GUIDE").to_wire();
        assert_eq!(ToolResult::from_wire(wire), ToolResult::success("HELP GUIDE"));
        assert_eq!(divide().input_schema()["required"], json!(["a", "b"]));
    }

    #[test]
    fn json_looking_text_is_not_reinterpreted() {
        for text in ["42", "true", "{\"a\": 1}"] {
            let wire = ToolResult::success(text).to_wire();
            assert!(wire.structured_content.is_none());
            assert_eq!(ToolResult::from_wire(wire), ToolResult::success(text));
        }

        let obj = json!({ "open_ports": [{ "port": 22 }] });
        let wire = serde_json::to_value(ToolResult::success(obj.clone()).to_wire()).unwrap();
        assert_eq!(wire["structuredContent"], obj);
        let back: CallToolResult = serde_json::from_value(wire).unwrap();
        assert_eq!(ToolResult::from_wire(back), ToolResult::success(obj));
    }

    #[test]
    fn text_only_results_from_other_servers_stay_text() {
        let wire: CallToolResult = serde_json::from_value(json!({
            "content": [{ "type": "text", "text": "[1, 2]" }],
            "isError": false
        }))
        .unwrap();
        assert_eq!(ToolResult::from_wire(wire), ToolResult::success("[1, 2]"));
    }
}
