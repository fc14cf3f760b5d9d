use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// A request, or a notification when `id` is null.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value, // allow string or number
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_null()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcSuccess {
    pub jsonrpc: String,
    pub id: Value,
    pub result: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcErrorObj {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcError {
    pub jsonrpc: String,
    pub id: Value,
    pub error: RpcErrorObj,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum RpcMessage {
    Req(RpcRequest),
    Ok(RpcSuccess),
    Err(RpcError),
}

impl RpcMessage {
    pub fn id(&self) -> &Value {
        match self {
            RpcMessage::Req(r) => &r.id,
            RpcMessage::Ok(r) => &r.id,
            RpcMessage::Err(r) => &r.id,
        }
    }
}

pub fn req(method: &str, id: Value, params: Option<Value>) -> RpcRequest {
    RpcRequest {
        jsonrpc: "2.0".into(),
        id,
        method: method.into(),
        params,
    }
}

pub fn notification(method: &str, params: Option<Value>) -> RpcRequest {
    req(method, Value::Null, params)
}

pub fn ok(id: Value, result: Value) -> RpcMessage {
    RpcMessage::Ok(RpcSuccess {
        jsonrpc: "2.0".into(),
        id,
        result,
    })
}

pub fn err(id: Value, code: i64, message: impl Into<String>) -> RpcMessage {
    RpcMessage::Err(RpcError {
        jsonrpc: "2.0".into(),
        id,
        error: RpcErrorObj {
            code,
            message: message.into(),
            data: None,
        },
    })
}
