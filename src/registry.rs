//! In-process tool registry.
//!
//! Domain modules contribute their tools once at startup through an explicit
//! `register` call; after that the registry is read-only and is shared behind
//! an `Arc` by whoever serves it.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use anyhow::{Result, anyhow};
use futures::FutureExt as _;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::mcp::{ParamSpec, ParamType, ToolDescriptor, ToolHost, ToolResult};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    Duplicate(String),
}

/// Arguments after coercion to the tool's declared parameter types.
#[derive(Debug, Clone, Default)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn number(&self, name: &str) -> Result<f64> {
        self.0
            .get(name)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| anyhow!("argument '{name}' must be a number"))
    }

    pub fn integer(&self, name: &str) -> Result<i64> {
        self.0
            .get(name)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| anyhow!("argument '{name}' must be an integer"))
    }

    pub fn string(&self, name: &str) -> Result<&str> {
        self.0
            .get(name)
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("argument '{name}' must be a string"))
    }

    pub fn boolean(&self, name: &str) -> Result<bool> {
        self.0
            .get(name)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| anyhow!("argument '{name}' must be a boolean"))
    }

    pub fn opt_string(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_str())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Arguments) -> Result<Value>;
}

#[async_trait::async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn call(&self, args: Arguments) -> Result<Value> {
        (self)(args).await
    }
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Box<dyn ToolHandler>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, descriptor: ToolDescriptor, handler: H) -> Result<(), RegistryError>
    where
        H: ToolHandler + 'static,
    {
        if self.index.contains_key(&descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name));
        }
        debug!(tool = %descriptor.name, "registering tool");
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            handler: Box::new(handler),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All descriptors, in registration order.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor.clone()).collect()
    }

    pub async fn invoke(&self, name: &str, arguments: Map<String, Value>) -> ToolResult {
        let Some(tool) = self.index.get(name).map(|&i| &self.tools[i]) else {
            warn!(tool = %name, "tool not found");
            return ToolResult::failure(format!("Tool '{name}' not found"));
        };

        let args = match coerce_arguments(&tool.descriptor.params, arguments) {
            Ok(args) => args,
            Err(e) => return ToolResult::failure(format!("Invalid arguments for '{name}': {e}")),
        };

        debug!(tool = %name, ?args, "invoking tool");
        match AssertUnwindSafe(tool.handler.call(args)).catch_unwind().await {
            Ok(Ok(payload)) => ToolResult::Success { payload },
            Ok(Err(e)) => {
                debug!(tool = %name, error = %e, "tool failed");
                ToolResult::failure(format!("{e:#}"))
            }
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into());
                warn!(tool = %name, %msg, "tool panicked");
                ToolResult::failure(format!("Tool '{name}' crashed: {msg}"))
            }
        }
    }
}

#[async_trait::async_trait]
impl ToolHost for ToolRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(ToolRegistry::list_tools(self))
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ToolResult {
        self.invoke(name, arguments).await
    }
}

/// Applies defaults and converts each declared argument to its parameter type.
/// Undeclared arguments pass through untouched.
pub fn coerce_arguments(params: &[ParamSpec], mut raw: Map<String, Value>) -> Result<Arguments> {
    for p in params {
        match raw.remove(&p.name) {
            Some(Value::Null) | None => {
                if let Some(d) = &p.default {
                    raw.insert(p.name.clone(), d.clone());
                } else if p.required {
                    return Err(anyhow!("missing required argument '{}'", p.name));
                }
            }
            Some(v) => {
                let v = coerce_value(p.ty, v).map_err(|e| anyhow!("argument '{}': {e}", p.name))?;
                raw.insert(p.name.clone(), v);
            }
        }
    }
    Ok(Arguments(raw))
}

fn coerce_value(ty: ParamType, v: Value) -> Result<Value> {
    let coerced = match (ty, v) {
        (ParamType::Any, v) => v,
        (ParamType::Number, Value::Number(n)) => Value::Number(n),
        (ParamType::Number, Value::String(s)) => {
            let f: f64 = s.trim().parse().map_err(|_| anyhow!("'{s}' is not a number"))?;
            Value::from(f)
        }
        (ParamType::Integer, Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::from(i),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Value::from(f as i64)
            }
            _ => return Err(anyhow!("{n} is not an integer")),
        },
        (ParamType::Integer, Value::String(s)) => {
            let i: i64 = s.trim().parse().map_err(|_| anyhow!("'{s}' is not an integer"))?;
            Value::from(i)
        }
        (ParamType::String, Value::String(s)) => Value::String(s),
        (ParamType::String, Value::Number(n)) => Value::String(n.to_string()),
        (ParamType::String, Value::Bool(b)) => Value::String(b.to_string()),
        (ParamType::Boolean, Value::Bool(b)) => Value::Bool(b),
        (ParamType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Value::Bool(true),
            "false" | "no" | "0" => Value::Bool(false),
            _ => return Err(anyhow!("'{s}' is not a boolean")),
        },
        (ParamType::Array, v @ Value::Array(_)) => v,
        (ParamType::Object, v @ Value::Object(_)) => v,
        (ty, v) => return Err(anyhow!("expected {ty}, got {v}")),
    };
    Ok(coerced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn calculator() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        r.register(
            ToolDescriptor::new("add", "Add two numbers")
                .param(ParamSpec::required("a", ParamType::Number))
                .param(ParamSpec::required("b", ParamType::Number)),
            |args: Arguments| async move {
                anyhow::Ok(json!(args.number("a")? + args.number("b")?))
            },
        )
        .unwrap();
        r.register(
            ToolDescriptor::new("divide", "Divide two numbers")
                .param(ParamSpec::required("a", ParamType::Number))
                .param(ParamSpec::required("b", ParamType::Number)),
            |args: Arguments| async move {
                let b = args.number("b")?;
                if b == 0.0 {
                    anyhow::bail!("Cannot divide by zero");
                }
                anyhow::Ok(json!(args.number("a")? / b))
            },
        )
        .unwrap();
        r
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failure() {
        let r = calculator();
        let res = r.invoke("nonexistent-tool", Map::new()).await;
        assert_eq!(res, ToolResult::failure("Tool 'nonexistent-tool' not found"));
    }

    #[tokio::test]
    async fn listing_keeps_registration_order() {
        let names: Vec<_> = calculator().list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["add", "divide"]);
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let mut r = calculator();
        let err = r
            .register(ToolDescriptor::new("add", "again"), |_: Arguments| async {
                anyhow::Ok(Value::Null)
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(n) if n == "add"));
    }

    #[tokio::test]
    async fn string_numbers_are_coerced() {
        let res = calculator().invoke("add", args(json!({"a": "15", "b": 27}))).await;
        assert_eq!(res, ToolResult::success(42.0));
    }

    #[tokio::test]
    async fn handler_errors_become_failures() {
        let res = calculator().invoke("divide", args(json!({"a": 10, "b": 0}))).await;
        assert_eq!(res, ToolResult::failure("Cannot divide by zero"));
    }

    #[tokio::test]
    async fn missing_required_argument_is_a_failure() {
        let res = calculator().invoke("add", args(json!({"a": 1}))).await;
        match res {
            ToolResult::Failure { message } => assert!(message.contains("'b'"), "{message}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn panics_are_contained() {
        let mut r = ToolRegistry::new();
        r.register(ToolDescriptor::new("boom", "always panics"), |_: Arguments| async {
            if true {
                panic!("kaboom");
            }
            anyhow::Ok(Value::Null)
        })
        .unwrap();
        match r.invoke("boom", Map::new()).await {
            ToolResult::Failure { message } => assert!(message.contains("kaboom"), "{message}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn defaults_fill_in_and_integers_reject_fractions() {
        let params = vec![
            ParamSpec::required("pid", ParamType::Integer),
            ParamSpec::optional("lines", ParamType::Integer, json!(50)),
        ];
        let a = coerce_arguments(&params, args(json!({"pid": 12.0, "extra": "x"}))).unwrap();
        assert_eq!(a.integer("pid").unwrap(), 12);
        assert_eq!(a.integer("lines").unwrap(), 50);
        assert_eq!(a.opt_string("extra"), Some("x"));

        assert!(coerce_arguments(&params, args(json!({"pid": 1.5}))).is_err());
    }

    #[test]
    fn scalars_become_strings_for_string_params() {
        let params = vec![ParamSpec::required("service_name", ParamType::String)];
        let a = coerce_arguments(&params, args(json!({"service_name": 42}))).unwrap();
        assert_eq!(a.string("service_name").unwrap(), "42");
    }
}
