//! Scientific calculator. Angles are in degrees.

use anyhow::{Result, bail};
use serde_json::{Value, json};

use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
use crate::registry::{Arguments, RegistryError, ToolRegistry};

/// Largest n whose factorial fits in an f64.
const MAX_FLOAT_FACTORIAL: i64 = 170;

const HELP: &str = "🧮 SCIENTIFIC CALCULATOR HELP GUIDE

➕ Basic Arithmetic:
• add, subtract, multiply, divide

📈 Powers & Roots:
• power (a^b), sqrt (square root), cbrt (cube root)

🔢 Other Functions:
• factorial (non-negative integers), log (natural logarithm), remainder (a mod b)

📐 Trigonometry (angles in degrees):
• sin, cos, tan

🎯 EXAMPLE QUERIES:
• \"What is 15 + 27?\"
• \"Calculate the square root of 144\"
• \"What is 2 to the power of 10?\"
• \"What is 7 factorial?\"
• \"Divide 156 by 12\"

🎯 TIP: You can ask in natural language! I'll understand and perform the calculations for you.";

fn unary(name: &str, description: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, description).param(ParamSpec::required("a", ParamType::Number))
}

fn binary(name: &str, description: &str) -> ToolDescriptor {
    unary(name, description).param(ParamSpec::required("b", ParamType::Number))
}

fn finite(x: f64) -> Result<Value> {
    if !x.is_finite() {
        bail!("Result too large");
    }
    Ok(json!(x))
}

pub fn divide(a: f64, b: f64) -> Result<f64> {
    if b == 0.0 {
        bail!("Cannot divide by zero");
    }
    Ok(a / b)
}

pub fn sqrt(a: f64) -> Result<f64> {
    if a < 0.0 {
        bail!("Cannot calculate square root of negative number");
    }
    Ok(a.sqrt())
}

pub fn log(a: f64) -> Result<f64> {
    if a <= 0.0 {
        bail!("Cannot calculate logarithm of non-positive number");
    }
    Ok(a.ln())
}

/// Floored modulo: the result takes the sign of the divisor.
pub fn remainder(a: f64, b: f64) -> Result<f64> {
    if b == 0.0 {
        bail!("Cannot calculate remainder with zero divisor");
    }
    let r = a % b;
    Ok(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r })
}

pub fn tan(degrees: f64) -> Result<f64> {
    let angle = degrees.to_radians();
    if angle.cos().abs() < 1e-12 {
        bail!("Tangent undefined at this angle");
    }
    Ok(angle.tan())
}

/// Exact up to 20!, approximate up to 170!.
pub fn factorial(n: i64) -> Result<Value> {
    if n < 0 {
        bail!("Factorial requires a non-negative integer");
    }
    if let Some(exact) = (1..=n as u64).try_fold(1u64, |acc, k| acc.checked_mul(k)) {
        return Ok(json!(exact));
    }
    if n > MAX_FLOAT_FACTORIAL {
        bail!("Result too large");
    }
    Ok(json!((1..=n).fold(1f64, |acc, k| acc * k as f64)))
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(binary("add", "Add two numbers"), |args: Arguments| async move {
        finite(args.number("a")? + args.number("b")?)
    })?;
    registry.register(binary("subtract", "Subtract b from a"), |args: Arguments| async move {
        finite(args.number("a")? - args.number("b")?)
    })?;
    registry.register(binary("multiply", "Multiply two numbers"), |args: Arguments| async move {
        finite(args.number("a")? * args.number("b")?)
    })?;
    registry.register(binary("divide", "Divide a by b"), |args: Arguments| async move {
        finite(divide(args.number("a")?, args.number("b")?)?)
    })?;
    registry.register(binary("power", "Raise a to the power of b"), |args: Arguments| async move {
        finite(args.number("a")?.powf(args.number("b")?))
    })?;
    registry.register(unary("sqrt", "Square root of a number"), |args: Arguments| async move {
        finite(sqrt(args.number("a")?)?)
    })?;
    registry.register(unary("cbrt", "Cube root of a number"), |args: Arguments| async move {
        finite(args.number("a")?.cbrt())
    })?;
    registry.register(
        ToolDescriptor::new("factorial", "Factorial of a non-negative integer")
            .param(ParamSpec::required("a", ParamType::Integer)),
        |args: Arguments| async move { factorial(args.integer("a")?) },
    )?;
    registry.register(unary("log", "Natural logarithm of a number"), |args: Arguments| async move {
        finite(log(args.number("a")?)?)
    })?;
    registry.register(
        binary("remainder", "Remainder of a divided by b"),
        |args: Arguments| async move { finite(remainder(args.number("a")?, args.number("b")?)?) },
    )?;
    registry.register(unary("sin", "Sine of an angle in degrees"), |args: Arguments| async move {
        finite(args.number("a")?.to_radians().sin())
    })?;
    registry.register(unary("cos", "Cosine of an angle in degrees"), |args: Arguments| async move {
        finite(args.number("a")?.to_radians().cos())
    })?;
    registry.register(unary("tan", "Tangent of an angle in degrees"), |args: Arguments| async move {
        finite(tan(args.number("a")?)?)
    })?;
    registry.register(
        ToolDescriptor::new("get_help", "Get help about the available calculator operations"),
        |_args: Arguments| async move { anyhow::Ok(json!(HELP)) },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::ToolResult;
    use serde_json::Map;

    fn registry() -> ToolRegistry {
        let mut r = ToolRegistry::new();
        register(&mut r).unwrap();
        r
    }

    fn args(pairs: Value) -> Map<String, Value> {
        pairs.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn add_returns_a_float() {
        let result = registry().invoke("add", args(json!({ "a": 15, "b": 27 }))).await;
        assert_eq!(result, ToolResult::success(json!(42.0)));
        assert_eq!(result.text(), "42.0");
    }

    #[tokio::test]
    async fn string_numbers_are_coerced() {
        let result = registry().invoke("multiply", args(json!({ "a": "6", "b": 7 }))).await;
        assert_eq!(result, ToolResult::success(json!(42.0)));
    }

    #[tokio::test]
    async fn divide_by_zero_fails() {
        let result = registry().invoke("divide", args(json!({ "a": 10, "b": 0 }))).await;
        match result {
            ToolResult::Failure { message } => assert!(message.contains("Cannot divide by zero")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn factorial_is_exact_then_approximate_then_too_large() {
        assert_eq!(factorial(0).unwrap(), json!(1));
        assert_eq!(factorial(20).unwrap(), json!(2_432_902_008_176_640_000u64));
        assert!(factorial(21).unwrap().as_f64().unwrap() > 5.1e19);
        assert!(factorial(170).unwrap().as_f64().unwrap().is_finite());
        assert_eq!(factorial(171).unwrap_err().to_string(), "Result too large");
        assert!(factorial(-1).is_err());
    }

    #[tokio::test]
    async fn factorial_rejects_fractions() {
        let result = registry().invoke("factorial", args(json!({ "a": 5.5 }))).await;
        assert!(result.is_failure());
        let result = registry().invoke("factorial", args(json!({ "a": 5.0 }))).await;
        assert_eq!(result, ToolResult::success(json!(120)));
    }

    #[test]
    fn remainder_follows_the_divisor_sign() {
        assert_eq!(remainder(7.0, 3.0).unwrap(), 1.0);
        assert_eq!(remainder(-7.0, 3.0).unwrap(), 2.0);
        assert_eq!(remainder(7.0, -3.0).unwrap(), -2.0);
        assert!(remainder(1.0, 0.0).is_err());
    }

    #[test]
    fn domain_errors() {
        assert!(sqrt(-4.0).is_err());
        assert!(log(0.0).is_err());
        assert!(tan(90.0).is_err());
        assert!((tan(45.0).unwrap() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn overflow_is_too_large() {
        let result = registry().invoke("power", args(json!({ "a": 10, "b": 400 }))).await;
        assert_eq!(result, ToolResult::failure("Result too large"));
    }

    #[tokio::test]
    async fn sine_uses_degrees() {
        let ToolResult::Success { payload } = registry().invoke("sin", args(json!({ "a": 30 }))).await else {
            panic!("sin failed");
        };
        assert!((payload.as_f64().unwrap() - 0.5).abs() < 1e-9);
    }
}
