use serde_json::json;

use super::{Example, Toolset};
use crate::llm::GenerationConfig;

pub struct Calculator;

impl Toolset for Calculator {
    fn name(&self) -> &'static str {
        "calculator"
    }

    fn intro(&self) -> &'static str {
        "You are an advanced mathematical assistant with access to these calculator tools:"
    }

    fn examples(&self) -> Vec<Example> {
        vec![
            Example::new("Addition", "add", json!({ "a": 15, "b": 27 })),
            Example::new("Division", "divide", json!({ "a": 100, "b": 4 })),
            Example::new("Square root", "sqrt", json!({ "a": 144 })),
            Example::new("Factorial", "factorial", json!({ "a": 5 })),
            Example::new("Trigonometry", "sin", json!({ "a": 30 })),
            Example::new("Power", "power", json!({ "a": 2, "b": 3 })),
        ]
    }

    fn rules(&self) -> &'static str {
        "🔢 IMPORTANT RULES:
- Always use numerical values, not strings, for mathematical parameters
- For trigonometric functions, angles are in degrees
- Factorial requires non-negative integers only
- Division by zero is not allowed

🎯 Always prioritize mathematical accuracy and provide clear explanations."
    }

    fn query_label(&self) -> &'static str {
        "🧮 User query"
    }

    fn repl_prompt(&self) -> &'static str {
        "🧮 Math Query: "
    }

    fn banner(&self) -> &'static str {
        "🧮 MCP Scientific Calculator Started!"
    }

    fn tips(&self) -> Vec<&'static str> {
        vec![
            "Type 'help' to see available mathematical operations",
            "Ask math questions in natural language, like 'What is 15 + 27?'",
            "Type 'quit' to exit",
        ]
    }

    fn help_tool(&self) -> Option<&'static str> {
        Some("get_help")
    }

    fn help_fallback(&self) -> &'static str {
        "I can do arithmetic, powers and roots, factorials, logarithms and trigonometry. Try 'What is 15 + 27?'"
    }

    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::precise()
    }

    fn result_heading(&self) -> &'static str {
        "🧮 Mathematical Result:"
    }

    fn tool_noun(&self) -> &'static str {
        "a calculator tool"
    }

    fn narration_labels(&self) -> (&'static str, &'static str, &'static str) {
        (
            "🧮 MATHEMATICAL CALCULATION ANALYSIS",
            "Calculator Tool Used",
            "📊 CALCULATION RESULT:",
        )
    }

    fn narration_instructions(&self) -> &'static str {
        "Provide a clear, educational response that:
1. States the mathematical operation performed
2. Shows the calculation result clearly
3. Explains the mathematical concept if helpful
4. Provides context or verification if appropriate
5. Uses proper mathematical notation and formatting

Please provide your mathematical analysis now:"
    }
}
