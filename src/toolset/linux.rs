use serde_json::json;

use super::{Example, Toolset};

pub struct Linux;

impl Toolset for Linux {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn intro(&self) -> &'static str {
        "You are an advanced Linux system administrator assistant with access to these system tools:"
    }

    fn examples(&self) -> Vec<Example> {
        vec![
            Example::new("CPU usage", "get_cpu_usage", json!({})),
            Example::new("Memory info", "get_memory_usage", json!({})),
            Example::new("Process list", "list_processes", json!({ "limit": 10 })),
            Example::new(
                "Service status",
                "get_service_status",
                json!({ "service_name": "nginx" }),
            ),
            Example::new("System logs", "get_system_logs", json!({ "lines": 20 })),
            Example::new("Help", "get_help", json!({})),
        ]
    }

    fn rules(&self) -> &'static str {
        "🐧 LINUX ADMINISTRATION:
- Monitor system performance and resource usage
- Manage processes and services
- Analyze system logs and troubleshoot issues
- Check system security and user access

🎯 Always prioritize system security and provide clear technical information."
    }

    fn query_label(&self) -> &'static str {
        "🐧 User query"
    }

    fn repl_prompt(&self) -> &'static str {
        "🖥️ Linux Query: "
    }

    fn banner(&self) -> &'static str {
        "🐧 Linux System Administration MCP Client Started!"
    }

    fn tips(&self) -> Vec<&'static str> {
        vec![
            "Ask about system performance, processes, services, or logs",
            "Try 'What is using the most CPU?' or 'Check memory usage'",
            "Type 'help' for complete command guide",
            "Type 'quit' to exit",
        ]
    }

    fn help_tool(&self) -> Option<&'static str> {
        Some("get_help")
    }

    fn help_fallback(&self) -> &'static str {
        "I can help you manage Linux systems! Try asking about CPU usage, memory, processes, services, or system logs."
    }

    fn max_listed_tools(&self) -> Option<usize> {
        Some(20)
    }

    fn show_parameters(&self) -> bool {
        false
    }

    fn result_heading(&self) -> &'static str {
        "🐧 Linux System Information:"
    }

    fn tool_noun(&self) -> &'static str {
        "a Linux tool"
    }

    fn narration_labels(&self) -> (&'static str, &'static str, &'static str) {
        (
            "🐧 LINUX SYSTEM ANALYSIS REQUEST",
            "Linux Tool Used",
            "📊 SYSTEM DATA RECEIVED:",
        )
    }

    fn narration_instructions(&self) -> &'static str {
        "Analyze the Linux system data and provide a comprehensive, well-formatted response that:
1. Directly answers the user's system administration question
2. Highlights important system information, alerts, or issues
3. Uses clear, technical language appropriate for system administrators
4. Formats data in an easy-to-read structure
5. Includes relevant recommendations, troubleshooting steps, or next actions
6. Shows resource usage, process IDs, and system statuses clearly

Please provide your Linux system analysis now:"
    }
}
